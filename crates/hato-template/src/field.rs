//! Grammar of a replacement field: `name[!conversion][:spec]`

use std::borrow::Cow;

use winnow::ascii::digit1;
use winnow::combinator::{alt, empty, opt, preceded};
use winnow::token::{any, one_of, take_while};
use winnow::{ModalResult, Parser};

use crate::TemplateError;

/// Which argument a field refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName<'a> {
    /// `{{}}`: the next positional argument
    Auto,
    Index(usize),
    Keyword(&'a str),
}

/// How a value is turned into text before the spec is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Conversion {
    /// `!s`
    #[default]
    Display,
    /// `!r`: the escaped SPARQL form
    Escape,
    /// `!a`: the escaped form with non-ASCII written as `\uXXXX`
    Ascii,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

/// `[[fill]align][width][.precision]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub fill: char,
    pub align: Option<Align>,
    pub width: Option<usize>,
    pub precision: Option<usize>,
}

impl Default for FormatSpec {
    fn default() -> Self {
        FormatSpec {
            fill: ' ',
            align: None,
            width: None,
            precision: None,
        }
    }
}

impl FormatSpec {
    /// Truncate to the precision, then pad to the width
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let text: Cow<'t, str> = match self.precision {
            Some(precision) if text.chars().count() > precision => {
                Cow::Owned(text.chars().take(precision).collect())
            }
            _ => Cow::Borrowed(text),
        };

        let len = text.chars().count();
        let width = match self.width {
            Some(width) if width > len => width,
            _ => return text,
        };

        let padding = width - len;
        let (left, right) = match self.align.unwrap_or(Align::Left) {
            Align::Left => (0, padding),
            Align::Right => (padding, 0),
            Align::Center => (padding / 2, padding - padding / 2),
        };
        let fill = self.fill.to_string();
        Cow::Owned(format!("{}{}{}", fill.repeat(left), text, fill.repeat(right)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub name: FieldName<'a>,
    pub conversion: Conversion,
    pub spec: FormatSpec,
}

pub fn parse_field(content: &str) -> Result<Field<'_>, TemplateError> {
    (field_name, opt(conversion), opt(preceded(':', format_spec)))
        .map(|(name, conversion, spec)| Field {
            name,
            conversion: conversion.unwrap_or_default(),
            spec: spec.unwrap_or_default(),
        })
        .parse(content)
        .map_err(|e| TemplateError::FieldParse {
            field: content.to_string(),
            reason: format!("unexpected input at offset {}", e.offset()),
        })
}

fn field_name<'a>(input: &mut &'a str) -> ModalResult<FieldName<'a>> {
    alt((
        digit1.try_map(str::parse::<usize>).map(FieldName::Index),
        identifier.map(FieldName::Keyword),
        empty.value(FieldName::Auto),
    ))
    .parse_next(input)
}

fn identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn conversion(input: &mut &str) -> ModalResult<Conversion> {
    preceded(
        '!',
        alt((
            's'.value(Conversion::Display),
            'r'.value(Conversion::Escape),
            'a'.value(Conversion::Ascii),
        )),
    )
    .parse_next(input)
}

fn align(input: &mut &str) -> ModalResult<Align> {
    alt((
        '<'.value(Align::Left),
        '>'.value(Align::Right),
        '^'.value(Align::Center),
    ))
    .parse_next(input)
}

fn format_spec(input: &mut &str) -> ModalResult<FormatSpec> {
    let fill_align = opt(alt(((any, align), align.map(|a| (' ', a))))).parse_next(input)?;
    let width = opt(digit1.try_map(str::parse::<usize>)).parse_next(input)?;
    let precision = opt(preceded('.', digit1.try_map(str::parse::<usize>))).parse_next(input)?;

    let (fill, align) = match fill_align {
        Some((fill, align)) => (fill, Some(align)),
        None => (' ', None),
    };
    Ok(FormatSpec {
        fill,
        align,
        width,
        precision,
    })
}
