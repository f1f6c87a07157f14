//! Substitution of values into a tokenized template

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write;

use hato_core::escape::{escape, Value};
use hato_core::namespace::{all_prefixes, prefix_declaration};
use hato_core::term::Iri;
use itertools::Itertools;
use tracing::trace;

use crate::field::{parse_field, Conversion, FieldName};
use crate::lexer::{tokenize, Token};
use crate::TemplateError;

/// Positional and keyword arguments for a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.push(value);
        self
    }

    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.positional.push(value.into());
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.named.insert(name.into(), value.into());
    }

    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numbering {
    Automatic(usize),
    Manual,
}

/// Format a template without any prefix header
pub fn format(template: &str, args: &Arguments) -> Result<String, TemplateError> {
    let tokens = tokenize(template)?;
    let mut out = String::with_capacity(template.len());
    let mut numbering = None;

    for (index, token) in tokens.iter().enumerate() {
        let content = match token {
            Token::Text(text) => {
                out.push_str(text);
                continue;
            }
            Token::Field { content, .. } => *content,
        };

        let field = parse_field(content)?;
        let value = resolve(args, field.name, &mut numbering, content)?;
        let converted = convert(value, field.conversion)?;
        let text = field.spec.apply(&converted);
        out.push_str(&indent_continuation(&text, active_indent(&tokens, index)));
    }

    Ok(out)
}

fn resolve<'v>(
    args: &'v Arguments,
    name: FieldName<'_>,
    numbering: &mut Option<Numbering>,
    content: &str,
) -> Result<&'v Value, TemplateError> {
    let mixed = || TemplateError::FieldParse {
        field: content.to_string(),
        reason: "cannot switch between automatic and manual field numbering".to_string(),
    };

    match name {
        FieldName::Auto => {
            let index = match *numbering {
                None => 0,
                Some(Numbering::Automatic(next)) => next,
                Some(Numbering::Manual) => return Err(mixed()),
            };
            *numbering = Some(Numbering::Automatic(index + 1));
            args.positional(index)
                .ok_or_else(|| TemplateError::MissingArgument(index.to_string()))
        }
        FieldName::Index(index) => {
            if let Some(Numbering::Automatic(_)) = numbering {
                return Err(mixed());
            }
            *numbering = Some(Numbering::Manual);
            args.positional(index)
                .ok_or_else(|| TemplateError::MissingArgument(index.to_string()))
        }
        FieldName::Keyword(name) => args
            .get(name)
            .ok_or_else(|| TemplateError::MissingArgument(name.to_string())),
    }
}

fn convert(value: &Value, conversion: Conversion) -> Result<String, TemplateError> {
    match conversion {
        Conversion::Display => {
            let mut text = String::new();
            write!(text, "{}", value).map_err(|_| TemplateError::Render)?;
            Ok(text)
        }
        Conversion::Escape => Ok(escape(value)?),
        Conversion::Ascii => Ok(ascii_escape(&escape(value)?)),
    }
}

/// Write every non-ASCII character as a SPARQL `\u`/`\U` escape
pub fn ascii_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c as u32 {
            0..=0x7F => out.push(c),
            code @ 0x80..=0xFFFF => out.push_str(&format!("\\u{:04X}", code)),
            code => out.push_str(&format!("\\U{:08X}", code)),
        }
    }
    out
}

/// Whitespace that precedes the field on its own line
///
/// Without a line break in the preceding text, only the template's very
/// first token counts as the start of a line.
fn active_indent<'a>(tokens: &[Token<'a>], index: usize) -> &'a str {
    let text = match index.checked_sub(1).map(|i| tokens[i]) {
        Some(Token::Text(text)) => text,
        _ => return "",
    };
    let line = match text.rfind('\n') {
        Some(pos) => &text[pos + 1..],
        None if index == 1 => text,
        None => return "",
    };
    if line.chars().all(|c| c == ' ' || c == '\t') {
        line
    } else {
        ""
    }
}

/// Indent every line after the first that is not whitespace-only
fn indent_continuation<'t>(text: &'t str, indent: &str) -> Cow<'t, str> {
    if indent.is_empty() || !text.contains('\n') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + indent.len() * 4);
    for (n, line) in text.split_inclusive('\n').enumerate() {
        if n > 0 && !line.trim().is_empty() {
            out.push_str(indent);
        }
        out.push_str(line);
    }
    Cow::Owned(out)
}

/// Remove the whitespace common to the start of every non-blank line
///
/// Whitespace-only lines are emptied and do not take part in the margin.
pub fn dedent(text: &str) -> String {
    let is_blank = |line: &str| line.trim_matches([' ', '\t', '\r', '\n']).is_empty();
    let margin = text
        .split_inclusive('\n')
        .filter(|&line| !is_blank(line))
        .map(|line| &line[..line.len() - line.trim_start_matches([' ', '\t']).len()])
        .reduce(|common, indent| {
            let shared = common
                .char_indices()
                .zip(indent.chars())
                .find(|((_, a), b)| a != b)
                .map(|((i, _), _)| i)
                .unwrap_or_else(|| common.len().min(indent.len()));
            &common[..shared]
        })
        .unwrap_or("");

    text.split_inclusive('\n')
        .map(|line| {
            if is_blank(line) {
                if line.ends_with('\n') { "\n" } else { "" }
            } else {
                line.strip_prefix(margin).unwrap_or(line)
            }
        })
        .collect()
}

/// Builds complete queries: prefix header plus formatted body
#[derive(Debug, Clone, Default)]
pub struct QueryFormatter {
    graph: Option<Iri>,
    prefixes: BTreeMap<String, Iri>,
}

impl QueryFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph substituted for `{{graph}}` unless the caller passes one
    pub fn with_graph(mut self, graph: Iri) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_prefix(mut self, label: impl Into<String>, iri: Iri) -> Self {
        self.prefixes.insert(label.into(), iri);
        self
    }

    pub fn with_prefixes<I, L>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = (L, Iri)>,
        L: Into<String>,
    {
        self.prefixes
            .extend(prefixes.into_iter().map(|(label, iri)| (label.into(), iri)));
        self
    }

    pub fn graph(&self) -> Option<&Iri> {
        self.graph.as_ref()
    }

    pub fn prefixes(&self) -> &BTreeMap<String, Iri> {
        &self.prefixes
    }

    /// Registered prefixes, a blank line, then this formatter's own prefixes
    pub fn header(&self) -> String {
        let global = all_prefixes().iter().map(|ns| ns.prefix_line()).join("\n");
        let custom = self
            .prefixes
            .iter()
            .map(|(label, iri)| prefix_declaration(label, iri))
            .join("\n");
        [global, custom]
            .into_iter()
            .filter(|block| !block.is_empty())
            .join("\n\n")
    }

    /// The full query text: header, blank line, dedented and formatted body
    pub fn prepare(&self, template: &str, args: &Arguments) -> Result<String, TemplateError> {
        let mut args = Cow::Borrowed(args);
        if let Some(graph) = &self.graph {
            if !args.contains("graph") {
                args.to_mut().insert("graph", graph.clone());
            }
        }

        let body = dedent(template);
        let body = format(body.trim(), &args)?;
        let header = self.header();
        trace!(len = body.len(), "Prepared query body");

        if header.is_empty() {
            Ok(body)
        } else {
            Ok(format!("{}\n\n{}", header, body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hato_core::syntax::Triples;
    use proptest::prelude::*;

    #[test]
    fn test_auto_indent() {
        let args = Arguments::new().arg("b\nc");
        assert_eq!(format("a\n  {{}}\nd", &args).unwrap(), "a\n  b\n  c\nd");
    }

    #[test]
    fn test_indent_first_line_of_template() {
        let args = Arguments::new().arg("b\nc");
        assert_eq!(format("  {{}}", &args).unwrap(), "  b\n  c");
    }

    #[test]
    fn test_no_indent_after_text_on_same_line() {
        let args = Arguments::new().arg("b\nc");
        assert_eq!(format("a\nx {{}}", &args).unwrap(), "a\nx b\nc");
        assert_eq!(format("{{}}  {{}}", &Arguments::new().arg("x").arg("b\nc")).unwrap(), "x  b\nc");
    }

    #[test]
    fn test_blank_lines_not_indented() {
        let args = Arguments::new().arg("b\n\nc");
        assert_eq!(format("\n    {{}}", &args).unwrap(), "\n    b\n\n    c");
    }

    #[test]
    fn test_triples_block_indent() {
        let mut triples = Triples::new();
        triples.push_triple("john", "p", "o").unwrap().push_triple("john", "q", 1i64).unwrap();
        let args = Arguments::new().arg(triples);
        assert_eq!(
            format("WHERE {\n    {{}}\n}", &args).unwrap(),
            "WHERE {\n    john p \"o\" ;\n        q 1 .\n}"
        );
    }

    #[test]
    fn test_positional_and_keywords() {
        let args = Arguments::new().arg("?s").arg(5i64).named("graph", Iri::new("http://g"));
        assert_eq!(
            format("{{0}} {{1}} {{0}} FROM {{graph}}", &args).unwrap(),
            "?s 5 ?s FROM <http://g>"
        );
        assert_eq!(format("{{}} {{}}", &args).unwrap(), "?s 5");
    }

    #[test]
    fn test_mixed_numbering_fails() {
        let args = Arguments::new().arg(1i64).arg(2i64);
        assert!(matches!(format("{{}} {{1}}", &args), Err(TemplateError::FieldParse { .. })));
        assert!(matches!(format("{{1}} {{}}", &args), Err(TemplateError::FieldParse { .. })));
    }

    #[test]
    fn test_missing_argument() {
        assert_eq!(
            format("{{}}", &Arguments::new()),
            Err(TemplateError::MissingArgument("0".to_string()))
        );
        assert_eq!(
            format("{{name}}", &Arguments::new()),
            Err(TemplateError::MissingArgument("name".to_string()))
        );
    }

    #[test]
    fn test_conversions() {
        let args = Arguments::new().arg("chat \"noir\"").arg("été 𝄞");
        assert_eq!(format("{{0}}", &args).unwrap(), "chat \"noir\"");
        assert_eq!(format("{{0!r}}", &args).unwrap(), r#""chat \"noir\"""#);
        assert_eq!(format("{{1!a}}", &args).unwrap(), r#""\u00E9t\u00E9 \U0001D11E""#);
        assert_eq!(format("{{0!s:.4}}|{{0!s:>6.2}}", &args).unwrap(), "chat|    ch");
    }

    #[test]
    fn test_escape_error_surfaces() {
        let args = Arguments::new().arg(Triples::new());
        assert!(matches!(format("{{!r}}", &args), Err(TemplateError::Escape(_))));
    }

    #[test]
    fn test_dedent() {
        assert_eq!(dedent("\n    a\n      b\n    c\n"), "\na\n  b\nc\n");
        assert_eq!(dedent("  a\n \n  b"), "a\n\nb");
        assert_eq!(dedent("\ta\n  b"), "\ta\n  b");
        assert_eq!(dedent("no margin"), "no margin");
    }

    #[test]
    fn test_ascii_escape() {
        assert_eq!(ascii_escape("abc"), "abc");
        assert_eq!(ascii_escape("é"), "\\u00E9");
        assert_eq!(ascii_escape("😀"), "\\U0001F600");
    }

    proptest! {
        #[test]
        fn test_text_without_fields_is_unchanged(s in "[^{]*") {
            prop_assert_eq!(format(&s, &Arguments::new()).unwrap(), s);
        }

        #[test]
        fn test_every_continuation_line_gets_indent(
            indent in "[ \t]{1,8}",
            lines in proptest::collection::vec("[a-z]{1,10}", 1..6),
        ) {
            let template = format!("x\n{}{{{{}}}}", indent);
            let args = Arguments::new().arg(lines.join("\n"));
            let out = format(&template, &args).unwrap();
            let expected: Vec<String> = lines.iter().map(|l| format!("{}{}", indent, l)).collect();
            prop_assert_eq!(out, format!("x\n{}", expected.join("\n")));
        }
    }
}
