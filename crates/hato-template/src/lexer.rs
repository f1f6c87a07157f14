//! Splits a template into literal text and `{{...}}` fields
//!
//! Single braces are SPARQL group syntax and stay in the text. A field runs
//! from `{{` to the first `}}`.

use winnow::combinator::{alt, cut_err, preceded, terminated};
use winnow::stream::Location;
use winnow::token::{rest, take_until};
use winnow::{LocatingSlice, ModalResult, Parser};

use crate::TemplateError;

pub type Input<'a> = LocatingSlice<&'a str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    /// Field body without the braces; `position` is the byte offset of `{{`
    Field { content: &'a str, position: usize },
}

pub fn tokenize(template: &str) -> Result<Vec<Token<'_>>, TemplateError> {
    let mut input = LocatingSlice::new(template);
    let mut tokens = Vec::new();

    while !input.is_empty() {
        let position = input.current_token_start();
        let token = next_token(&mut input)
            .map_err(|_| TemplateError::UnterminatedField { position })?;
        tokens.push(token);
    }

    Ok(tokens)
}

fn next_token<'a>(input: &mut Input<'a>) -> ModalResult<Token<'a>> {
    alt((field, text)).parse_next(input)
}

fn field<'a>(input: &mut Input<'a>) -> ModalResult<Token<'a>> {
    let position = input.current_token_start();
    // Once `{{` is seen the field must close; never fall back to text
    let content = preceded("{{", cut_err(terminated(take_until(0.., "}}"), "}}"))).parse_next(input)?;
    Ok(Token::Field { content, position })
}

fn text<'a>(input: &mut Input<'a>) -> ModalResult<Token<'a>> {
    alt((take_until(1.., "{{"), rest))
        .map(Token::Text)
        .parse_next(input)
}
