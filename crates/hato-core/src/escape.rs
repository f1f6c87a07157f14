//! SPARQL literal syntax for native values
//!
//! Section 4.1.2 of SPARQL 1.1 defines the shortened literal forms used here:
//! integers and decimals are written bare, booleans as `true`/`false`, and
//! everything else as a quoted lexical form with an `xsd` datatype.
//! <https://www.w3.org/TR/2013/REC-sparql11-query-20130321/#QSynLiterals>

use crate::syntax::{Node, Triples};
use crate::term::{Iri, Literal, PrefixedName, Term, Undef};
use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// A value that can be escaped or substituted into a query
///
/// Variants are listed in dispatch order: a boolean is never treated as a
/// number and a date-time never as a plain date.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    DateTime(DateTime<FixedOffset>),
    NaiveDateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Double(f64),
    Integer(i64),
    Decimal(BigDecimal),
    Term(Term),
    Node(Node),
    Triples(Triples),
    String(String),
}

/// Escape a value to its SPARQL literal form
///
/// A [`Node`] escapes to its subject so it can be the object of another
/// statement. A [`Triples`] block has no single-term form.
pub fn escape(value: &Value) -> Result<String, EscapeError> {
    match value {
        Value::Bool(b) => Ok(escape_boolean(*b)),
        Value::DateTime(dt) => Ok(escape_datetime(dt)),
        Value::NaiveDateTime(dt) => Ok(escape_naive_datetime(dt)),
        Value::Date(d) => Ok(escape_date(d)),
        Value::Time(t) => Ok(escape_time(t)),
        Value::Double(v) => Ok(escape_double(*v)),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Decimal(d) => Ok(d.to_string()),
        Value::Term(term) => Ok(term.to_string()),
        Value::Node(node) => Ok(node.subject().to_string()),
        Value::Triples(_) => Err(EscapeError::InvalidArgument(
            "a block of triples is not a single term".to_string(),
        )),
        Value::String(s) => Ok(escape_string(s)),
    }
}

// The backslash goes first so the following replacements are not doubled
const STRING_REPLACEMENTS: [(&str, &str); 4] = [
    ("\\", "\\\\"),
    ("\"", "\\\""),
    ("\n", "\\n"),
    ("\r", "\\r"),
];

pub fn escape_string(value: &str) -> String {
    let escaped = STRING_REPLACEMENTS
        .iter()
        .fold(value.to_string(), |acc, (old, new)| acc.replace(old, new));
    format!("\"{}\"", escaped)
}

pub fn escape_boolean(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

pub fn escape_datetime(value: &DateTime<FixedOffset>) -> String {
    format!(
        "\"{}\"^^xsd:dateTime",
        value.to_rfc3339_opts(SecondsFormat::AutoSi, false)
    )
}

pub fn escape_naive_datetime(value: &NaiveDateTime) -> String {
    format!("\"{}\"^^xsd:dateTime", value.format("%Y-%m-%dT%H:%M:%S%.f"))
}

pub fn escape_date(value: &NaiveDate) -> String {
    format!("\"{}\"^^xsd:date", value.format("%Y-%m-%d"))
}

pub fn escape_time(value: &NaiveTime) -> String {
    format!("\"{}\"^^xsd:time", value.format("%H:%M:%S%.f"))
}

/// Doubles are always typed so the endpoint never reads them as decimals
pub fn escape_double(value: f64) -> String {
    let lexical = if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        format!("{:?}", value)
    };
    format!("\"{}\"^^xsd:double", lexical)
}

/// How a value appears in a template field without conversion
///
/// Strings are SPARQL text and go in verbatim; blocks render whole; every
/// other value is written in its escaped form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Node(node) => node.fmt(f),
            Value::Triples(triples) => triples.fmt(f),
            other => match escape(other) {
                Ok(text) => f.write_str(&text),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Value::DateTime(value.fixed_offset())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::NaiveDateTime(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Value::Time(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Double(f64::from(value))
    }
}

macro_rules! integer_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Integer(i64::from(value))
                }
            }
        )*
    };
}

integer_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Decimal(BigDecimal::from(value)),
        }
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<Term> for Value {
    fn from(value: Term) -> Self {
        Value::Term(value)
    }
}

impl From<Iri> for Value {
    fn from(value: Iri) -> Self {
        Value::Term(Term::Iri(value))
    }
}

impl From<Literal> for Value {
    fn from(value: Literal) -> Self {
        Value::Term(Term::Literal(value))
    }
}

impl From<PrefixedName> for Value {
    fn from(value: PrefixedName) -> Self {
        Value::Term(Term::PrefixedName(value))
    }
}

impl From<Undef> for Value {
    fn from(value: Undef) -> Self {
        Value::Term(Term::Undef(value))
    }
}

impl From<Node> for Value {
    fn from(value: Node) -> Self {
        Value::Node(value)
    }
}

impl From<Triples> for Value {
    fn from(value: Triples) -> Self {
        Value::Triples(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}
