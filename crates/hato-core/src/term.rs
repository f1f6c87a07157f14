//! RDF terms as they are written inside a SPARQL query
//!
//! Every type here renders (through `Display`) to text that can be pasted into
//! a query as-is.

use crate::escape::escape_string;
use iri_string::types::IriStr;
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt::{self, Write};
use std::hash::{Hash, Hasher};
use std::ops::Add;
use thiserror::Error;

/// Term construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    #[error("Invalid IRI {value:?}: {reason}")]
    InvalidIri { value: String, reason: String },
}

/// Characters that must be percent-encoded inside `<...>`
fn needs_encoding(c: char) -> bool {
    matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '[' | '\\' | ']') || c <= '\u{20}'
}

fn encode_reference(value: &str) -> String {
    let mut reference = String::with_capacity(value.len() + 2);
    reference.push('<');
    for c in value.chars() {
        if needs_encoding(c) {
            // All encoded characters are ASCII, so one byte each
            let _ = write!(reference, "%{:02X}", c as u32);
        } else {
            reference.push(c);
        }
    }
    reference.push('>');
    reference
}

/// An IRI reference, rendered as `<...>`
///
/// The raw value is kept untouched; the rendered reference has the characters
/// SPARQL forbids in `IRIREF` percent-encoded.
///
/// ```
/// use hato_core::term::Iri;
///
/// assert_eq!(Iri::new("http://example.org/a b").to_string(), "<http://example.org/a%20b>");
/// assert_eq!(Iri::new("http://example.org/") + "boo", Iri::new("http://example.org/boo"));
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Iri {
    value: String,
    reference: String,
}

impl Iri {
    /// Wrap a raw IRI, encoding it for use in a query
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let reference = encode_reference(&value);
        Self { value, reference }
    }

    /// Wrap a raw IRI and check that its encoded form is an absolute IRI
    pub fn parse_absolute(value: impl Into<String>) -> Result<Self, TermError> {
        let iri = Self::new(value);
        IriStr::new(iri.encoded()).map_err(|e| TermError::InvalidIri {
            value: iri.value.clone(),
            reason: e.to_string(),
        })?;
        Ok(iri)
    }

    /// The raw (unencoded) value
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The encoded value without the surrounding angle brackets
    pub fn encoded(&self) -> &str {
        &self.reference[1..self.reference.len() - 1]
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

impl fmt::Debug for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iri({})", self.value)
    }
}

impl PartialEq for Iri {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Iri {}

impl Hash for Iri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl PartialEq<str> for Iri {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for Iri {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl PartialEq<String> for Iri {
    fn eq(&self, other: &String) -> bool {
        &self.value == other
    }
}

impl Borrow<str> for Iri {
    fn borrow(&self) -> &str {
        &self.value
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<T: AsRef<str>> Add<T> for Iri {
    type Output = Iri;

    fn add(self, rhs: T) -> Iri {
        let mut value = self.value;
        value.push_str(rhs.as_ref());
        Iri::new(value)
    }
}

impl<T: AsRef<str>> Add<T> for &Iri {
    type Output = Iri;

    fn add(self, rhs: T) -> Iri {
        Iri::new(format!("{}{}", self.value, rhs.as_ref()))
    }
}

impl From<String> for Iri {
    fn from(value: String) -> Self {
        Iri::new(value)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Iri::new(value)
    }
}

impl From<Iri> for String {
    fn from(iri: Iri) -> Self {
        iri.value
    }
}

/// A string literal with an optional language tag
///
/// Renders as `"value"@lang`, or `"value"` when there is no tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    value: String,
    lang: Option<String>,
}

impl Literal {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: None,
        }
    }

    pub fn with_lang(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: Some(lang.into()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape_string(&self.value))?;
        if let Some(lang) = &self.lang {
            write!(f, "@{}", lang)?;
        }
        Ok(())
    }
}

/// Compares the lexical value only, ignoring the language tag
impl PartialEq<str> for Literal {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for Literal {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

/// A compact IRI `label:local` bound to the namespace IRI it abbreviates
///
/// Two prefixed names are equal when label and local part match. Against a
/// plain string or an [`Iri`] the expanded IRI is compared instead.
#[derive(Clone)]
pub struct PrefixedName {
    base: Cow<'static, str>,
    label: Cow<'static, str>,
    local: Cow<'static, str>,
}

impl PrefixedName {
    pub fn new(base: &Iri, label: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            base: Cow::Owned(base.as_str().to_string()),
            label: Cow::Owned(label.into()),
            local: Cow::Owned(local.into()),
        }
    }

    /// Build a prefixed name usable in `const` items
    pub const fn from_static(base: &'static str, label: &'static str, local: &'static str) -> Self {
        Self {
            base: Cow::Borrowed(base),
            label: Cow::Borrowed(label),
            local: Cow::Borrowed(local),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn base(&self) -> Iri {
        Iri::new(self.base.as_ref())
    }

    /// The full IRI this name stands for
    pub fn iri(&self) -> Iri {
        Iri::new(format!("{}{}", self.base, self.local))
    }

    fn expands_to(&self, iri: &str) -> bool {
        iri.strip_prefix(self.base.as_ref()) == Some(self.local.as_ref())
    }
}

impl fmt::Display for PrefixedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.label, self.local)
    }
}

impl fmt::Debug for PrefixedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrefixedName({}:{})", self.label, self.local)
    }
}

impl PartialEq for PrefixedName {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.local == other.local
    }
}

impl Eq for PrefixedName {}

impl Hash for PrefixedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
        self.local.hash(state);
    }
}

impl PartialEq<str> for PrefixedName {
    fn eq(&self, other: &str) -> bool {
        self.expands_to(other)
    }
}

impl PartialEq<&str> for PrefixedName {
    fn eq(&self, other: &&str) -> bool {
        self.expands_to(other)
    }
}

impl PartialEq<Iri> for PrefixedName {
    fn eq(&self, other: &Iri) -> bool {
        self.expands_to(other.as_str())
    }
}

impl PartialEq<PrefixedName> for Iri {
    fn eq(&self, other: &PrefixedName) -> bool {
        other == self
    }
}

/// `UNDEF`, the unbound marker of a `VALUES` block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Undef;

impl fmt::Display for Undef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UNDEF")
    }
}

/// Any RDF term usable in a query
///
/// `Raw` carries SPARQL text that is written verbatim: variables (`?s`),
/// keywords (`a`) or names that are already in query syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
    PrefixedName(PrefixedName),
    Undef(Undef),
    Raw(String),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => iri.fmt(f),
            Term::Literal(literal) => literal.fmt(f),
            Term::PrefixedName(name) => name.fmt(f),
            Term::Undef(undef) => undef.fmt(f),
            Term::Raw(text) => f.write_str(text),
        }
    }
}

impl PartialEq<str> for Term {
    fn eq(&self, other: &str) -> bool {
        match self {
            Term::Iri(iri) => iri == other,
            Term::Literal(literal) => literal == other,
            Term::PrefixedName(name) => name == other,
            Term::Undef(_) => false,
            Term::Raw(text) => text == other,
        }
    }
}

impl PartialEq<&str> for Term {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

impl From<PrefixedName> for Term {
    fn from(name: PrefixedName) -> Self {
        Term::PrefixedName(name)
    }
}

impl From<Undef> for Term {
    fn from(undef: Undef) -> Self {
        Term::Undef(undef)
    }
}

impl From<&str> for Term {
    fn from(text: &str) -> Self {
        Term::Raw(text.to_string())
    }
}

impl From<String> for Term {
    fn from(text: String) -> Self {
        Term::Raw(text)
    }
}
