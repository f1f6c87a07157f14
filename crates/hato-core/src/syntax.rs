//! Node and triple blocks rendered as SPARQL group graph patterns

use crate::escape::{escape, Value};
use crate::term::{Literal, Term};
use itertools::Itertools;
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("statements must be of length 3, received {0} elements")]
    WrongArity(usize),

    #[error("only statements and nodes are accepted, received: {0}")]
    DisallowedElement(String),

    #[error("subject not defined")]
    MissingSubject,

    #[error("predicate not defined")]
    MissingPredicate,
}

/// Prefix every line that is not whitespace-only
pub fn indent_lines(text: &str, prefix: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect()
}

fn check_object(value: &Value) -> Result<(), ConstructionError> {
    match value {
        Value::Triples(_) => Err(ConstructionError::DisallowedElement(
            "a block of triples cannot be an object".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Render `subject p o ;\n    p o .` for the given pairs, or nothing
fn render_statements<'a, I>(subject: &Term, pairs: I) -> Result<String, fmt::Error>
where
    I: IntoIterator<Item = (&'a Term, &'a Value)>,
{
    let mut out = String::new();
    for (index, (predicate, object)) in pairs.into_iter().enumerate() {
        let object = escape(object).map_err(|_| fmt::Error)?;
        if index == 0 {
            out.push_str(&format!("{} {} {}", subject, predicate, object));
        } else {
            out.push_str(&format!(" ;\n    {} {}", predicate, object));
        }
    }
    if !out.is_empty() {
        out.push_str(" .");
    }
    Ok(out)
}

/// A subject with its (predicate, object) pairs
///
/// Pairs keep insertion order; rendering sorts them by predicate and skips
/// `None` objects. Objects that are themselves nodes are written as their
/// subject, and their own statements follow the parent block.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    subject: Term,
    pairs: Vec<(Term, Option<Value>)>,
}

impl Node {
    pub fn new<S: Into<Term>>(subject: S) -> Self {
        Node {
            subject: subject.into(),
            pairs: Vec::new(),
        }
    }

    /// Build a node from pairs, failing on the first invalid object
    pub fn from_pairs<S, I, P>(subject: S, pairs: I) -> Result<Self, ConstructionError>
    where
        S: Into<Term>,
        I: IntoIterator<Item = (P, Option<Value>)>,
        P: Into<Term>,
    {
        let mut node = Node::new(subject);
        for (predicate, object) in pairs {
            node.push_opt(predicate, object)?;
        }
        Ok(node)
    }

    pub fn push<P, O>(&mut self, predicate: P, object: O) -> Result<&mut Self, ConstructionError>
    where
        P: Into<Term>,
        O: Into<Value>,
    {
        self.push_opt(predicate, Some(object))
    }

    /// Append a pair whose object may be absent
    pub fn push_opt<P, O>(
        &mut self,
        predicate: P,
        object: Option<O>,
    ) -> Result<&mut Self, ConstructionError>
    where
        P: Into<Term>,
        O: Into<Value>,
    {
        let object = object.map(Into::into);
        if let Some(value) = &object {
            check_object(value)?;
        }
        self.pairs.push((predicate.into(), object));
        Ok(self)
    }

    pub fn subject(&self) -> &Term {
        &self.subject
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Term, Option<&Value>)> {
        self.pairs.iter().map(|(p, o)| (p, o.as_ref()))
    }

    /// Build a node from a JSON object such as `{"@id": "john", "foo": "bar"}`
    ///
    /// Array values produce one pair per element. Nested objects with an
    /// `@id` become child nodes; `{"@value", "@language"}` becomes a literal.
    pub fn from_json(json: &JsonValue) -> Result<Self, ConstructionError> {
        let map = match json {
            JsonValue::Object(map) => map,
            other => return Err(ConstructionError::DisallowedElement(other.to_string())),
        };
        let subject = match map.get("@id") {
            None | Some(JsonValue::Null) => return Err(ConstructionError::MissingSubject),
            Some(JsonValue::String(id)) => Term::Raw(id.clone()),
            Some(other) => return Err(ConstructionError::DisallowedElement(other.to_string())),
        };

        let mut node = Node::new(subject);
        for (key, value) in map.iter().filter(|(key, _)| key.as_str() != "@id") {
            if key.is_empty() {
                return Err(ConstructionError::MissingPredicate);
            }
            match value {
                JsonValue::Array(items) => {
                    for item in items {
                        node.push_opt(Term::Raw(key.clone()), json_object(item)?)?;
                    }
                }
                item => {
                    node.push_opt(Term::Raw(key.clone()), json_object(item)?)?;
                }
            }
        }
        Ok(node)
    }

    fn present_pairs(&self) -> impl Iterator<Item = (&Term, &Value)> {
        self.pairs
            .iter()
            .filter_map(|(p, o)| o.as_ref().map(|o| (p, o)))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<_> = self.present_pairs().collect();
        pairs.sort_by_cached_key(|(predicate, _)| predicate.to_string());
        f.write_str(&render_statements(&self.subject, pairs.iter().copied())?)?;

        let children = pairs
            .iter()
            .filter_map(|(_, object)| match object {
                Value::Node(child) => Some(child),
                _ => None,
            })
            .sorted_by_cached_key(|child| child.subject.to_string());
        for child in children {
            let block = child.to_string();
            if !block.is_empty() {
                write!(f, "\n\n{}", block)?;
            }
        }
        Ok(())
    }
}

/// One entry of a [`Triples`] block
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Triple(Term, Term, Option<Value>),
    Node(Node),
}

impl Statement {
    pub fn triple<S, P, O>(subject: S, predicate: P, object: O) -> Self
    where
        S: Into<Term>,
        P: Into<Term>,
        O: Into<Value>,
    {
        Statement::Triple(subject.into(), predicate.into(), Some(object.into()))
    }

    fn validate(&self) -> Result<(), ConstructionError> {
        match self {
            Statement::Triple(_, _, Some(object)) => check_object(object),
            _ => Ok(()),
        }
    }
}

impl From<Node> for Statement {
    fn from(node: Node) -> Self {
        Statement::Node(node)
    }
}

#[derive(Debug, PartialEq)]
enum GroupKey<'a> {
    Subject(&'a Term),
    Node(usize),
}

fn group_key<'a>(item: &(usize, &'a Statement)) -> GroupKey<'a> {
    let (index, statement) = *item;
    match statement {
        Statement::Triple(subject, _, _) => GroupKey::Subject(subject),
        Statement::Node(_) => GroupKey::Node(index),
    }
}

/// An ordered block of triples and nodes
///
/// Consecutive triples sharing a subject are written as one group; each
/// node is its own group. Groups are separated by a blank line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triples {
    statements: Vec<Statement>,
}

impl Triples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_statements<I>(statements: I) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = Statement>,
    {
        let mut triples = Triples::new();
        triples.extend(statements)?;
        Ok(triples)
    }

    pub fn push(&mut self, statement: Statement) -> Result<&mut Self, ConstructionError> {
        statement.validate()?;
        self.statements.push(statement);
        Ok(self)
    }

    pub fn push_triple<S, P, O>(
        &mut self,
        subject: S,
        predicate: P,
        object: O,
    ) -> Result<&mut Self, ConstructionError>
    where
        S: Into<Term>,
        P: Into<Term>,
        O: Into<Value>,
    {
        self.push(Statement::triple(subject, predicate, object))
    }

    pub fn push_triple_opt<S, P, O>(
        &mut self,
        subject: S,
        predicate: P,
        object: Option<O>,
    ) -> Result<&mut Self, ConstructionError>
    where
        S: Into<Term>,
        P: Into<Term>,
        O: Into<Value>,
    {
        self.push(Statement::Triple(
            subject.into(),
            predicate.into(),
            object.map(Into::into),
        ))
    }

    pub fn push_node(&mut self, node: Node) -> &mut Self {
        self.statements.push(Statement::Node(node));
        self
    }

    /// Append every statement, or none of them if one is invalid
    pub fn extend<I>(&mut self, statements: I) -> Result<&mut Self, ConstructionError>
    where
        I: IntoIterator<Item = Statement>,
    {
        let statements: Vec<Statement> = statements.into_iter().collect();
        statements.iter().try_for_each(Statement::validate)?;
        self.statements.extend(statements);
        Ok(self)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn indent(&self, prefix: &str) -> String {
        indent_lines(&self.to_string(), prefix)
    }

    /// Build a block from a JSON array of `[s, p, o]` arrays and node objects
    pub fn from_json(json: &JsonValue) -> Result<Self, ConstructionError> {
        let items = match json {
            JsonValue::Array(items) => items,
            other => return Err(ConstructionError::DisallowedElement(other.to_string())),
        };

        let mut triples = Triples::new();
        for item in items {
            match item {
                JsonValue::Array(parts) => {
                    let [subject, predicate, object] = parts.as_slice() else {
                        return Err(ConstructionError::WrongArity(parts.len()));
                    };
                    let subject = match subject {
                        JsonValue::Null => return Err(ConstructionError::MissingSubject),
                        other => json_term(other)?,
                    };
                    let predicate = match predicate {
                        JsonValue::Null => return Err(ConstructionError::MissingPredicate),
                        other => json_term(other)?,
                    };
                    let object = json_object(object)?;
                    let child = match &object {
                        Some(Value::Node(node)) if !node.is_empty() => Some(node.clone()),
                        _ => None,
                    };
                    triples.push(Statement::Triple(subject, predicate, object))?;
                    if let Some(node) = child {
                        triples.push_node(node);
                    }
                }
                JsonValue::Object(_) => {
                    triples.push_node(Node::from_json(item)?);
                }
                other => return Err(ConstructionError::DisallowedElement(other.to_string())),
            }
        }
        Ok(triples)
    }

    fn render_group<'a, I>(items: I) -> Result<String, fmt::Error>
    where
        I: Iterator<Item = (usize, &'a Statement)>,
    {
        let mut subject = None;
        let mut pairs = Vec::new();
        for (_, statement) in items {
            match statement {
                Statement::Triple(s, p, o) => {
                    subject.get_or_insert(s);
                    if let Some(o) = o {
                        pairs.push((p, o));
                    }
                }
                Statement::Node(node) => return Ok(node.to_string()),
            }
        }
        match subject {
            Some(subject) => render_statements(subject, pairs),
            None => Ok(String::new()),
        }
    }
}

impl fmt::Display for Triples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = self.statements.iter().enumerate().chunk_by(group_key);
        let mut blocks = Vec::new();
        for (_, group) in &groups {
            let block = Self::render_group(group)?;
            if !block.is_empty() {
                blocks.push(block);
            }
        }
        f.write_str(&blocks.join("\n\n"))
    }
}

impl<'a> IntoIterator for &'a Triples {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn json_term(json: &JsonValue) -> Result<Term, ConstructionError> {
    match json {
        JsonValue::String(s) => Ok(Term::Raw(s.clone())),
        other => Err(ConstructionError::DisallowedElement(other.to_string())),
    }
}

fn json_object(json: &JsonValue) -> Result<Option<Value>, ConstructionError> {
    let value = match json {
        JsonValue::Null => return Ok(None),
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Object(map) if map.contains_key("@id") => Value::Node(Node::from_json(json)?),
        JsonValue::Object(map) => match (map.get("@value"), map.get("@language")) {
            (Some(JsonValue::String(value)), None) => Value::Term(Term::Literal(Literal::new(value.clone()))),
            (Some(JsonValue::String(value)), Some(JsonValue::String(lang))) => {
                Value::Term(Term::Literal(Literal::with_lang(value.clone(), lang.clone())))
            }
            _ => return Err(ConstructionError::DisallowedElement(json.to_string())),
        },
        JsonValue::Array(_) => return Err(ConstructionError::DisallowedElement(json.to_string())),
    };
    Ok(Some(value))
}
