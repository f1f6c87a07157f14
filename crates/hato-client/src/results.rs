//! SPARQL 1.1 query results JSON format
//! <https://www.w3.org/TR/sparql11-results-json/>

use std::collections::BTreeMap;

use hato_core::escape::escape_string;
use hato_core::term::{Iri, Literal, Term};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparqlResults {
    pub head: Head,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultSet>,
    /// Set by ASK queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub bindings: Vec<Binding>,
}

/// One solution: variable name to bound term
pub type Binding = BTreeMap<String, BoundTerm>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BoundTerm {
    Uri {
        value: String,
    },
    Literal {
        value: String,
        #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
    },
    /// Older endpoints send datatyped literals with their own type
    TypedLiteral {
        value: String,
        datatype: String,
    },
    Bnode {
        value: String,
    },
}

impl BoundTerm {
    pub fn value(&self) -> &str {
        match self {
            BoundTerm::Uri { value }
            | BoundTerm::Literal { value, .. }
            | BoundTerm::TypedLiteral { value, .. }
            | BoundTerm::Bnode { value } => value,
        }
    }

    /// The term as it would be written back into a query
    pub fn to_term(&self) -> Term {
        match self {
            BoundTerm::Uri { value } => Term::Iri(Iri::new(value.as_str())),
            BoundTerm::Literal {
                value,
                lang: Some(lang),
                ..
            } => Term::Literal(Literal::with_lang(value.as_str(), lang.as_str())),
            BoundTerm::Literal {
                value,
                datatype: Some(datatype),
                ..
            }
            | BoundTerm::TypedLiteral { value, datatype } => Term::Raw(format!(
                "{}^^{}",
                escape_string(value),
                Iri::new(datatype.as_str())
            )),
            BoundTerm::Literal { value, .. } => Term::Literal(Literal::new(value.as_str())),
            BoundTerm::Bnode { value } => Term::Raw(format!("_:{}", value)),
        }
    }
}

impl SparqlResults {
    pub fn vars(&self) -> &[String] {
        &self.head.vars
    }

    /// Solutions of a SELECT query; empty for ASK
    pub fn bindings(&self) -> &[Binding] {
        self.results
            .as_ref()
            .map(|r| r.bindings.as_slice())
            .unwrap_or(&[])
    }

    /// Every value bound to `var`, skipping solutions where it is unbound
    pub fn column<'a>(&'a self, var: &'a str) -> impl Iterator<Item = &'a BoundTerm> + 'a {
        self.bindings().iter().filter_map(move |b| b.get(var))
    }

    pub fn len(&self) -> usize {
        self.bindings().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings().is_empty()
    }
}
