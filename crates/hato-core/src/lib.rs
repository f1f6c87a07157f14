//! # Hato Core
//!
//! RDF terms, SPARQL literal escaping and triple blocks for building queries.
//! Everything here is pure formatting; nothing talks to an endpoint.

pub mod escape;
pub mod namespace;
pub mod syntax;
pub mod term;

pub use escape::{
    escape, escape_boolean, escape_date, escape_datetime, escape_double, escape_naive_datetime,
    escape_string, escape_time, EscapeError, Value,
};
pub use namespace::{all_prefixes, lookup, prefix_declaration, register, rdf, rdfs, xsd, Namespace};
pub use syntax::{indent_lines, ConstructionError, Node, Statement, Triples};
pub use term::{Iri, Literal, PrefixedName, Term, TermError, Undef};
