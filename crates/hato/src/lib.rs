//! # Hato - SPARQL 1.1 client for Rust
//!
//! Hato writes SPARQL queries from templates. Arguments are substituted into
//! `{{...}}` fields, escaped into SPARQL syntax on request, and the result is
//! prefixed with the `PREFIX` declarations of every registered namespace
//! before it is sent to the endpoint.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hato::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SparqlClient::new(
//!         ClientConfig::new("http://localhost:8890/sparql")
//!             .with_graph(Iri::new("http://mu.semte.ch/application")),
//!     )?;
//!
//!     let mut triples = Triples::new();
//!     triples.push_triple(Iri::new("http://example.org/john"), rdf::type_, "person")?;
//!
//!     client
//!         .update("INSERT DATA { GRAPH {{graph}} { {{}} } }", &Arguments::new().arg(triples))
//!         .await?;
//!
//!     let results = client
//!         .select("SELECT ?s FROM {{graph}} WHERE { ?s ?p {{!r}} }", &Arguments::new().arg("person"))
//!         .await?;
//!     println!("{} solutions", results.len());
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`hato-core`**: RDF terms, escaping, `Node`/`Triples` and namespaces
//! - **`hato-template`**: The `{{...}}` template formatter
//! - **`hato-client`**: SPARQL protocol and Graph Store HTTP protocol client
//! - **`hato-cli`**: The `hato` command-line tool
//!
//! ## Feature Flags
//!
//! - `full` (default): Everything below
//! - `template`: Query templates
//! - `client`: HTTP client

pub use hato_core as core;

#[cfg(feature = "hato-template")]
pub use hato_template as template;

#[cfg(feature = "hato-client")]
pub use hato_client as client;

// Convenience re-exports for common types
pub use hato_core::namespace;
pub use hato_core::{ConstructionError, EscapeError, Iri, Literal, Node, PrefixedName, Term, Triples, Undef, Value};

#[cfg(feature = "hato-template")]
pub use hato_template::{Arguments, QueryFormatter, TemplateError};

#[cfg(feature = "hato-client")]
pub use hato_client::{ClientConfig, ClientError, SparqlClient, SparqlResults};

// Commonly used external dependencies
pub use serde_json;
pub use tokio;

/// Prelude module for convenient imports
///
/// ```rust
/// use hato::prelude::*;
/// ```
pub mod prelude {
    pub use crate::namespace::{rdf, rdfs, xsd, Namespace};
    pub use crate::{Iri, Literal, Node, PrefixedName, Term, Triples, Undef, Value};

    #[cfg(feature = "hato-template")]
    pub use crate::{Arguments, QueryFormatter};

    #[cfg(feature = "hato-client")]
    pub use crate::{ClientConfig, ClientError, SparqlClient, SparqlResults};

    pub use serde_json::Value as JsonValue;
}

/// Current version of Hato
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
