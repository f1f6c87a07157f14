//! SPARQL endpoint client
//!
//! Sends templated queries and updates over the SPARQL 1.1 protocol and
//! manages graphs through the Graph Store HTTP protocol:
//! - `query` / `select` / `update` against the query and update endpoints
//! - `get` / `put` / `post` / `delete` against the CRUD endpoint

pub mod client;
pub mod config;
pub mod results;

pub use client::{pretty_print_query, SparqlClient};
pub use config::ClientConfig;
pub use results::{Binding, BoundTerm, Head, ResultSet, SparqlResults};

use hato_template::TemplateError;

/// Client operation result type
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error types
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("{status}, message={reason:?}, explanation={explanation:?}")]
    RequestFailed {
        status: u16,
        reason: String,
        explanation: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client is closed")]
    Closed,
}

impl ClientError {
    /// HTTP status of a failed request, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RequestFailed { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
