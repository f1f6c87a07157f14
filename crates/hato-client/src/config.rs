//! Client configuration

use std::collections::BTreeMap;

use hato_core::term::Iri;
use hato_template::QueryFormatter;

use crate::{ClientError, ClientResult};

pub const ENDPOINT_VAR: &str = "MU_SPARQL_ENDPOINT";
pub const UPDATE_ENDPOINT_VAR: &str = "MU_SPARQL_UPDATE_ENDPOINT";
pub const CRUD_ENDPOINT_VAR: &str = "MU_SPARQL_CRUD_ENDPOINT";
pub const GRAPH_VAR: &str = "MU_APPLICATION_GRAPH";

/// SPARQL client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    /// Defaults to `endpoint`
    pub update_endpoint: Option<String>,
    pub crud_endpoint: Option<String>,
    pub graph: Option<Iri>,
    /// Declared after the registered prefixes in every query header
    pub prefixes: BTreeMap<String, Iri>,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ClientConfig {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            update_endpoint: None,
            crud_endpoint: None,
            graph: None,
            prefixes: BTreeMap::new(),
            timeout_seconds: 30,
            user_agent: format!("hato/{}", env!("CARGO_PKG_VERSION")),
            username: None,
            password: None,
        }
    }

    /// Configuration from the `MU_*` environment variables
    ///
    /// `MU_SPARQL_ENDPOINT` is required; the update and CRUD endpoints and
    /// the application graph are optional.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let endpoint = var(ENDPOINT_VAR)
            .ok_or_else(|| ClientError::Config(format!("{} is not set", ENDPOINT_VAR)))?;
        let mut config = Self::new(&endpoint);
        config.update_endpoint = var(UPDATE_ENDPOINT_VAR);
        config.crud_endpoint = var(CRUD_ENDPOINT_VAR);
        config.graph = var(GRAPH_VAR).map(Iri::new);
        Ok(config)
    }

    pub fn with_update_endpoint(mut self, endpoint: &str) -> Self {
        self.update_endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_crud_endpoint(mut self, endpoint: &str) -> Self {
        self.crud_endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_graph(mut self, graph: Iri) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_prefix(mut self, label: &str, iri: Iri) -> Self {
        self.prefixes.insert(label.to_string(), iri);
        self
    }

    pub fn with_prefixes<I>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = (String, Iri)>,
    {
        self.prefixes.extend(prefixes);
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    pub fn update_endpoint(&self) -> &str {
        self.update_endpoint.as_deref().unwrap_or(&self.endpoint)
    }

    /// Formatter carrying this configuration's graph and prefixes
    pub fn formatter(&self) -> QueryFormatter {
        let formatter = QueryFormatter::new().with_prefixes(self.prefixes.clone());
        match &self.graph {
            Some(graph) => formatter.with_graph(graph.clone()),
            None => formatter,
        }
    }
}
