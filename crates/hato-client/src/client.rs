//! SPARQL protocol and Graph Store HTTP protocol client

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use hato_core::term::Iri;
use hato_template::{Arguments, QueryFormatter};
use itertools::Itertools;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Body, Client, RequestBuilder, Response, Url};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::results::SparqlResults;
use crate::{ClientError, ClientResult};

const SPARQL_RESULTS_JSON: &str = "application/json";

/// Client for one SPARQL endpoint
///
/// All requests share one connection pool. After [`close`](Self::close)
/// every request fails with [`ClientError::Closed`].
pub struct SparqlClient {
    config: ClientConfig,
    formatter: QueryFormatter,
    http: RwLock<Option<Client>>,
}

impl SparqlClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()?;

        info!(
            endpoint = %config.endpoint,
            update_endpoint = %config.update_endpoint(),
            graph = ?config.graph.as_ref().map(Iri::as_str),
            "SPARQL client created"
        );

        Ok(Self {
            formatter: config.formatter(),
            config,
            http: RwLock::new(Some(http)),
        })
    }

    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Release the connection pool; closing twice is a no-op
    pub fn close(&self) {
        let mut http = self.http.write().unwrap_or_else(PoisonError::into_inner);
        if http.take().is_some() {
            info!(endpoint = %self.config.endpoint, "SPARQL client closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn http(&self) -> ClientResult<Client> {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ClientError::Closed)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(username) => request.basic_auth(username, self.config.password.as_ref()),
            None => request,
        }
    }

    /// The exact text that would be sent for this template
    pub fn prepare(&self, template: &str, args: &Arguments) -> ClientResult<String> {
        Ok(self.formatter.prepare(template, args)?)
    }

    /// Run a query and return the decoded JSON response
    pub async fn query(&self, template: &str, args: &Arguments) -> ClientResult<JsonValue> {
        let query = self.prepare(template, args)?;
        let http = self.http()?;
        debug!(
            "Sending SPARQL query to {}:\n{}\n{}",
            self.config.endpoint,
            pretty_print_query(&query),
            "=".repeat(40)
        );

        let request = http
            .post(&self.config.endpoint)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", query.as_str())]);
        let response = check_status(self.authorize(request).send().await?).await?;

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Run a SELECT or ASK query and decode the SPARQL JSON results
    pub async fn select(&self, template: &str, args: &Arguments) -> ClientResult<SparqlResults> {
        let value = self.query(template, args).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Run an update against the update endpoint
    ///
    /// Endpoints that answer with something other than JSON produce
    /// `{"body": <text>}`.
    pub async fn update(&self, template: &str, args: &Arguments) -> ClientResult<JsonValue> {
        let update = self.prepare(template, args)?;
        let http = self.http()?;
        let endpoint = self.config.update_endpoint();
        debug!(
            "Sending SPARQL update to {}:\n{}\n{}",
            endpoint,
            pretty_print_query(&update),
            "=".repeat(40)
        );

        let request = http
            .post(endpoint)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("update", update.as_str())]);
        let response = check_status(self.authorize(request).send().await?).await?;

        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| json!({ "body": body })))
    }

    /// Fetch a graph serialized as `format`
    pub async fn get(&self, graph: Option<&Iri>, format: &str) -> ClientResult<Response> {
        let url = self.crud_url(graph)?;
        let request = self.http()?.get(url).header(ACCEPT, format);
        check_status(self.authorize(request).send().await?).await
    }

    /// Replace a graph with `data`
    pub async fn put(
        &self,
        data: impl Into<Body>,
        format: &str,
        graph: Option<&Iri>,
    ) -> ClientResult<Response> {
        let url = self.crud_url(graph)?;
        let request = self
            .http()?
            .put(url)
            .header(CONTENT_TYPE, format)
            .body(data);
        check_status(self.authorize(request).send().await?).await
    }

    /// Merge `data` into a graph
    pub async fn post(
        &self,
        data: impl Into<Body>,
        format: &str,
        graph: Option<&Iri>,
    ) -> ClientResult<Response> {
        let url = self.crud_url(graph)?;
        let request = self
            .http()?
            .post(url)
            .header(CONTENT_TYPE, format)
            .body(data);
        check_status(self.authorize(request).send().await?).await
    }

    pub async fn delete(&self, graph: Option<&Iri>) -> ClientResult<Response> {
        let url = self.crud_url(graph)?;
        let request = self.http()?.delete(url);
        check_status(self.authorize(request).send().await?).await
    }

    /// CRUD endpoint with `?graph=<iri>`, or `?default` without any graph
    fn crud_url(&self, graph: Option<&Iri>) -> ClientResult<Url> {
        let endpoint = self
            .config
            .crud_endpoint
            .as_deref()
            .ok_or_else(|| ClientError::Config("no CRUD endpoint configured".to_string()))?;
        let mut url = Url::parse(endpoint)
            .map_err(|e| ClientError::Config(format!("invalid CRUD endpoint {:?}: {}", endpoint, e)))?;

        match graph.or(self.config.graph.as_ref()) {
            Some(graph) => {
                url.query_pairs_mut().append_pair("graph", graph.as_str());
            }
            None => url.set_query(Some("default")),
        }
        Ok(url)
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return Ok(response);
    }

    let reason = status.canonical_reason().unwrap_or_default().to_string();
    let explanation = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            debug!(status = status.as_u16(), error = %e, "Could not read error response body");
            String::new()
        }
    };
    debug!("Server responded:\n{}\n{}", explanation, "=".repeat(40));
    Err(ClientError::RequestFailed {
        status: status.as_u16(),
        reason,
        explanation,
    })
}

/// Number every line of a query, right-aligned to the widest number
pub fn pretty_print_query(query: &str) -> String {
    let lines: Vec<&str> = query.trim_end().split('\n').collect();
    let width = lines.len().to_string().len();
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {}", i + 1, line, width = width))
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_print_query() {
        assert_eq!(pretty_print_query("SELECT *\nWHERE {}\n\n"), "1: SELECT *\n2: WHERE {}");
        let long = (1..=10).map(|i| format!("l{}", i)).join("\n");
        let printed = pretty_print_query(&long);
        assert!(printed.starts_with(" 1: l1\n 2: l2"));
        assert!(printed.ends_with("\n10: l10"));
    }

    #[test]
    fn test_crud_url() {
        let client = SparqlClient::new(
            ClientConfig::new("http://localhost/sparql").with_crud_endpoint("http://localhost/crud"),
        )
        .unwrap();
        assert_eq!(client.crud_url(None).unwrap().as_str(), "http://localhost/crud?default");
        assert_eq!(
            client.crud_url(Some(&Iri::new("http://g/1"))).unwrap().query(),
            Some("graph=http%3A%2F%2Fg%2F1")
        );
    }

    #[test]
    fn test_crud_url_uses_configured_graph() {
        let client = SparqlClient::new(
            ClientConfig::new("http://localhost/sparql")
                .with_crud_endpoint("http://localhost/crud")
                .with_graph(Iri::new("foo")),
        )
        .unwrap();
        assert_eq!(client.crud_url(None).unwrap().query(), Some("graph=foo"));
        assert_eq!(client.crud_url(Some(&Iri::new("bar"))).unwrap().query(), Some("graph=bar"));
    }

    #[test]
    fn test_crud_requires_endpoint() {
        let client = SparqlClient::new(ClientConfig::new("http://localhost/sparql")).unwrap();
        assert!(matches!(client.crud_url(None), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_close_is_idempotent() {
        let client = SparqlClient::new(ClientConfig::new("http://localhost/sparql")).unwrap();
        assert!(!client.is_closed());
        client.close();
        client.close();
        assert!(client.is_closed());
        assert!(matches!(client.http(), Err(ClientError::Closed)));
    }

    #[test]
    fn test_prepare_uses_configured_graph() {
        let client = SparqlClient::new(
            ClientConfig::new("http://localhost/sparql").with_graph(Iri::new("http://app")),
        )
        .unwrap();
        let query = client.prepare("SELECT * FROM {{graph}} { ?s ?p ?o }", &Arguments::new()).unwrap();
        assert!(query.ends_with("\n\nSELECT * FROM <http://app> { ?s ?p ?o }"));
    }
}
