//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hato_client::{ClientConfig, SparqlClient};
use hato_core::term::Iri;
use hato_template::Arguments;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "hato")]
#[command(about = "SPARQL 1.1 client with double-brace query templates")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// SPARQL endpoint; read from MU_SPARQL_ENDPOINT when omitted
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Update endpoint, defaults to the query endpoint
    #[arg(long, global = true)]
    pub update_endpoint: Option<String>,

    /// Graph Store HTTP Protocol endpoint
    #[arg(long, global = true)]
    pub crud_endpoint: Option<String>,

    /// Application graph substituted for {{graph}}
    #[arg(long, global = true)]
    pub graph: Option<String>,

    /// Extra prefix declaration, as label=iri
    #[arg(long = "prefix", value_parser = parse_key_value, global = true)]
    pub prefixes: Vec<(String, String)>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a query template against the query endpoint
    Query {
        /// Template file, or - for stdin
        file: PathBuf,

        /// Named template argument, as name=value; the value is inserted verbatim
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Run an update template against the update endpoint
    Update {
        /// Template file, or - for stdin
        file: PathBuf,

        /// Named template argument, as name=value; the value is inserted verbatim
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Print the text a template expands to without sending it
    Prepare {
        /// Template file, or - for stdin
        file: PathBuf,

        /// Named template argument, as name=value; the value is inserted verbatim
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },

    /// Download the graph
    Get {
        /// Media type requested from the store
        #[arg(short, long, default_value = "text/turtle")]
        format: String,
    },

    /// Replace the graph with the contents of a file
    Put {
        /// Media type of the file
        #[arg(short, long, default_value = "text/turtle")]
        format: String,

        /// Data file, or - for stdin
        file: PathBuf,
    },

    /// Add the contents of a file to the graph
    Post {
        /// Media type of the file
        #[arg(short, long, default_value = "text/turtle")]
        format: String,

        /// Data file, or - for stdin
        file: PathBuf,
    },

    /// Delete the graph
    Delete,
}

/// Output format options
#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    JsonPretty,
}

/// Command execution result
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl Cli {
    /// Client configuration from the flags, falling back to the environment
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.endpoint {
            Some(endpoint) => ClientConfig::new(endpoint),
            None => ClientConfig::from_env()
                .context("no --endpoint given and the environment has none")?,
        };

        if let Some(endpoint) = &self.update_endpoint {
            config = config.with_update_endpoint(endpoint);
        }
        if let Some(endpoint) = &self.crud_endpoint {
            config = config.with_crud_endpoint(endpoint);
        }
        if let Some(graph) = &self.graph {
            config = config.with_graph(Iri::new(graph.as_str()));
        }
        for (label, iri) in &self.prefixes {
            config = config.with_prefix(label, Iri::new(iri.as_str()));
        }
        Ok(config)
    }
}

/// Split `name=value`; the value may itself contain `=`
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got {:?}", s)),
    }
}

fn template_arguments(args: Vec<(String, String)>) -> Arguments {
    args.into_iter()
        .fold(Arguments::new(), |acc, (name, value)| acc.named(name, value))
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buffer = Vec::new();
        std::io::stdin().read_to_end(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))
    }
}

fn read_template(path: &Path) -> Result<String> {
    String::from_utf8(read_input(path)?).context("template is not valid UTF-8")
}

fn render(value: &serde_json::Value, format: &OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    })
}

/// Execute CLI commands
pub struct CommandExecutor {
    client: SparqlClient,
}

impl CommandExecutor {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            client: SparqlClient::new(config)?,
        })
    }

    pub fn client(&self) -> &SparqlClient {
        &self.client
    }

    pub fn close(&self) {
        self.client.close();
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: Commands) -> Result<CommandResult> {
        match command {
            Commands::Query { file, args, format } => self.execute_query(file, args, format).await,
            Commands::Update { file, args, format } => self.execute_update(file, args, format).await,
            Commands::Prepare { file, args } => self.execute_prepare(file, args),
            Commands::Get { format } => self.execute_get(format).await,
            Commands::Put { format, file } => self.execute_put(format, file).await,
            Commands::Post { format, file } => self.execute_post(format, file).await,
            Commands::Delete => self.execute_delete().await,
        }
    }

    async fn execute_query(
        &self,
        file: PathBuf,
        args: Vec<(String, String)>,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        let template = read_template(&file)?;
        let response = self.client.query(&template, &template_arguments(args)).await?;
        println!("{}", render(&response, &format)?);

        // ASK answered false exits non-zero
        let answer = response["boolean"].as_bool();
        let count = response["results"]["bindings"].as_array().map(Vec::len);
        Ok(CommandResult {
            success: answer.unwrap_or(true),
            message: match (answer, count) {
                (Some(answer), _) => format!("ASK answered {}", answer),
                (None, Some(count)) => format!("Query returned {} solutions", count),
                (None, None) => "Query completed".to_string(),
            },
            data: Some(response),
        })
    }

    async fn execute_update(
        &self,
        file: PathBuf,
        args: Vec<(String, String)>,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        let template = read_template(&file)?;
        let response = self.client.update(&template, &template_arguments(args)).await?;
        println!("{}", render(&response, &format)?);

        Ok(CommandResult {
            success: true,
            message: "Update completed".to_string(),
            data: Some(response),
        })
    }

    fn execute_prepare(&self, file: PathBuf, args: Vec<(String, String)>) -> Result<CommandResult> {
        let template = read_template(&file)?;
        let prepared = self.client.prepare(&template, &template_arguments(args))?;
        println!("{}", prepared);

        Ok(CommandResult {
            success: true,
            message: "Template prepared".to_string(),
            data: Some(serde_json::Value::String(prepared)),
        })
    }

    async fn execute_get(&self, format: String) -> Result<CommandResult> {
        let response = self.client.get(None, &format).await?;
        let body = response.text().await?;
        println!("{}", body);

        Ok(CommandResult {
            success: true,
            message: format!("Fetched {} bytes of {}", body.len(), format),
            data: Some(serde_json::Value::String(body)),
        })
    }

    async fn execute_put(&self, format: String, file: PathBuf) -> Result<CommandResult> {
        let data = read_input(&file)?;
        debug!(bytes = data.len(), format = %format, "Replacing graph");
        let status = self.client.put(data, &format, None).await?.status();
        Ok(store_result("Graph replaced", status.as_u16()))
    }

    async fn execute_post(&self, format: String, file: PathBuf) -> Result<CommandResult> {
        let data = read_input(&file)?;
        debug!(bytes = data.len(), format = %format, "Adding to graph");
        let status = self.client.post(data, &format, None).await?.status();
        Ok(store_result("Graph updated", status.as_u16()))
    }

    async fn execute_delete(&self) -> Result<CommandResult> {
        let status = self.client.delete(None).await?.status();
        Ok(store_result("Graph deleted", status.as_u16()))
    }
}

fn store_result(message: &str, status: u16) -> CommandResult {
    println!("{} ({})", message, status);
    CommandResult {
        success: true,
        message: message.to_string(),
        data: Some(serde_json::json!({ "status": status })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("ex=http://example.org/").unwrap(),
            ("ex".to_string(), "http://example.org/".to_string())
        );
        assert_eq!(
            parse_key_value("filter=?a = ?b").unwrap(),
            ("filter".to_string(), "?a = ?b".to_string())
        );
        assert_eq!(parse_key_value("empty=").unwrap().1, "");
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_template_arguments() {
        let args = template_arguments(vec![
            ("s".to_string(), "<http://example.org/john>".to_string()),
            ("limit".to_string(), "10".to_string()),
        ]);
        assert_eq!(args.get("s").map(ToString::to_string).as_deref(), Some("<http://example.org/john>"));
        assert!(args.contains("limit"));
        assert!(args.positional(0).is_none());
    }

    #[test]
    fn test_render() {
        let value = serde_json::json!({"boolean": true});
        assert_eq!(render(&value, &OutputFormat::Json).unwrap(), r#"{"boolean":true}"#);
        assert!(render(&value, &OutputFormat::JsonPretty).unwrap().contains('\n'));
    }

    proptest! {
        #[test]
        fn test_parse_key_value_splits_on_first_equals(
            key in "[a-z][a-z0-9_]{0,8}",
            value in "[ -~]{0,20}",
        ) {
            let (k, v) = parse_key_value(&format!("{}={}", key, value)).unwrap();
            prop_assert_eq!(k, key);
            prop_assert_eq!(v, value);
        }
    }
}
