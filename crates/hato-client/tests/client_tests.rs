use hato_client::{ClientConfig, ClientError, SparqlClient};
use hato_core::namespace::rdf;
use hato_core::syntax::Triples;
use hato_core::term::Iri;
use hato_template::Arguments;
use mockito::{Matcher, Server};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const GRAPH: &str = "http://mu.semte.ch/test-application";
const RDF_PREFIX: &str = "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>";

fn sample_triples() -> Triples {
    let mut triples = Triples::new();
    triples
        .push_triple("john", rdf::type_, "doe")
        .unwrap()
        .push_triple("john", "p", "o")
        .unwrap();
    triples
}

fn assert_send_sync<T: Send + Sync>() {}

fn client_for(server: &Server) -> SparqlClient {
    let config = ClientConfig::new(&format!("{}/sparql", server.url()))
        .with_update_endpoint(&format!("{}/sparql-update", server.url()))
        .with_crud_endpoint(&format!("{}/crud", server.url()))
        .with_graph(Iri::new(GRAPH));
    SparqlClient::new(config).unwrap()
}

fn client_without_graph(server: &Server) -> SparqlClient {
    let config = ClientConfig::new(&format!("{}/sparql", server.url()))
        .with_crud_endpoint(&format!("{}/crud", server.url()));
    SparqlClient::new(config).unwrap()
}

#[tokio::test]
async fn test_query() {
    let mut server = Server::new_async().await;
    let expected = format!(
        "{}\n\nSELECT *\nFROM <{}>\nWHERE {{\n    john rdf:type \"doe\" ;\n        p \"o\" .\n}}",
        RDF_PREFIX, GRAPH
    );
    let mock = server
        .mock("POST", "/sparql")
        .match_header("accept", "application/json")
        .match_body(Matcher::UrlEncoded("query".into(), expected))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"head": {"vars": []}, "results": {"bindings": []}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client
        .query(
            "
            SELECT *
            FROM {{graph}}
            WHERE {
                {{}}
            }
            ",
            &Arguments::new().arg(sample_triples()),
        )
        .await
        .unwrap();

    assert_eq!(result["results"]["bindings"], json!([]));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_query_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/sparql")
        .match_body(Matcher::Regex("failure".into()))
        .with_status(400)
        .with_body("Virtuoso 37000 Error SP030: SPARQL compiler")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.query("failure", &Arguments::new()).await.unwrap_err();
    match &err {
        ClientError::RequestFailed { status, reason, explanation } => {
            assert_eq!(*status, 400);
            assert_eq!(reason, "Bad Request");
            assert!(explanation.contains("SP030"));
        }
        other => panic!("Expected RequestFailed, got {:?}", other),
    }
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("SPARQL compiler"));
}

#[tokio::test]
async fn test_update() {
    let mut server = Server::new_async().await;
    let expected = format!(
        "{}\n\nWITH <{}>\nINSERT DATA {{\n    john rdf:type \"doe\" ;\n        p \"o\" .\n}}",
        RDF_PREFIX, GRAPH
    );
    let mock = server
        .mock("POST", "/sparql-update")
        .match_body(Matcher::UrlEncoded("update".into(), expected))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client
        .update(
            "
            WITH {{graph}}
            INSERT DATA {
                {{}}
            }
            ",
            &Arguments::new().arg(sample_triples()),
        )
        .await
        .unwrap();

    assert_eq!(result, json!({"ok": true}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_with_text_response() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/sparql-update")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body("Insert into <g>, 2 triples -- done")
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.update("INSERT DATA { <a> <b> <c> }", &Arguments::new()).await.unwrap();
    assert_eq!(result, json!({"body": "Insert into <g>, 2 triples -- done"}));
}

#[tokio::test]
async fn test_update_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/sparql-update")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.update("failure", &Arguments::new()).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_select() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/sparql")
        .with_status(200)
        .with_header("content-type", "application/sparql-results+json")
        .with_body(
            json!({
                "head": {"vars": ["s"]},
                "results": {"bindings": [{"s": {"type": "uri", "value": "http://example.org/john"}}]}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let results = client.select("SELECT ?s { ?s ?p ?o }", &Arguments::new()).await.unwrap();
    assert_eq!(results.vars(), ["s"]);
    assert_eq!(results.column("s").next().map(|t| t.value()), Some("http://example.org/john"));
}

#[tokio::test]
async fn test_get_without_graph() {
    let mut server = Server::new_async().await;
    let default_graph = server
        .mock("GET", "/crud")
        .match_query(Matcher::Exact("default".into()))
        .match_header("accept", "some/format")
        .with_status(200)
        .create_async()
        .await;
    let named_graph = server
        .mock("GET", "/crud")
        .match_query(Matcher::UrlEncoded("graph".into(), "foo".into()))
        .match_header("accept", "some/format")
        .with_status(200)
        .create_async()
        .await;

    let client = client_without_graph(&server);
    let response = client.get(None, "some/format").await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    client.get(Some(&Iri::new("foo")), "some/format").await.unwrap();

    default_graph.assert_async().await;
    named_graph.assert_async().await;
}

#[tokio::test]
async fn test_get_with_configured_graph() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/crud")
        .match_query(Matcher::UrlEncoded("graph".into(), GRAPH.into()))
        .match_header("accept", "text/turtle")
        .with_status(200)
        .with_body("<a> <b> <c> .")
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client.get(None, "text/turtle").await.unwrap();
    assert_eq!(response.text().await.unwrap(), "<a> <b> <c> .");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_put_post_delete() {
    let mut server = Server::new_async().await;
    let put = server
        .mock("PUT", "/crud")
        .match_query(Matcher::UrlEncoded("graph".into(), GRAPH.into()))
        .match_header("content-type", "some/format")
        .match_body("<a> <b> <c> .")
        .with_status(204)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/crud")
        .match_query(Matcher::UrlEncoded("graph".into(), "foo".into()))
        .match_header("content-type", "some/format")
        .with_status(204)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/crud")
        .match_query(Matcher::UrlEncoded("graph".into(), GRAPH.into()))
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(&server);
    client.put("<a> <b> <c> .", "some/format", None).await.unwrap();
    client.post(Vec::<u8>::new(), "some/format", Some(&Iri::new("foo"))).await.unwrap();
    client.delete(None).await.unwrap();

    put.assert_async().await;
    post.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_crud_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/crud")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("no such graph")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.delete(Some(&Iri::new("http://missing"))).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("no such graph"));
}

#[tokio::test]
async fn test_basic_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/sparql")
        .match_header("authorization", "Basic ZGJhOmRiYQ==")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let config = ClientConfig::new(&format!("{}/sparql", server.url())).with_credentials("dba", "dba");
    let client = SparqlClient::new(config).unwrap();
    client.query("ASK { ?s ?p ?o }", &Arguments::new()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_closed_client() {
    let server = Server::new_async().await;
    let client = client_for(&server);
    client.close();
    let err = client.query("SELECT * { ?s ?p ?o }", &Arguments::new()).await.unwrap_err();
    assert!(matches!(err, ClientError::Closed));
    let err = client.get(None, "text/turtle").await.unwrap_err();
    assert!(matches!(err, ClientError::Closed));
}

#[tokio::test]
async fn test_template_errors_before_network() {
    let server = Server::new_async().await;
    let client = client_for(&server);
    let err = client.query("SELECT {{missing}}", &Arguments::new()).await.unwrap_err();
    assert!(matches!(err, ClientError::Template(_)));
}

#[test]
fn test_client_is_send_and_sync() {
    assert_send_sync::<SparqlClient>();
    assert_send_sync::<ClientConfig>();
}

#[tokio::test]
async fn test_concurrent_calls_share_one_client() {
    let mut server = Server::new_async().await;
    let query = server
        .mock("POST", "/sparql")
        .match_body(Matcher::Regex("query=".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"head": {"vars": []}, "boolean": true}"#)
        .create_async()
        .await;
    let update = server
        .mock("POST", "/sparql-update")
        .match_body(Matcher::Regex("update=".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let args = Arguments::new();
    let (asked, updated) = tokio::join!(
        client.query("ASK { ?s ?p ?o }", &args),
        client.update("INSERT DATA { <a> <b> <c> }", &args),
    );

    assert_eq!(asked.unwrap()["boolean"], json!(true));
    assert_eq!(updated.unwrap(), json!({"ok": true}));
    query.assert_async().await;
    update.assert_async().await;
}

/// Read one request: headers, then as many body bytes as Content-Length says
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            return;
        }
        request.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&request);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .map(|(_, value)| value.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            if request.len() >= end + 4 + length {
                return;
            }
        }
    }
}

#[tokio::test]
async fn test_failure_with_unreadable_body() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(b"HTTP/1.1 502 Bad Gateway\r\nContent-Length: 100\r\n\r\npartial")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let client = SparqlClient::new(ClientConfig::new(&format!("http://{}/sparql", address))).unwrap();
    let err = client.query("ASK { ?s ?p ?o }", &Arguments::new()).await.unwrap_err();
    match err {
        ClientError::RequestFailed { status, reason, explanation } => {
            assert_eq!(status, 502);
            assert_eq!(reason, "Bad Gateway");
            assert!(explanation.is_empty());
        }
        other => panic!("Expected RequestFailed, got {:?}", other),
    }
    server.await.unwrap();
}
