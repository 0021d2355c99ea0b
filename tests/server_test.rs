//! End-to-end tests against a running component
//!
//! Each test binds its own server on an ephemeral loopback port and talks to
//! it over HTTP.

mod common;

use std::net::SocketAddr;

use duui_heideltimex::cas::Document;
use duui_heideltimex::engine::{EngineConfig, EngineError, RuleTagger, TimexEngine};
use duui_heideltimex::server::{ComponentServer, ServerHandle};
use duui_heideltimex::xmi;

use common::{local_config, xmi_request, NARRATIVE};

struct FailingEngine;

impl TimexEngine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    fn process(&mut self, _doc: &mut Document) -> Result<usize, EngineError> {
        Err(EngineError::Rule {
            rule: "date_numeric".into(),
            reason: "engine exploded".into(),
        })
    }
}

async fn spawn_server() -> (ComponentServer, ServerHandle) {
    let tagger = RuleTagger::new(EngineConfig::default()).unwrap();
    let server = ComponentServer::with_engine(local_config(), Box::new(tagger)).unwrap();
    let handle = server.spawn().await.unwrap();
    (server, handle)
}

fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

async fn post_process(client: &reqwest::Client, addr: SocketAddr, body: Vec<u8>) -> reqwest::Response {
    client
        .post(url(addr, "/v1/process"))
        .header("content-type", "application/xml")
        .body(body)
        .send()
        .await
        .unwrap()
}

// ============================================================================
// Processing
// ============================================================================

#[tokio::test]
async fn test_process_narrative() {
    let (_server, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = post_process(&client, handle.local_addr(), xmi_request(NARRATIVE, "de")).await;
    assert_eq!(response.status(), 200);

    let body = response.bytes().await.unwrap();
    let (doc, _) = xmi::decode(&body).unwrap();

    let times: Vec<_> = doc
        .times()
        .map(|(annotation, time)| {
            (
                annotation.begin,
                doc.covered_text(annotation).unwrap(),
                time.kind.as_str(),
                time.normalized_value.as_str(),
            )
        })
        .collect();
    assert_eq!(
        times,
        vec![
            (0, "Am 19.12.1984", "DATE", "1984-12-19"),
            (36, "Am nächsten Tag", "DATE", "1984-12-20"),
        ]
    );
    assert_eq!(doc.timexes().count(), 2);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_process_heideltime_scenario() {
    let (_server, handle) = spawn_server().await;
    let client = reqwest::Client::new();
    let text = "Am 19.12.1984 fand ein Event vom vorherigen Tag blah nächstes Jahr, also 1985, etc. pp.";

    let response = post_process(&client, handle.local_addr(), xmi_request(text, "de")).await;
    assert_eq!(response.status(), 200);

    let (doc, _) = xmi::decode(&response.bytes().await.unwrap()).unwrap();
    assert!(doc
        .times()
        .any(|(annotation, _)| annotation.begin == 0
            && doc.covered_text(annotation) == Some("Am 19.12.1984")));
    assert_eq!(doc.times().count(), doc.timexes().count());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sequential_requests_are_independent() {
    let (_server, handle) = spawn_server().await;
    let client = reqwest::Client::new();
    let addr = handle.local_addr();

    let first = post_process(&client, addr, xmi_request(NARRATIVE, "de")).await;
    assert_eq!(first.status(), 200);

    let second = post_process(&client, addr, xmi_request("Hier steht nichts.", "de")).await;
    assert_eq!(second.status(), 200);

    let (doc, _) = xmi::decode(&second.bytes().await.unwrap()).unwrap();
    assert_eq!(doc.text(), "Hier steht nichts.");
    assert_eq!(doc.timexes().count(), 0);
    assert_eq!(doc.times().count(), 0);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_requests_are_serialized() {
    let (server, handle) = spawn_server().await;
    let client = reqwest::Client::new();
    let addr = handle.local_addr();

    let texts = [
        "Am 19.12.1984 fand ein Event statt.",
        "Das Treffen war im Mai 1985.",
        "On December 19, 1984 it snowed.",
        "Wir kamen vor zwei Wochen an.",
    ];
    let requests = texts.iter().cycle().take(12).enumerate().map(|(i, text)| {
        let client = client.clone();
        let language = if text.starts_with("On") { "en" } else { "de" };
        let body = xmi_request(text, language);
        tokio::spawn(async move {
            let response = post_process(&client, addr, body).await;
            (i, response.status(), response.bytes().await.unwrap())
        })
    });

    let mut results = Vec::new();
    for request in requests.collect::<Vec<_>>() {
        results.push(request.await.unwrap());
    }

    for (i, status, body) in results {
        assert_eq!(status, 200);
        let (doc, _) = xmi::decode(&body).unwrap();
        assert_eq!(doc.text(), texts[i % texts.len()]);
        assert_eq!(doc.times().count(), 1, "request {i}: {}", doc.text());
    }

    assert_eq!(server.state().processor.lock().await.processed(), 12);
    handle.shutdown().await.unwrap();
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_malformed_input_is_unprocessable() {
    let (_server, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = post_process(&client, handle.local_addr(), b"<xmi:XMI><broken".to_vec()).await;
    assert_eq!(response.status(), 422);

    let body = response.text().await.unwrap();
    assert!(body.contains(":\n"));

    // a failed request leaves the component usable
    let response = post_process(&client, handle.local_addr(), xmi_request(NARRATIVE, "de")).await;
    assert_eq!(response.status(), 200);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_engine_failure_is_internal_error() {
    let server = ComponentServer::with_engine(local_config(), Box::new(FailingEngine)).unwrap();
    let handle = server.spawn().await.unwrap();
    let client = reqwest::Client::new();

    let response = post_process(&client, handle.local_addr(), xmi_request(NARRATIVE, "de")).await;
    assert_eq!(response.status(), 500);

    let body = response.text().await.unwrap();
    assert!(body.contains("engine exploded"));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_payload_limit() {
    let config = duui_heideltimex::config::ServerConfig {
        max_payload_bytes: 64,
        ..local_config()
    };
    let tagger = RuleTagger::new(EngineConfig::default()).unwrap();
    let server = ComponentServer::with_engine(config, Box::new(tagger)).unwrap();
    let handle = server.spawn().await.unwrap();
    let client = reqwest::Client::new();

    let response = post_process(&client, handle.local_addr(), xmi_request(NARRATIVE, "de")).await;
    assert_eq!(response.status(), 413);

    handle.shutdown().await.unwrap();
}

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test]
async fn test_discovery_endpoints() {
    let (_server, handle) = spawn_server().await;
    let client = reqwest::Client::new();
    let addr = handle.local_addr();

    let layer = client
        .get(url(addr, "/v1/communication_layer"))
        .send()
        .await
        .unwrap();
    assert_eq!(layer.status(), 200);
    let script = layer.text().await.unwrap();
    assert!(script.contains("XmiCasSerializer"));
    assert!(script.contains("function deserialize(inputCas,inputStream)"));

    let typesystem = client.get(url(addr, "/v1/typesystem")).send().await.unwrap();
    assert_eq!(typesystem.status(), 200);
    let descriptor = typesystem.text().await.unwrap();
    assert!(descriptor.contains("de.unihd.dbs.uima.types.heideltime.Timex3"));
    assert!(descriptor.contains("org.texttechnologylab.annotation.type.Time"));

    let io: serde_json::Value = client
        .get(url(addr, "/v1/details/input_output"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(io.as_object().unwrap().len(), 2);
    assert_eq!(io["input"].as_array().unwrap().len(), 2);
    assert_eq!(io["output"].as_array().unwrap().len(), 2);

    let documentation: serde_json::Value = client
        .get(url(addr, "/v1/documentation"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(documentation["capability"]["supported_languages"][0], "de");

    handle.shutdown().await.unwrap();
}
