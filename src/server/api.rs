//! DUUI protocol handlers
//!
//! This module defines the routes and handlers of the component.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::cas::types;
use crate::error::Error;
use crate::xmi::TypeSystemDescription;

use super::component::AppState;

/// Orchestrator script that (de)serializes documents as XMI
pub const COMMUNICATION_LAYER: &str = include_str!("communication_layer.lua");

const XML: &str = "application/xml; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

// ============================================================================
// API Response Types
// ============================================================================

/// Annotation types consumed and produced by the component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputOutput {
    pub input: Vec<String>,
    pub output: Vec<String>,
}

impl Default for InputOutput {
    fn default() -> Self {
        Self {
            input: types::INPUT_TYPES.iter().map(|t| t.to_string()).collect(),
            output: types::OUTPUT_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Discovery endpoints
        .route("/v1/communication_layer", get(communication_layer))
        .route("/v1/typesystem", get(typesystem))
        .route("/v1/details/input_output", get(input_output))
        .route("/v1/documentation", get(documentation))
        // Processing endpoint
        .route("/v1/process", post(process))
        .with_state(state)
}

// ============================================================================
// Discovery Handlers
// ============================================================================

async fn communication_layer() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT)], COMMUNICATION_LAYER)
}

async fn typesystem() -> Response {
    match TypeSystemDescription::component().and_then(|descriptor| descriptor.to_xml()) {
        Ok(xml) => ([(header::CONTENT_TYPE, XML)], xml).into_response(),
        Err(e) => error_response(&Error::from(e)),
    }
}

/// Failures are reported with the bare message, without a trace
async fn input_output() -> Response {
    match input_output_json() {
        Ok(json) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize input/output types");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn input_output_json() -> crate::error::Result<String> {
    Ok(serde_json::to_string(&InputOutput::default())?)
}

async fn documentation(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.documentation())
}

// ============================================================================
// Processing Handler
// ============================================================================

/// Run the pipeline on an XMI body
///
/// Requests are serialized on the processor mutex; the pipeline itself runs
/// on the blocking pool while holding the lock.
async fn process(State(state): State<AppState>, body: Bytes) -> Response {
    let start = Instant::now();
    let size = body.len();

    let processor = state.processor.clone().lock_owned().await;
    let waited_ms = start.elapsed().as_millis() as u64;

    let result = tokio::task::spawn_blocking(move || {
        let mut processor = processor;
        processor.process(&body)
    })
    .await
    .map_err(Error::from)
    .and_then(|result| result);

    match result {
        Ok(encoded) => {
            tracing::debug!(
                size,
                waited_ms,
                elapsed_ms = start.elapsed().as_millis() as u64,
                status = 200,
                "Process request complete"
            );
            ([(header::CONTENT_TYPE, XML)], encoded).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Log an error and report it as `"<message>:\n<trace>"`
fn error_response(err: &Error) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    tracing::error!(status = status.as_u16(), error = %err, "Request failed");
    (status, [(header::CONTENT_TYPE, TEXT)], err.diagnostic()).into_response()
}

// ============================================================================
// Tests
// ============================================================================
