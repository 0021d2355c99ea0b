//! Component server implementation
//!
//! This module wires the configuration, the tagging engine and the router
//! together and owns the listener lifecycle.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::{oneshot, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tower_http::trace::TraceLayer;

use crate::config::{Config, ConfigError, ServerConfig, WorkerPolicy};
use crate::engine::{EngineError, RuleTagger, TimexEngine};
use crate::xmi::TypeSystemDescription;

use super::api::create_router;
use super::documentation::TextImagerDocumentation;
use super::processor::Processor;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Document and engine, checked out once per process request
    pub processor: Arc<Mutex<Processor>>,

    /// Configuration
    pub config: ServerConfig,

    /// Name of the tagging engine
    pub engine_name: String,
}

impl AppState {
    pub fn new(config: ServerConfig, engine: Box<dyn TimexEngine>) -> Self {
        let engine_name = engine.name().to_string();
        Self {
            processor: Arc::new(Mutex::new(Processor::new(engine))),
            config,
            engine_name,
        }
    }

    /// Component description served by `/v1/documentation`
    pub fn documentation(&self) -> TextImagerDocumentation {
        let meta = HashMap::from([
            ("engine".to_string(), self.engine_name.clone()),
            (
                "workers".to_string(),
                i64::from(self.config.workers).to_string(),
            ),
            (
                "max_payload_bytes".to_string(),
                self.config.max_payload_bytes.to_string(),
            ),
        ]);

        TextImagerDocumentation {
            meta: Some(meta),
            implementation_specific: TypeSystemDescription::component()
                .and_then(|descriptor| descriptor.to_xml())
                .ok(),
            ..TextImagerDocumentation::default()
        }
    }
}

// ============================================================================
// Component Server
// ============================================================================

/// DUUI component server
pub struct ComponentServer {
    config: ServerConfig,
    state: AppState,
}

impl ComponentServer {
    /// Create a server running the rule tagger
    pub fn new(config: &Config) -> Result<Self, ServerError> {
        config.validate()?;
        let tagger = RuleTagger::new(config.engine.clone())?;
        Self::with_engine(config.server.clone(), Box::new(tagger))
    }

    /// Create a server running an arbitrary engine
    pub fn with_engine(
        config: ServerConfig,
        engine: Box<dyn TimexEngine>,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        let state = AppState::new(config.clone(), engine);
        Ok(Self { config, state })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.max_payload_bytes));

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        let router = self.build_router();

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("Component server shutdown complete");
        Ok(())
    }

    /// Bind the listener and serve on a background task
    pub async fn spawn(&self) -> Result<ServerHandle, ServerError> {
        let listener = self.bind().await?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: self.config.socket_addr(),
            source,
        })?;
        let router = self.build_router();

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await
                .map_err(ServerError::Serve)
        });

        Ok(ServerHandle {
            local_addr,
            shutdown: Some(shutdown),
            task,
        })
    }

    async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!(
            addr = %listener.local_addr().unwrap_or(addr),
            engine = %self.state.engine_name,
            workers = i64::from(self.config.workers),
            "Starting DUUI component server"
        );
        Ok(listener)
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.socket_addr(),
            engine: self.state.engine_name.clone(),
            workers: self.config.workers,
            max_payload_bytes: self.config.max_payload_bytes,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub engine: String,
    pub workers: WorkerPolicy,
    pub max_payload_bytes: usize,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        let workers = match self.workers.threads() {
            Some(n) => n.to_string(),
            None => "cached".to_string(),
        };
        format!(
            "DUUI HeidelTimeX Component\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Engine: {}\n\
             Workers: {}\n\
             Max Payload: {} bytes\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.engine,
            workers,
            self.max_payload_bytes,
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

/// A server running on a background task
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl ServerHandle {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait until the server stops on its own
    pub async fn finished(&mut self) -> Result<(), ServerError> {
        (&mut self.task).await.map_err(ServerError::Task)?
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.task.await.map_err(ServerError::Task)?
    }
}

/// Build the runtime the listener runs on
///
/// The blocking pool that runs the pipeline is sized like the worker pool,
/// so a single-worker policy handles exactly one document at a time.
pub fn build_runtime(policy: WorkerPolicy) -> io::Result<Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all().thread_name("duui-worker");

    if let Some(threads) = policy.threads() {
        builder.worker_threads(threads).max_blocking_threads(threads);
    }

    builder.build()
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize engine: {0}")]
    Engine(#[from] EngineError),

    #[error("Failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("Server error: {0}")]
    Serve(io::Error),

    #[error("Server task failed: {0}")]
    Task(JoinError),
}

// ============================================================================
// Tests
// ============================================================================
