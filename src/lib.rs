//! duui-heideltimex - DUUI component for temporal expression tagging
//!
//! Serves a rule-based HeidelTime-style tagger through the DUUI component
//! protocol: documents arrive as UIMA XMI, gain `Timex3` and `Time`
//! annotations and are returned as XMI with everything else preserved.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`cas`] - Document model with UTF-16 annotation spans
//! - [`xmi`] - XMI codec and type system descriptor
//! - [`engine`] - Temporal expression tagging and normalization
//! - [`projector`] - Copies `Timex3` results into generic `Time` annotations
//! - [`server`] - HTTP endpoints and the request pipeline
//! - [`config`] - Configuration management and settings
//! - [`error`] - Error types and their HTTP mapping
//!
//! # Example
//!
//! ```no_run
//! use duui_heideltimex::config::Config;
//! use duui_heideltimex::server::ComponentServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = ComponentServer::new(&config)?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

pub mod cas;
pub mod config;
pub mod engine;
pub mod error;
pub mod projector;
pub mod server;
pub mod xmi;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cas::{Annotation, AnnotationKind, Document};
    pub use crate::config::Config;
    pub use crate::engine::{RuleTagger, TimexEngine};
    pub use crate::error::{Error, ErrorCategory, ErrorClass, Result};
    pub use crate::server::ComponentServer;
    pub use crate::xmi::ShareData;
}
