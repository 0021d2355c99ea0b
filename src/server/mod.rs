//! DUUI component server
//!
//! The server exposes the tagger through the DUUI component protocol. Every
//! `/v1/process` request runs the same pipeline on one shared document:
//!
//! ```text
//!   XMI body ──► decode ──► tag (Timex3) ──► project (Time) ──► encode ──► XMI
//!                  │                                              ▲
//!                  └──────────── ShareData (foreign elements) ────┘
//! ```
//!
//! # Endpoints
//!
//! ```text
//! GET  /v1/communication_layer   Lua (de)serialization script
//! GET  /v1/typesystem            UIMA type system descriptor
//! GET  /v1/details/input_output  consumed and produced types
//! GET  /v1/documentation         component documentation
//! POST /v1/process               annotate an XMI document
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use duui_heideltimex::config::Config;
//! use duui_heideltimex::server::ComponentServer;
//!
//! let server = ComponentServer::new(&Config::default())?;
//! server.start().await?;
//! ```

pub mod api;
pub mod component;
pub mod documentation;
pub mod processor;

// Re-export main types
pub use api::{InputOutput, COMMUNICATION_LAYER};
pub use component::{
    build_runtime, AppState, ComponentServer, ServerError, ServerHandle, ServerInfo,
};
pub use documentation::{TextImagerCapability, TextImagerDocumentation};
pub use processor::{Phase, Processor};
