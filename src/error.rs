//! Unified error handling for the component
//!
//! Every concern has its own `thiserror` enum ([`CodecError`],
//! [`EngineError`], [`TypeSystemError`], [`ConfigError`]). They convert into
//! the crate-wide [`Error`], whose [`ErrorCategory`] decides the HTTP status
//! reported to the orchestrator:
//!
//! - [`ErrorCategory::ClientInput`] - the request body could not be decoded (422)
//! - [`ErrorCategory::Internal`] - everything else (500)
//!
//! # Usage
//!
//! ```rust
//! use duui_heideltimex::error::{Error, ErrorCategory, ErrorClass};
//! use duui_heideltimex::xmi::CodecError;
//!
//! let err: Error = CodecError::MissingRoot.into();
//! assert_eq!(err.category(), ErrorCategory::ClientInput);
//! assert_eq!(err.category().status_code(), 422);
//! ```

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::Write as _;

use thiserror::Error;

pub use crate::cas::SpanError;
pub use crate::config::ConfigError;
pub use crate::engine::EngineError;
pub use crate::xmi::{CodecError, TypeSystemError};

/// Classification shared by all error types of the crate
pub trait ErrorClass: std::error::Error {
    fn category(&self) -> ErrorCategory;
}

/// Who is responsible for an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed or undecodable request data
    ClientInput,
    /// Engine, descriptor, encoding or I/O failure
    Internal,
}

impl ErrorCategory {
    /// HTTP status reported for this category
    pub fn status_code(self) -> u16 {
        match self {
            Self::ClientInput => 422,
            Self::Internal => 500,
        }
    }
}

impl ErrorClass for CodecError {
    fn category(&self) -> ErrorCategory {
        if self.is_malformed_input() {
            ErrorCategory::ClientInput
        } else {
            ErrorCategory::Internal
        }
    }
}

impl ErrorClass for EngineError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Internal
    }
}

impl ErrorClass for TypeSystemError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Internal
    }
}

impl ErrorClass for ConfigError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Internal
    }
}

/// Unified error type of the crate
#[derive(Error, Debug)]
pub enum Error {
    /// XMI decoding or encoding errors
    #[error("XMI error: {0}")]
    Codec(#[from] CodecError),

    /// Tagging engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Type system descriptor errors
    #[error("Type system error: {0}")]
    TypeSystem(#[from] TypeSystemError),

    /// Annotation span errors outside the codec
    #[error("Span error: {0}")]
    Span(#[from] SpanError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ErrorClass for Error {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Codec(e) => e.category(),
            Self::Engine(e) => e.category(),
            Self::TypeSystem(e) => e.category(),
            Self::Config(e) => e.category(),
            Self::Span(_) | Self::Json(_) | Self::Task(_) => ErrorCategory::Internal,
        }
    }
}

impl Error {
    /// HTTP status reported for this error
    pub fn status_code(&self) -> u16 {
        self.category().status_code()
    }

    /// Message followed by the full diagnostic trace
    pub fn diagnostic(&self) -> String {
        diagnostic_report(self)
    }
}

/// Render `"<message>:\n<trace>"` for an error body
///
/// The trace is the debug rendering of the error, its `source()` chain and a
/// backtrace when `RUST_BACKTRACE` enables one.
pub fn diagnostic_report(err: &(dyn std::error::Error + 'static)) -> String {
    let mut report = format!("{err}:\n{err:?}");

    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(report, "\nCaused by: {cause}");
        source = cause.source();
    }

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        let _ = write!(report, "\n{backtrace}");
    }

    report
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
