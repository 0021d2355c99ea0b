//! Error types for the XMI codec

use thiserror::Error;

use crate::cas::SpanError;

/// Errors raised while decoding or encoding XMI
#[derive(Error, Debug)]
pub enum CodecError {
    /// XML syntax error reported by the parser
    #[error("XML syntax error at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// Empty body or no root element
    #[error("document has no root element")]
    MissingRoot,

    /// Root is not `xmi:XMI`
    #[error("unexpected root element <{0}>, expected <xmi:XMI>")]
    UnexpectedRoot(String),

    /// EOF reached with open elements
    #[error("document is truncated, {open} element(s) left open")]
    Truncated { open: usize },

    /// Element name uses a prefix without namespace declaration
    #[error("undeclared namespace prefix '{0}'")]
    UnknownPrefix(String),

    /// Attribute value cannot be interpreted
    #[error("invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    /// Two elements share an `xmi:id`
    #[error("duplicate xmi:id {0}")]
    DuplicateId(u64),

    /// Annotation span outside the document text
    #[error("invalid annotation: {0}")]
    Span(#[from] SpanError),

    /// Structural problem not covered above
    #[error("malformed XMI: {0}")]
    Malformed(String),

    /// Writing the serialized document failed
    #[error("failed to write XMI: {0}")]
    Write(#[from] std::io::Error),
}

impl CodecError {
    /// Whether the error was caused by the input document
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, Self::Write(_))
    }

    pub(crate) fn invalid_attribute(
        element: &str,
        attribute: &str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
