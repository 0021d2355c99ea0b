//! Time-expression tagging engine
//!
//! The server treats the tagger as a black box behind [`TimexEngine`]: it gets
//! a document with `Token` and `Sentence` annotations and adds `Timex3`
//! annotations. [`RuleTagger`] is the engine shipped with the crate.

mod lexicon;
mod normalize;
mod rules;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cas::{types, Document, SpanError, UNSPECIFIED_LANGUAGE};

pub use rules::RuleTagger;

/// Errors raised while tagging a document
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("document has text but no {type_name} annotations")]
    MissingInput { type_name: &'static str },

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("invalid span: {0}")]
    InvalidSpan(#[from] SpanError),

    #[error("rule '{rule}' failed: {reason}")]
    Rule { rule: String, reason: String },
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Language used for documents tagged `x-unspecified`
    pub default_language: String,

    /// Anchor for relative expressions that precede any explicit date
    pub reference_date: Option<NaiveDate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_language: "de".to_string(),
            reference_date: None,
        }
    }
}

/// Languages with a rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    German,
    English,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::German, Language::English];

    /// Resolve a BCP 47 tag such as `de` or `en-GB`
    pub fn from_tag(tag: &str) -> Result<Self, EngineError> {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "de" => Ok(Self::German),
            "en" => Ok(Self::English),
            _ => Err(EngineError::UnsupportedLanguage(tag.to_string())),
        }
    }

    /// Resolve the language of a document, falling back to `default` when the
    /// document does not declare one
    pub fn for_document(tag: &str, default: Language) -> Result<Self, EngineError> {
        if tag.is_empty() || tag == UNSPECIFIED_LANGUAGE {
            return Ok(default);
        }
        Self::from_tag(tag)
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::German => "de",
            Self::English => "en",
        }
    }
}

/// A time-expression tagger
///
/// Implementations insert `Timex3` annotations and leave every existing
/// annotation untouched. They may keep state between documents, which is why
/// `process` takes `&mut self`.
pub trait TimexEngine: Send {
    fn name(&self) -> &str;

    /// Tag `doc` in place, returning the number of added annotations
    fn process(&mut self, doc: &mut Document) -> Result<usize, EngineError>;
}

/// Fail unless a non-empty document carries sentences and tokens
pub fn check_input(doc: &Document) -> Result<(), EngineError> {
    if doc.is_empty() {
        return Ok(());
    }
    if doc.sentences().next().is_none() {
        return Err(EngineError::MissingInput {
            type_name: types::SENTENCE,
        });
    }
    if doc.tokens().next().is_none() {
        return Err(EngineError::MissingInput {
            type_name: types::TOKEN,
        });
    }
    Ok(())
}
