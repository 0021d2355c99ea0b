//! Annotation-graph document model
//!
//! A [`Document`] is the text of the initial CAS view, its language and the
//! annotations this component understands. Annotation types owned by other
//! components never enter the model; the XMI codec carries them in its
//! [`ShareData`](crate::xmi::ShareData) instead.
//!
//! All offsets are UTF-16 code units so that spans agree with the JVM-based
//! components of a DUUI pipeline. [`TextIndex`] converts them to Rust string
//! slices.

mod text;
pub mod types;

pub use text::TextIndex;

use thiserror::Error;

/// Language tag UIMA assigns to documents without an explicit language
pub const UNSPECIFIED_LANGUAGE: &str = "x-unspecified";

/// Identity of an annotation within one [`Document`]
///
/// Ids are handed out in insertion order and restart at zero after
/// [`Document::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(u32);

impl AnnotationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Engine-native time expression (`de.unihd.dbs.uima.types.heideltime.Timex3`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timex3 {
    pub timex_id: String,
    /// DATE, TIME, DURATION or SET
    pub timex_type: String,
    /// TIMEX3 normalized value, e.g. `1984-12-19` or `P3Y`
    pub timex_value: String,
    pub timex_quant: Option<String>,
    pub timex_freq: Option<String>,
    pub timex_mod: Option<String>,
    pub found_by_rule: Option<String>,
}

/// Public output annotation (`org.texttechnologylab.annotation.type.Time`)
///
/// On the wire `kind` is written as `value` and `normalized_value` as
/// `identifier`. Downstream consumers depend on that pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Time {
    pub kind: String,
    pub normalized_value: String,
}

/// Closed set of annotation types this component reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationKind {
    Token,
    Sentence,
    Timex3(Timex3),
    Time(Time),
}

impl AnnotationKind {
    /// Fully-qualified UIMA type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Token => types::TOKEN,
            Self::Sentence => types::SENTENCE,
            Self::Timex3(_) => types::TIMEX3,
            Self::Time(_) => types::TIME,
        }
    }
}

/// A typed annotation over the half-open span `[begin, end)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    id: AnnotationId,
    pub begin: usize,
    pub end: usize,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn span(&self) -> (usize, usize) {
        (self.begin, self.end)
    }
}

/// Span outside the document text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("annotation span [{begin}, {end}) is invalid for a text of length {len}")]
pub struct SpanError {
    pub begin: usize,
    pub end: usize,
    pub len: usize,
}

/// Text, language and annotations of one CAS view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    language: String,
    len_utf16: usize,
    annotations: Vec<Annotation>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            text: String::new(),
            language: UNSPECIFIED_LANGUAGE.to_string(),
            len_utf16: 0,
            annotations: Vec::new(),
        }
    }

    /// Create a document with text and language but no annotations
    pub fn with_text(text: impl Into<String>, language: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.set_text(text);
        doc.set_language(language);
        doc
    }

    /// Clear text, language and annotations, keeping the allocations
    pub fn reset(&mut self) {
        self.text.clear();
        self.language.clear();
        self.language.push_str(UNSPECIFIED_LANGUAGE);
        self.len_utf16 = 0;
        self.annotations.clear();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the document text
    ///
    /// Existing annotations are kept, so this is only meant for documents that
    /// have none yet.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.len_utf16 = self.text.encode_utf16().count();
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    /// Length of the text in UTF-16 code units
    pub fn len(&self) -> usize {
        self.len_utf16
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Build an offset index over the current text
    pub fn text_index(&self) -> TextIndex {
        TextIndex::new(&self.text)
    }

    /// Add an annotation, validating `0 <= begin <= end <= len`
    pub fn add(
        &mut self,
        begin: usize,
        end: usize,
        kind: AnnotationKind,
    ) -> Result<AnnotationId, SpanError> {
        if begin > end || end > self.len_utf16 {
            return Err(SpanError {
                begin,
                end,
                len: self.len_utf16,
            });
        }

        let id = AnnotationId(self.annotations.len() as u32);
        self.annotations.push(Annotation {
            id,
            begin,
            end,
            kind,
        });
        Ok(id)
    }

    /// All annotations in insertion order
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(id.index())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .filter(|a| matches!(a.kind, AnnotationKind::Token))
    }

    pub fn sentences(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .filter(|a| matches!(a.kind, AnnotationKind::Sentence))
    }

    pub fn timexes(&self) -> impl Iterator<Item = (&Annotation, &Timex3)> {
        self.annotations.iter().filter_map(|a| match &a.kind {
            AnnotationKind::Timex3(timex) => Some((a, timex)),
            _ => None,
        })
    }

    pub fn times(&self) -> impl Iterator<Item = (&Annotation, &Time)> {
        self.annotations.iter().filter_map(|a| match &a.kind {
            AnnotationKind::Time(time) => Some((a, time)),
            _ => None,
        })
    }

    /// Text covered by an annotation
    ///
    /// Returns `None` if a span boundary splits a surrogate pair.
    pub fn covered_text(&self, annotation: &Annotation) -> Option<&str> {
        let range = self.text_index().byte_range(annotation.begin, annotation.end)?;
        self.text.get(range)
    }
}
