//! UIMA XMI document codec
//!
//! Reads and writes the XMI 2.0 serialization of a CAS as exchanged between
//! DUUI components. Only the initial view is mapped onto a [`Document`];
//! foreign annotation types, unknown features of known types, other views and
//! namespace declarations travel in the [`ShareData`] returned by [`decode`]
//! and are restored by [`encode`], so a document passes through this
//! component without losing what upstream components added.
//!
//! # Usage
//!
//! ```
//! use duui_heideltimex::cas::{AnnotationKind, Document};
//! use duui_heideltimex::xmi::{self, ShareData};
//!
//! let mut doc = Document::with_text("1985", "de");
//! doc.add(0, 4, AnnotationKind::Token).unwrap();
//!
//! let bytes = xmi::encode(&doc, &ShareData::default()).unwrap();
//! let (decoded, _share) = xmi::decode(&bytes).unwrap();
//! assert_eq!(decoded, doc);
//! ```

mod decode;
mod element;
mod encode;
pub mod error;
pub mod namespace;
pub mod typesystem;

use std::collections::HashMap;

pub use decode::decode_into;
pub use element::{XmiElement, XmiNode};
pub use encode::encode;
pub use error::{CodecError, CodecResult};
pub use typesystem::{TypeSystemDescription, TypeSystemError};

use crate::cas::{AnnotationId, Document};
use namespace::Namespaces;

/// Sofa id of the default view
pub const INITIAL_VIEW: &str = "_InitialView";

/// Decode XMI into a new [`Document`]
pub fn decode(bytes: &[u8]) -> CodecResult<(Document, ShareData)> {
    let mut doc = Document::new();
    let share = decode_into(&mut doc, bytes)?;
    Ok((doc, share))
}

/// Element decoded into the model, kept for its original `xmi:id` and for
/// features this component does not model
#[derive(Debug, Clone)]
pub(crate) struct KnownElement {
    pub(crate) id: Option<u64>,
    pub(crate) element: XmiElement,
}

/// Position of an element in the original document
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Known(AnnotationId),
    DocumentAnnotation,
    Foreign(XmiElement),
}

/// Codec state that makes a decode/encode pair lossless
///
/// Obtained from [`decode`] and passed back to [`encode`]. The default value
/// describes a document that was never decoded.
#[derive(Debug, Clone, Default)]
pub struct ShareData {
    pub(crate) namespaces: Namespaces,
    pub(crate) root_attributes: Vec<(String, String)>,
    pub(crate) layout: Vec<Entry>,
    pub(crate) known: HashMap<AnnotationId, KnownElement>,
    pub(crate) document_annotation: Option<KnownElement>,
    pub(crate) sofa: Option<KnownElement>,
    pub(crate) view: Option<XmiElement>,
    pub(crate) view_foreign_members: Vec<u64>,
    pub(crate) max_id: u64,
}

impl ShareData {
    /// Highest `xmi:id` of the decoded document
    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    /// Elements of types this component does not model, in document order
    pub fn foreign_elements(&self) -> impl Iterator<Item = &XmiElement> {
        self.layout.iter().filter_map(|entry| match entry {
            Entry::Foreign(element) => Some(element),
            _ => None,
        })
    }

    pub fn foreign_count(&self) -> usize {
        self.foreign_elements().count()
    }

    /// Original `xmi:id` of a decoded annotation
    pub fn xmi_id(&self, annotation: AnnotationId) -> Option<u64> {
        self.known.get(&annotation).and_then(|known| known.id)
    }
}
