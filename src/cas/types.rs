//! Fully-qualified UIMA type names used on the wire

pub const TOKEN: &str = "de.tudarmstadt.ukp.dkpro.core.api.segmentation.type.Token";
pub const SENTENCE: &str = "de.tudarmstadt.ukp.dkpro.core.api.segmentation.type.Sentence";
pub const TIMEX3: &str = "de.unihd.dbs.uima.types.heideltime.Timex3";
pub const TIME: &str = "org.texttechnologylab.annotation.type.Time";

pub const ANNOTATION: &str = "uima.tcas.Annotation";
pub const DOCUMENT_ANNOTATION: &str = "uima.tcas.DocumentAnnotation";
pub const DOCUMENT_META_DATA: &str = "de.tudarmstadt.ukp.dkpro.core.api.metadata.type.DocumentMetaData";
pub const SOFA: &str = "uima.cas.Sofa";
pub const VIEW: &str = "uima.cas.View";
pub const NULL: &str = "uima.cas.NULL";

pub const STRING: &str = "uima.cas.String";

/// Types a document must carry before tagging
pub const INPUT_TYPES: [&str; 2] = [TOKEN, SENTENCE];

/// Types this component adds
pub const OUTPUT_TYPES: [&str; 2] = [TIMEX3, TIME];

/// Whether a type carries the document language
pub fn is_document_annotation(type_name: &str) -> bool {
    type_name == DOCUMENT_ANNOTATION || type_name == DOCUMENT_META_DATA
}
