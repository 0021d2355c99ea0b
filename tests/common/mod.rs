//! Common test utilities

use duui_heideltimex::cas::{AnnotationKind, Document};
use duui_heideltimex::config::ServerConfig;
use duui_heideltimex::xmi::{self, ShareData};

/// German narrative used across the server tests
pub const NARRATIVE: &str =
    "Am 19.12.1984 fand ein Event statt. Am nächsten Tag kamen alle wieder.";

/// Create a document with whitespace tokens and sentences ending at `.`, `!` or `?`
pub fn segmented_document(text: &str, language: &str) -> Document {
    let mut doc = Document::with_text(text, language);
    let mut offset = 0;
    let mut sentence_start = None;

    for word in text.split(' ') {
        let len = word.encode_utf16().count();
        if len > 0 {
            doc.add(offset, offset + len, AnnotationKind::Token).unwrap();
            let start = *sentence_start.get_or_insert(offset);
            if word.ends_with(['.', '!', '?']) {
                doc.add(start, offset + len, AnnotationKind::Sentence).unwrap();
                sentence_start = None;
            }
        }
        offset += len + 1;
    }

    if let Some(start) = sentence_start {
        doc.add(start, doc.len(), AnnotationKind::Sentence).unwrap();
    }
    doc
}

/// XMI body of a segmented document
pub fn xmi_request(text: &str, language: &str) -> Vec<u8> {
    xmi::encode(&segmented_document(text, language), &ShareData::default()).unwrap()
}

/// Listener config on an ephemeral loopback port
#[allow(dead_code)]
pub fn local_config() -> ServerConfig {
    ServerConfig::builder()
        .bind_address_str("127.0.0.1")
        .unwrap()
        .port(0)
        .enable_request_logging(false)
        .build()
        .unwrap()
}

/// DKPro-style document carrying a POS annotation this component does not model
#[allow(dead_code)]
pub const DKPRO_XMI: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xmi:XMI xmlns:pos="http:///de/tudarmstadt/ukp/dkpro/core/api/lexmorph/type/pos.ecore" xmlns:tcas="http:///uima/tcas.ecore" xmlns:xmi="http://www.omg.org/XMI" xmlns:cas="http:///uima/cas.ecore" xmlns:type4="http:///de/tudarmstadt/ukp/dkpro/core/api/segmentation/type.ecore" xmi:version="2.0">
  <cas:NULL xmi:id="0"/>
  <tcas:DocumentAnnotation xmi:id="2" sofa="1" begin="0" end="13" language="de"/>
  <type4:Sentence xmi:id="8" sofa="1" begin="0" end="13"/>
  <pos:POS_NOUN xmi:id="20" sofa="1" begin="0" end="2" PosValue="NOUN"/>
  <type4:Token xmi:id="14" sofa="1" begin="0" end="2" pos="20"/>
  <type4:Token xmi:id="26" sofa="1" begin="3" end="13"/>
  <cas:Sofa xmi:id="1" sofaNum="1" sofaID="_InitialView" mimeType="text" sofaString="Am 19.12.1984"/>
  <cas:View sofa="1" members="2 8 20 14 26"/>
</xmi:XMI>"#;
