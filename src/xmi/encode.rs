//! [`Document`] to XMI conversion

use crate::cas::types;
use crate::cas::{Annotation, AnnotationKind, Document};

use super::element::{self, XmiElement, XmiNode};
use super::error::{CodecError, CodecResult};
use super::namespace::{Namespaces, XMI_NAMESPACE, XMI_PREFIX};
use super::{Entry, ShareData, INITIAL_VIEW};

/// Hands out `xmi:id`s above everything seen while decoding
struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Serialize `doc`, restoring everything `share` carried over from decoding
pub fn encode(doc: &Document, share: &ShareData) -> CodecResult<Vec<u8>> {
    let mut namespaces = share.namespaces.clone();
    namespaces.ensure(XMI_PREFIX, XMI_NAMESPACE);

    let mut ids = IdAllocator {
        next: share
            .max_id
            .checked_add(1)
            .ok_or_else(|| CodecError::Malformed("xmi:id space exhausted".to_string()))?,
    };

    let sofa_id = share
        .sofa
        .as_ref()
        .and_then(|sofa| sofa.id)
        .unwrap_or_else(|| ids.allocate());

    let mut null = XmiElement::new(namespaces.qualified_name(types::NULL));
    null.set_attribute("xmi:id", "0");

    let mut body = vec![null];
    let mut members = Vec::with_capacity(doc.annotations().len() + 1);
    let mut written = vec![false; doc.annotations().len()];
    let mut document_annotation_written = false;

    for entry in &share.layout {
        match entry {
            Entry::Known(annotation_id) => {
                if let Some(annotation) = doc.get(*annotation_id) {
                    let (id, element) =
                        annotation_element(annotation, share, &mut namespaces, &mut ids, sofa_id);
                    members.push(id);
                    body.push(element);
                    written[annotation_id.index()] = true;
                }
            }
            Entry::DocumentAnnotation => {
                let (id, element) = document_annotation(doc, share, &mut namespaces, &mut ids, sofa_id);
                members.push(id);
                body.push(element);
                document_annotation_written = true;
            }
            Entry::Foreign(element) => body.push(element.clone()),
        }
    }

    if !document_annotation_written {
        let (id, element) = document_annotation(doc, share, &mut namespaces, &mut ids, sofa_id);
        members.push(id);
        body.push(element);
    }

    for annotation in doc.annotations() {
        if !written[annotation.id().index()] {
            let (id, element) =
                annotation_element(annotation, share, &mut namespaces, &mut ids, sofa_id);
            members.push(id);
            body.push(element);
        }
    }

    body.push(sofa(doc, share, &mut namespaces, sofa_id));

    members.extend(&share.view_foreign_members);
    members.sort_unstable();
    body.push(view(share, &mut namespaces, sofa_id, &members));

    let mut root = XmiElement::new(format!("{XMI_PREFIX}:XMI"));
    for (prefix, uri) in namespaces.declarations() {
        root.set_attribute(&format!("xmlns:{prefix}"), uri);
    }
    for (key, value) in &share.root_attributes {
        root.set_attribute(key, value.as_str());
    }
    if root.attribute("xmi:version").is_none() {
        root.set_attribute("xmi:version", "2.0");
    }
    root.children = body.into_iter().map(XmiNode::Element).collect();

    tracing::debug!(
        annotations = doc.annotations().len(),
        members = members.len(),
        "Encoding XMI document"
    );

    Ok(element::write_document(&root)?)
}

fn annotation_element(
    annotation: &Annotation,
    share: &ShareData,
    namespaces: &mut Namespaces,
    ids: &mut IdAllocator,
    sofa_id: u64,
) -> (u64, XmiElement) {
    let (id, mut element) = match share.known.get(&annotation.id()) {
        Some(known) => (
            known.id.unwrap_or_else(|| ids.allocate()),
            known.element.clone(),
        ),
        None => (
            ids.allocate(),
            XmiElement::new(namespaces.qualified_name(annotation.kind.type_name())),
        ),
    };

    element.set_attribute("xmi:id", id.to_string());
    element.set_attribute("sofa", sofa_id.to_string());
    element.set_attribute("begin", annotation.begin.to_string());
    element.set_attribute("end", annotation.end.to_string());

    match &annotation.kind {
        AnnotationKind::Timex3(timex) => {
            element.set_attribute("timexId", timex.timex_id.as_str());
            element.set_attribute("timexType", timex.timex_type.as_str());
            element.set_attribute("timexValue", timex.timex_value.as_str());
            element.set_optional_attribute("timexQuant", timex.timex_quant.as_deref());
            element.set_optional_attribute("timexFreq", timex.timex_freq.as_deref());
            element.set_optional_attribute("timexMod", timex.timex_mod.as_deref());
            element.set_optional_attribute("foundByRule", timex.found_by_rule.as_deref());
        }
        AnnotationKind::Time(time) => {
            element.set_attribute("value", time.kind.as_str());
            element.set_attribute("identifier", time.normalized_value.as_str());
        }
        AnnotationKind::Token | AnnotationKind::Sentence => {}
    }

    (id, element)
}

fn document_annotation(
    doc: &Document,
    share: &ShareData,
    namespaces: &mut Namespaces,
    ids: &mut IdAllocator,
    sofa_id: u64,
) -> (u64, XmiElement) {
    let (id, mut element) = match &share.document_annotation {
        Some(known) => (
            known.id.unwrap_or_else(|| ids.allocate()),
            known.element.clone(),
        ),
        None => (
            ids.allocate(),
            XmiElement::new(namespaces.qualified_name(types::DOCUMENT_ANNOTATION)),
        ),
    };

    element.set_attribute("xmi:id", id.to_string());
    element.set_attribute("sofa", sofa_id.to_string());
    element.set_attribute("begin", "0");
    element.set_attribute("end", doc.len().to_string());
    element.set_attribute("language", doc.language());

    (id, element)
}

fn sofa(doc: &Document, share: &ShareData, namespaces: &mut Namespaces, sofa_id: u64) -> XmiElement {
    let mut element = match &share.sofa {
        Some(known) => known.element.clone(),
        None => {
            let mut element = XmiElement::new(namespaces.qualified_name(types::SOFA));
            element.set_attribute("xmi:id", sofa_id.to_string());
            element.set_attribute("sofaNum", "1");
            element.set_attribute("sofaID", INITIAL_VIEW);
            element.set_attribute("mimeType", "text");
            element
        }
    };
    element.set_attribute("xmi:id", sofa_id.to_string());
    element.set_attribute("sofaString", doc.text());
    element
}

fn view(share: &ShareData, namespaces: &mut Namespaces, sofa_id: u64, members: &[u64]) -> XmiElement {
    let mut element = share
        .view
        .clone()
        .unwrap_or_else(|| XmiElement::new(namespaces.qualified_name(types::VIEW)));
    element.set_attribute("sofa", sofa_id.to_string());

    let members = members
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    element.set_optional_attribute("members", (!members.is_empty()).then_some(members.as_str()));
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::{Time, Timex3};
    use crate::xmi::decode_into;

    fn tagged_document() -> Document {
        let mut doc = Document::with_text("Am 19.12.1984 war es kalt.", "de");
        doc.add(0, 26, AnnotationKind::Sentence).unwrap();
        for (begin, end) in [(0, 2), (3, 13), (14, 17), (18, 20), (21, 26)] {
            doc.add(begin, end, AnnotationKind::Token).unwrap();
        }
        doc.add(
            0,
            13,
            AnnotationKind::Timex3(Timex3 {
                timex_id: "t1".into(),
                timex_type: "DATE".into(),
                timex_value: "1984-12-19".into(),
                found_by_rule: Some("date_numeric".into()),
                ..Default::default()
            }),
        )
        .unwrap();
        doc.add(
            0,
            13,
            AnnotationKind::Time(Time {
                kind: "DATE".into(),
                normalized_value: "1984-12-19".into(),
            }),
        )
        .unwrap();
        doc
    }

    #[test]
    fn test_encode_fresh_document() {
        let doc = tagged_document();
        let xml = String::from_utf8(encode(&doc, &ShareData::default()).unwrap()).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(r#"xmlns:heideltime="http:///de/unihd/dbs/uima/types/heideltime.ecore""#));
        assert!(xml.contains(r#"<type2:Time "#));
        assert!(xml.contains(r#"value="DATE" identifier="1984-12-19""#));
        assert!(xml.contains(r#"sofaID="_InitialView""#));
        assert!(xml.contains(r#"language="de""#));
    }

    #[test]
    fn test_round_trip_fresh_document() {
        let doc = tagged_document();
        let bytes = encode(&doc, &ShareData::default()).unwrap();

        let mut decoded = Document::new();
        decode_into(&mut decoded, &bytes).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_new_annotations_get_fresh_ids() {
        let xmi = r#"<xmi:XMI xmlns:xmi="http://www.omg.org/XMI" xmlns:cas="http:///uima/cas.ecore" xmlns:type4="http:///de/tudarmstadt/ukp/dkpro/core/api/segmentation/type.ecore" xmi:version="2.0"><cas:NULL xmi:id="0"/><type4:Token xmi:id="40" sofa="7" begin="0" end="4"/><cas:Sofa xmi:id="7" sofaNum="1" sofaID="_InitialView" mimeType="text" sofaString="1985"/><cas:View sofa="7" members="40"/></xmi:XMI>"#;

        let mut doc = Document::new();
        let share = decode_into(&mut doc, xmi.as_bytes()).unwrap();
        doc.add(0, 4, AnnotationKind::Sentence).unwrap();

        let xml = String::from_utf8(encode(&doc, &share).unwrap()).unwrap();
        assert!(xml.contains(r#"<type4:Token xmi:id="40" sofa="7" begin="0" end="4"/>"#));
        assert!(xml.contains(r#"<type4:Sentence xmi:id="42" sofa="7" begin="0" end="4"/>"#));
        assert!(xml.contains(r#"members="40 41 42""#));
    }
}
