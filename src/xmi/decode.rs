//! XMI to [`Document`] conversion

use std::collections::HashSet;

use crate::cas::types::{self, is_document_annotation};
use crate::cas::{AnnotationKind, Document, Time, Timex3, UNSPECIFIED_LANGUAGE};

use super::element::{self, XmiElement, XmiNode};
use super::error::{CodecError, CodecResult};
use super::namespace::Namespaces;
use super::{Entry, KnownElement, ShareData, INITIAL_VIEW};

/// Decode XMI into a freshly reset `doc`
pub fn decode_into(doc: &mut Document, bytes: &[u8]) -> CodecResult<ShareData> {
    doc.reset();

    let root = element::parse(bytes)?;
    if root.name.rsplit(':').next() != Some("XMI") {
        return Err(CodecError::UnexpectedRoot(root.name));
    }

    let namespaces = Namespaces::from_attributes(&root.attributes);
    let root_attributes = root
        .attributes
        .iter()
        .filter(|(key, _)| !key.starts_with("xmlns:"))
        .cloned()
        .collect();

    let mut share = ShareData {
        namespaces,
        root_attributes,
        ..Default::default()
    };

    let typed = classify(&mut share, root.children)?;

    let sofa_index = typed.iter().position(|(type_name, element)| {
        type_name.as_deref() == Some(types::SOFA) && element.attribute("sofaID") == Some(INITIAL_VIEW)
    });
    let mut sofa_id = None;
    if let Some(index) = sofa_index {
        let sofa = &typed[index].1;
        sofa_id = sofa.numeric_attribute::<u64>("xmi:id")?;
        doc.set_text(sofa.attribute("sofaString").unwrap_or_default());
    }

    let mut members = Vec::new();
    for (index, (type_name, element)) in typed.into_iter().enumerate() {
        if Some(index) == sofa_index {
            share.sofa = Some(KnownElement {
                id: sofa_id,
                element,
            });
            continue;
        }

        match type_name.as_deref() {
            Some(types::NULL) => continue,
            Some(types::VIEW) if sofa_id.is_some() && sofa_reference(&element)? == sofa_id => {
                if share.view.is_some() {
                    return Err(CodecError::Malformed(
                        "more than one cas:View for the initial sofa".to_string(),
                    ));
                }
                members = parse_members(&element)?;
                share.view = Some(element);
                continue;
            }
            Some(type_name) if sofa_id.is_some() && sofa_reference(&element)? == sofa_id => {
                if is_document_annotation(type_name) && share.document_annotation.is_none() {
                    doc.set_language(element.attribute("language").unwrap_or(UNSPECIFIED_LANGUAGE));
                    share.document_annotation = Some(KnownElement {
                        id: element.numeric_attribute("xmi:id")?,
                        element,
                    });
                    share.layout.push(Entry::DocumentAnnotation);
                    continue;
                }

                if let Some(kind) = known_kind(type_name, &element) {
                    let begin = element.numeric_attribute("begin")?.unwrap_or(0);
                    let end = element.numeric_attribute("end")?.unwrap_or(0);
                    let annotation = doc.add(begin, end, kind)?;
                    share.known.insert(
                        annotation,
                        KnownElement {
                            id: element.numeric_attribute("xmi:id")?,
                            element,
                        },
                    );
                    share.layout.push(Entry::Known(annotation));
                    continue;
                }
            }
            _ => {}
        }

        share.layout.push(Entry::Foreign(element));
    }

    let owned: HashSet<u64> = share
        .known
        .values()
        .chain(share.document_annotation.as_ref())
        .filter_map(|known| known.id)
        .collect();
    share.view_foreign_members = members
        .into_iter()
        .filter(|member| !owned.contains(member))
        .collect();

    tracing::debug!(
        text_len = doc.len(),
        annotations = doc.annotations().len(),
        foreign = share.foreign_count(),
        "Decoded XMI document"
    );

    Ok(share)
}

/// Largest `xmi:id` a CAS can hold, ids are Java `int`s
const MAX_XMI_ID: u64 = i32::MAX as u64;

/// Resolve element types and record `xmi:id`s
fn classify(
    share: &mut ShareData,
    children: Vec<XmiNode>,
) -> CodecResult<Vec<(Option<String>, XmiElement)>> {
    let mut seen = HashSet::new();
    let mut typed = Vec::with_capacity(children.len());

    for child in children {
        let XmiNode::Element(element) = child else {
            continue;
        };

        if let Some(id) = element.numeric_attribute::<u64>("xmi:id")? {
            if id > MAX_XMI_ID {
                return Err(CodecError::invalid_attribute(
                    &element.name,
                    "xmi:id",
                    id.to_string(),
                ));
            }
            if !seen.insert(id) {
                return Err(CodecError::DuplicateId(id));
            }
            share.max_id = share.max_id.max(id);
        }

        let type_name = share.namespaces.resolve_type(&element.name)?;
        typed.push((type_name, element));
    }

    Ok(typed)
}

fn sofa_reference(element: &XmiElement) -> CodecResult<Option<u64>> {
    element.numeric_attribute("sofa")
}

fn parse_members(view: &XmiElement) -> CodecResult<Vec<u64>> {
    let Some(members) = view.attribute("members") else {
        return Ok(Vec::new());
    };
    members
        .split_whitespace()
        .map(|member| {
            member
                .parse()
                .map_err(|_| CodecError::invalid_attribute(&view.name, "members", member))
        })
        .collect()
}

fn known_kind(type_name: &str, element: &XmiElement) -> Option<AnnotationKind> {
    let text = |key: &str| element.attribute(key).unwrap_or_default().to_string();
    let optional = |key: &str| element.attribute(key).map(str::to_string);

    match type_name {
        types::TOKEN => Some(AnnotationKind::Token),
        types::SENTENCE => Some(AnnotationKind::Sentence),
        types::TIMEX3 => Some(AnnotationKind::Timex3(Timex3 {
            timex_id: text("timexId"),
            timex_type: text("timexType"),
            timex_value: text("timexValue"),
            timex_quant: optional("timexQuant"),
            timex_freq: optional("timexFreq"),
            timex_mod: optional("timexMod"),
            found_by_rule: optional("foundByRule"),
        })),
        types::TIME => Some(AnnotationKind::Time(Time {
            kind: text("value"),
            normalized_value: text("identifier"),
        })),
        _ => None,
    }
}
