//! XMI codec properties and pass-through of foreign annotations

mod common;

use duui_heideltimex::cas::AnnotationKind;
use duui_heideltimex::engine::{EngineConfig, RuleTagger};
use duui_heideltimex::error::{ErrorCategory, ErrorClass};
use duui_heideltimex::server::Processor;
use duui_heideltimex::xmi::{self, ShareData};
use proptest::prelude::*;

use common::{segmented_document, xmi_request, DKPRO_XMI, NARRATIVE};

fn processor() -> Processor {
    Processor::new(Box::new(RuleTagger::new(EngineConfig::default()).unwrap()))
}

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

/// Words mixing markup characters, umlauts and characters outside the BMP
fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9äöüß&<>\"'.𝄞😀]{1,12}( [a-zA-Z0-9äöüß&<>\"'.𝄞😀]{1,12}){0,15}")
        .unwrap()
}

proptest! {
    #[test]
    fn fresh_document_survives_round_trip(text in text_strategy()) {
        let doc = segmented_document(&text, "de");
        let bytes = xmi::encode(&doc, &ShareData::default()).unwrap();
        let (decoded, _) = xmi::decode(&bytes).unwrap();
        prop_assert_eq!(decoded, doc);
    }

    #[test]
    fn processed_spans_stay_inside_text(text in text_strategy()) {
        let mut processor = processor();
        let response = processor.process(&xmi_request(&text, "de")).unwrap();
        let (doc, _) = xmi::decode(&response).unwrap();

        for annotation in doc.annotations() {
            prop_assert!(annotation.begin <= annotation.end);
            prop_assert!(annotation.end <= doc.len());
            prop_assert!(doc.covered_text(annotation).is_some());
        }
        prop_assert_eq!(doc.timexes().count(), doc.times().count());
    }
}

#[test]
fn test_foreign_annotations_pass_through() {
    let mut processor = processor();
    let response = processor.process(DKPRO_XMI.as_bytes()).unwrap();
    let raw = String::from_utf8(response.clone()).unwrap();

    let (doc, share) = xmi::decode(&response).unwrap();
    assert_eq!(doc.text(), "Am 19.12.1984");
    assert_eq!(doc.tokens().count(), 2);

    let foreign: Vec<_> = share.foreign_elements().collect();
    assert_eq!(foreign.len(), 1);
    assert_eq!(foreign[0].name, "pos:POS_NOUN");
    assert_eq!(foreign[0].attribute("PosValue"), Some("NOUN"));
    assert_eq!(foreign[0].attribute("xmi:id"), Some("20"));

    // unknown features of known types survive as well
    assert!(raw.contains(r#"pos="20""#));
    assert!(raw.contains("xmlns:pos=\"http:///de/tudarmstadt/ukp/dkpro/core/api/lexmorph/type/pos.ecore\""));

    // new annotations are numbered above the original ids
    let (timex, _) = doc.timexes().next().unwrap();
    let (time, _) = doc.times().next().unwrap();
    assert!(share.xmi_id(timex.id()).unwrap() > 26);
    assert!(share.xmi_id(time.id()).unwrap() > 26);
    assert_ne!(share.xmi_id(timex.id()), share.xmi_id(time.id()));
}

#[test]
fn test_out_of_range_id_is_client_error() {
    let body = DKPRO_XMI.replace(r#"xmi:id="20""#, r#"xmi:id="18446744073709551615""#);

    let mut processor = processor();
    let err = processor.process(body.as_bytes()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::ClientInput);
    assert_eq!(err.status_code(), 422);

    // the processor keeps serving afterwards
    assert!(processor.process(DKPRO_XMI.as_bytes()).is_ok());
}

#[test]
fn test_reprocessing_is_stable() {
    let mut processor = processor();
    let first = processor.process(&xmi_request(NARRATIVE, "de")).unwrap();
    let second = processor.process(&first).unwrap();

    let (once, _) = xmi::decode(&first).unwrap();
    let (twice, _) = xmi::decode(&second).unwrap();
    assert_eq!(once.timexes().count(), 2);
    assert_eq!(twice.timexes().count(), 2);
    assert_eq!(twice.times().count(), 2);
    assert_eq!(once, twice);
}

#[test]
fn test_existing_output_is_kept() {
    let mut doc = segmented_document("Im Jahr 1985 war alles anders.", "de");
    doc.add(
        0,
        2,
        AnnotationKind::Time(duui_heideltimex::cas::Time {
            kind: "DATE".into(),
            normalized_value: "manual".into(),
        }),
    )
    .unwrap();
    let body = xmi::encode(&doc, &ShareData::default()).unwrap();

    let response = processor().process(&body).unwrap();
    let (processed, _) = xmi::decode(&response).unwrap();

    let values: Vec<_> = processed
        .times()
        .map(|(_, time)| time.normalized_value.as_str())
        .collect();
    assert_eq!(values, vec!["manual", "1985"]);
}
