//! Projection of engine `Timex3` annotations onto the public `Time` type

use std::collections::HashMap;

use crate::cas::{AnnotationKind, Document, SpanError, Time};

/// Add one `Time` per `Timex3`, copying the span, `timexType` into `kind` and
/// `timexValue` into `normalized_value`
///
/// Runs in engine emission order. Existing `Time` annotations with the same
/// span and fields count against the `Timex3` annotations they match, so a
/// document ends up with exactly one `Time` per `Timex3` and projecting twice
/// adds nothing. Returns the number of added annotations.
pub fn project(doc: &mut Document) -> Result<usize, SpanError> {
    let mut present: HashMap<(usize, usize, Time), usize> = HashMap::new();
    for (annotation, time) in doc.times() {
        *present
            .entry((annotation.begin, annotation.end, time.clone()))
            .or_default() += 1;
    }

    let projected: Vec<(usize, usize, Time)> = doc
        .timexes()
        .map(|(annotation, timex)| {
            (
                annotation.begin,
                annotation.end,
                Time {
                    kind: timex.timex_type.clone(),
                    normalized_value: timex.timex_value.clone(),
                },
            )
        })
        .collect();

    let mut added = 0;
    for entry in projected {
        if let Some(count) = present.get_mut(&entry).filter(|count| **count > 0) {
            *count -= 1;
            continue;
        }
        let (begin, end, time) = entry;
        doc.add(begin, end, AnnotationKind::Time(time))?;
        added += 1;
    }

    tracing::debug!(times = added, "Projected time expressions");
    Ok(added)
}
