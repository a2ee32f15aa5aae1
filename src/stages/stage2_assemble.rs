use crate::error::{ConvertError, Result};
use crate::models::{Attribute, Denotation, Passage, PubAnnotationRecord, SOURCE_DB};

use super::ReconciledAnnotation;

/// Execute Stage 2: turn a passage's surviving annotations into a record
///
/// Returns `Ok(None)` when nothing survived, e.g. section titles without
/// annotations. Denotations and attributes keep source order.
pub fn assemble_record(
    doc_id: &str,
    passage: &Passage,
    reconciled: &[ReconciledAnnotation<'_>],
) -> Result<Option<PubAnnotationRecord>> {
    if reconciled.is_empty() {
        return Ok(None);
    }

    let text = passage
        .text
        .clone()
        .ok_or_else(|| ConvertError::PassageWithoutText {
            doc_id: doc_id.to_string(),
        })?;

    let denotations = reconciled
        .iter()
        .map(|r| Denotation {
            id: r.annotation.id.clone(),
            span: r.span,
            obj: r.annotation.obj_type.clone(),
        })
        .collect();

    let attributes = reconciled
        .iter()
        .filter_map(|r| {
            r.annotation
                .resolved_id
                .as_deref()
                .map(|obj| Attribute::resolved_to(&r.annotation.id, obj))
        })
        .collect();

    Ok(Some(PubAnnotationRecord {
        sourcedb: SOURCE_DB.to_string(),
        sourceid: doc_id.to_string(),
        text,
        denotations,
        attributes,
    }))
}
