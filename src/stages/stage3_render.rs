use std::io::Write;

use tracing::debug;

use crate::error::Result;
use crate::io::JsonlWriter;
use crate::models::Document;

use super::{ReconcileConfig, ReconcileStats, assemble_record, reconcile_passage};

/// Execute Stage 3: reconcile and assemble every passage of `document` and
/// stream the resulting records to `writer`, one line per passage.
///
/// Returns the number of records written for this document.
pub fn render_document<W: Write>(
    document: &Document,
    config: &ReconcileConfig,
    writer: &mut JsonlWriter<W>,
    stats: &mut ReconcileStats,
) -> Result<usize> {
    let mut written = 0;

    for passage in &document.passages {
        let reconciled = reconcile_passage(&document.id, passage, config, stats);
        if let Some(record) = assemble_record(&document.id, passage, &reconciled)? {
            writer.write_record(&record)?;
            written += 1;
        }
    }

    debug!(
        "document {}: {} passages, {} records",
        document.id,
        document.passages.len(),
        written
    );

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, Passage, PubAnnotationRecord, RawAnnotation, Span};
    use crate::stages::ReconcilePolicy;

    fn document() -> Document {
        Document {
            id: "100".to_string(),
            passages: vec![
                Passage {
                    offset: 0,
                    text: Some("Title".to_string()),
                    annotations: vec![],
                },
                Passage {
                    offset: 100,
                    text: Some("EGFR mutation".to_string()),
                    annotations: vec![RawAnnotation {
                        id: "1".to_string(),
                        obj_type: "Gene".to_string(),
                        resolved_id: Some("1956".to_string()),
                        location: Location {
                            offset: 101,
                            length: 4,
                        },
                        text: "EGFR".to_string(),
                    }],
                },
            ],
        }
    }

    fn render(policy: ReconcilePolicy) -> (Vec<PubAnnotationRecord>, ReconcileStats) {
        let config = ReconcileConfig {
            policy,
            ..Default::default()
        };
        let mut stats = ReconcileStats::default();
        let mut writer = JsonlWriter::new(Vec::new());
        render_document(&document(), &config, &mut writer, &mut stats).unwrap();

        let output = String::from_utf8(writer.finish().unwrap()).unwrap();
        let records = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (records, stats)
    }

    #[test]
    fn test_render_fix() {
        let (records, stats) = render(ReconcilePolicy::Fix);

        // The title passage has no annotations and is dropped
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].denotations[0].span, Span::new(0, 4));
        assert_eq!(records[0].attributes.len(), 1);
        assert_eq!(stats.fixed, 1);
    }

    #[test]
    fn test_render_skip_drops_record() {
        let (records, stats) = render(ReconcilePolicy::Skip);

        assert!(records.is_empty());
        assert_eq!(stats.skipped, 1);
    }
}
