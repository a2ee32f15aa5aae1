use std::fmt;

use tracing::{debug, warn};

use crate::models::{Passage, RawAnnotation, Span};

/// How annotations whose declared span does not match the passage text are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// Accept every span as computed, without checking it
    #[default]
    Go,
    /// Keep mismatched spans and emit a warning for each
    Report,
    /// Drop mismatched annotations
    Skip,
    /// Try to shift mismatched spans back onto the literal text, report the rest
    Fix,
}

impl ReconcilePolicy {
    /// Whether spans are compared against the passage text at all
    pub fn checks_spans(self) -> bool {
        !matches!(self, ReconcilePolicy::Go)
    }
}

impl fmt::Display for ReconcilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcilePolicy::Go => "go",
            ReconcilePolicy::Report => "report",
            ReconcilePolicy::Skip => "skip",
            ReconcilePolicy::Fix => "fix",
        };
        f.write_str(name)
    }
}

/// Configuration for Stage 1 reconciliation
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Policy applied to mismatched annotations
    pub policy: ReconcilePolicy,
    /// Maximum number of characters searched backwards by the fix policy
    pub lookback: i64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            policy: ReconcilePolicy::Go,
            lookback: 5,
        }
    }
}

/// Annotation counters accumulated over one input file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Annotations seen
    pub total: usize,
    /// Annotations whose span did not match their literal text
    pub invalid: usize,
    /// Invalid annotations repaired by the fix policy
    pub fixed: usize,
    /// Invalid annotations dropped by the skip policy
    pub skipped: usize,
}

impl ReconcileStats {
    /// Invalid annotations as a percentage of all annotations
    pub fn invalid_percent(&self) -> Option<f64> {
        percent(self.invalid, self.total)
    }

    /// Fixed annotations as a percentage of invalid annotations
    pub fn fixed_percent(&self) -> Option<f64> {
        percent(self.fixed, self.invalid)
    }

    /// Add the counters of `other` into `self`
    pub fn merge(&mut self, other: &ReconcileStats) {
        self.total += other.total;
        self.invalid += other.invalid;
        self.fixed += other.fixed;
        self.skipped += other.skipped;
    }
}

fn percent(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64 * 100.0)
    }
}

fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(p) => format!("{:.2}%", p),
        None => "n/a".to_string(),
    }
}

impl fmt::Display for ReconcileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total annotations: {}, invalid: {} ({} of total), fixed: {} ({} of invalid), skipped: {}",
            self.total,
            self.invalid,
            format_percent(self.invalid_percent()),
            self.fixed,
            format_percent(self.fixed_percent()),
            self.skipped
        )
    }
}

/// An annotation that survived reconciliation, with its final span
#[derive(Debug, Clone, Copy)]
pub struct ReconciledAnnotation<'a> {
    pub annotation: &'a RawAnnotation,
    pub span: Span,
}

/// Execute Stage 1 for one passage: reconcile every annotation in source
/// order and keep the survivors.
pub fn reconcile_passage<'a>(
    doc_id: &str,
    passage: &'a Passage,
    config: &ReconcileConfig,
    stats: &mut ReconcileStats,
) -> Vec<ReconciledAnnotation<'a>> {
    passage
        .annotations
        .iter()
        .filter_map(|annotation| {
            reconcile_annotation(
                doc_id,
                passage.text.as_deref(),
                passage.offset,
                annotation,
                config,
                stats,
            )
            .map(|span| ReconciledAnnotation { annotation, span })
        })
        .collect()
}

/// Convert an annotation's absolute location into a passage-relative span and
/// apply the configured policy.
///
/// Returns `None` when the annotation is dropped.
pub fn reconcile_annotation(
    doc_id: &str,
    text: Option<&str>,
    passage_offset: i64,
    annotation: &RawAnnotation,
    config: &ReconcileConfig,
    stats: &mut ReconcileStats,
) -> Option<Span> {
    stats.total += 1;

    let (begin, end) = annotation.relative_span(passage_offset);
    let span = Span::new(begin, end);

    if !config.policy.checks_spans() || span_matches(text, span, &annotation.text) {
        return Some(span);
    }

    stats.invalid += 1;

    match config.policy {
        ReconcilePolicy::Go => Some(span),
        ReconcilePolicy::Report => {
            report_mismatch(doc_id, text, span, annotation);
            Some(span)
        }
        ReconcilePolicy::Skip => {
            stats.skipped += 1;
            debug!(
                "[{}:{}] skipped mismatched annotation ({}, {})",
                doc_id, annotation.id, span.begin, span.end
            );
            None
        }
        ReconcilePolicy::Fix => {
            let adjustment = text.and_then(|text| {
                find_adjustment(text, span, &annotation.text, config.lookback)
            });
            match adjustment {
                Some(delta) => {
                    let fixed = span.shifted(delta);
                    stats.fixed += 1;
                    debug!(
                        "[{}:{}] fixed span ({}, {}) -> ({}, {})",
                        doc_id, annotation.id, span.begin, span.end, fixed.begin, fixed.end
                    );
                    Some(fixed)
                }
                None => {
                    report_mismatch(doc_id, text, span, annotation);
                    Some(span)
                }
            }
        }
    }
}

fn report_mismatch(doc_id: &str, text: Option<&str>, span: Span, annotation: &RawAnnotation) {
    let actual = text
        .and_then(|text| char_slice(text, span.begin, span.end))
        .unwrap_or_default();
    warn!(
        "[{}:{}] text mismatch ({}, {}) : [{}] vs [{}]",
        doc_id, annotation.id, span.begin, span.end, actual, annotation.text
    );
}

/// Whether the passage text under `span` is exactly `literal`.
///
/// An undefined slice (no text, or a span starting outside it) only matches
/// an empty literal.
pub fn span_matches(text: Option<&str>, span: Span, literal: &str) -> bool {
    match text.and_then(|text| char_slice(text, span.begin, span.end)) {
        Some(actual) => actual == literal,
        None => literal.is_empty(),
    }
}

/// Search backwards from a mismatched span for the literal text.
///
/// Looks at `text[begin - w .. end - 1]` with `w = min(lookback, begin)` and
/// returns the shift that moves the span onto the rightmost occurrence of
/// `literal` in that window.
pub fn find_adjustment(text: &str, span: Span, literal: &str, lookback: i64) -> Option<i64> {
    let w = lookback.min(span.begin);
    if w <= 0 || literal.is_empty() {
        return None;
    }

    let window = char_slice(text, span.begin - w, span.end.saturating_sub(1))?;
    let byte_pos = window.rfind(literal)?;
    let r = window[..byte_pos].chars().count() as i64;

    Some(r - w)
}

/// Character-indexed slice `text[begin..end]`.
///
/// `None` when `begin` is negative or past the end of the text. An `end`
/// past the end is clamped, an `end` before `begin` gives the empty string.
pub fn char_slice(text: &str, begin: i64, end: i64) -> Option<&str> {
    let begin = usize::try_from(begin).ok()?;
    let start = byte_index(text, begin)?;
    let stop = match usize::try_from(end) {
        Ok(end) if end > begin => byte_index(text, end).unwrap_or(text.len()),
        _ => start,
    };
    Some(&text[start..stop])
}

/// Byte index of the `n`th character, or `text.len()` when `n` is the char count
fn byte_index(text: &str, n: usize) -> Option<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .nth(n)
}
