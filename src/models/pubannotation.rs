use serde::{Deserialize, Serialize};

/// Source database written into every record
pub const SOURCE_DB: &str = "PubMed";

/// Predicate linking a denotation to its resolved identifier
pub const RESOLVED_TO: &str = "resolved_to";

/// Passage-relative half-open character span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub begin: i64,
    pub end: i64,
}

impl Span {
    pub fn new(begin: i64, end: i64) -> Self {
        Self { begin, end }
    }

    /// Shift both ends by `delta` characters, saturating at the `i64` bounds
    pub fn shifted(self, delta: i64) -> Self {
        Self {
            begin: self.begin.saturating_add(delta),
            end: self.end.saturating_add(delta),
        }
    }
}

/// A typed span over the passage text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denotation {
    pub id: String,
    pub span: Span,
    pub obj: String,
}

/// Relation from a denotation to an external identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    pub subj: String,
    pub pred: String,
    pub obj: String,
}

impl Attribute {
    /// `resolved_to` attribute for the denotation `subj`
    pub fn resolved_to(subj: &str, obj: &str) -> Self {
        Self {
            id: format!("A{}", subj),
            subj: subj.to_string(),
            pred: RESOLVED_TO.to_string(),
            obj: obj.to_string(),
        }
    }
}

/// One PubAnnotation JSON Lines record, one per passage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubAnnotationRecord {
    pub sourcedb: String,
    pub sourceid: String,
    pub text: String,
    pub denotations: Vec<Denotation>,
    pub attributes: Vec<Attribute>,
}
