/// A BioC document: an identifier and its passages in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Document identifier (PMID for PubTator corpora)
    pub id: String,
    /// Passages in source order
    pub passages: Vec<Passage>,
}

/// A passage of a document with the annotations declared on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    /// Absolute character offset of this passage within the full document
    pub offset: i64,
    /// Passage text, absent for passages that carry none
    pub text: Option<String>,
    /// Annotations in source order
    pub annotations: Vec<RawAnnotation>,
}

/// Absolute character location of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: i64,
    pub length: i64,
}

/// An annotation exactly as declared in the XML, before any validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAnnotation {
    /// Annotation identifier, unique within the passage
    pub id: String,
    /// Semantic type (the `type` infon)
    pub obj_type: String,
    /// External resolved identifier (the `identifier` infon)
    pub resolved_id: Option<String>,
    /// Declared absolute location
    pub location: Location,
    /// Declared surface form
    pub text: String,
}

impl RawAnnotation {
    /// Passage-relative `(begin, end)` for a passage starting at `passage_offset`.
    ///
    /// Saturates at the `i64` bounds; see [`Self::checked_relative_span`].
    pub fn relative_span(&self, passage_offset: i64) -> (i64, i64) {
        let begin = self.location.offset.saturating_sub(passage_offset);
        (begin, begin.saturating_add(self.location.length))
    }

    /// Like [`Self::relative_span`], `None` when either end overflows
    pub fn checked_relative_span(&self, passage_offset: i64) -> Option<(i64, i64)> {
        let begin = self.location.offset.checked_sub(passage_offset)?;
        let end = begin.checked_add(self.location.length)?;
        Some((begin, end))
    }
}
