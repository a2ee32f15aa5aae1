//! Error types for the converter.
//!
//! Every variant here is a structural failure: the input cannot be converted
//! and processing stops. Offset/text mismatches are not errors; they are
//! resolved by the reconciliation policy.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Filesystem or archive I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The input is not well-formed XML.
    #[error("malformed XML in {origin}: {source}")]
    Xml {
        origin: String,
        source: quick_xml::Error,
    },

    /// The input ended inside an open `<document>` element.
    #[error("unexpected end of input in {origin}: <{element}> is not closed")]
    Truncated { origin: String, element: String },

    /// A required child element is missing.
    #[error("{context}: missing required element <{element}>")]
    MissingElement {
        context: String,
        element: &'static str,
    },

    /// A required attribute is missing.
    #[error("{context}: missing required attribute `{attribute}`")]
    MissingAttribute {
        context: String,
        attribute: &'static str,
    },

    /// An annotation lacks a required `<infon key="...">`.
    #[error("{context}: missing required infon `{key}`")]
    MissingInfon { context: String, key: &'static str },

    /// An offset or length could not be read as an integer.
    #[error("{context}: `{value}` is not a valid integer")]
    InvalidNumber { context: String, value: String },

    /// An annotation location does not fit in the passage coordinate range.
    #[error("{context}: location offset {offset} with length {length} is out of range")]
    LocationOverflow {
        context: String,
        offset: i64,
        length: i64,
    },

    /// A passage kept annotations but carries no text to index into.
    #[error("invalid passage in document {doc_id}: annotations exist but text does not")]
    PassageWithoutText { doc_id: String },

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
