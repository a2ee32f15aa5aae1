pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use error::{ConvertError, Result};
pub use io::{
    DocumentReader, JsonlWriter, XmlElement, XmlNode, ensure_output_dir, output_path_for,
};
pub use models::{
    Attribute, Denotation, Document, Location, Passage, PubAnnotationRecord, RawAnnotation, Span,
};
pub use pipeline::{ConvertConfig, ConvertOutcome, analyze_path, convert_path, convert_reader};
pub use stages::{
    ReconcileConfig, ReconcilePolicy, ReconcileStats, assemble_record, reconcile_annotation,
    reconcile_passage, render_document,
};
