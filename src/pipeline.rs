use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::io::{
    DocumentReader, InputKind, JsonlWriter, for_each_xml_entry, open_xml_file, output_path_for,
};
use crate::stages::{ReconcileConfig, ReconcileStats, documents, render_document};

/// Configuration for converting input files
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Reconciliation settings
    pub reconcile: ReconcileConfig,
    /// Directory receiving one `.jsonl` file per input
    pub output_dir: PathBuf,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            reconcile: ReconcileConfig::default(),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Result of converting one input file
#[derive(Debug, Clone, Default)]
pub struct ConvertOutcome {
    /// Output file, `None` when nothing was written (analysis runs)
    pub output_path: Option<PathBuf>,
    /// Documents read from the input
    pub documents: usize,
    /// Records written, one per passage with surviving annotations
    pub records: usize,
    /// Annotation counters for this input
    pub stats: ReconcileStats,
}

/// Convert one input file (plain XML or `.tar.gz` archive) into a JSON Lines
/// file in the configured output directory.
///
/// The output directory must already exist. Counters start from zero for
/// every input.
pub fn convert_path(input: &Path, config: &ConvertConfig) -> Result<ConvertOutcome> {
    let output_path = output_path_for(input, &config.output_dir);
    let mut writer = JsonlWriter::create(&output_path)?;

    let mut outcome = process_input(input, &config.reconcile, &mut writer)?;
    writer.finish()?;

    outcome.output_path = Some(output_path);
    Ok(outcome)
}

/// Run the conversion of one input without writing any output.
pub fn analyze_path(input: &Path, config: &ReconcileConfig) -> Result<ConvertOutcome> {
    let mut writer = JsonlWriter::new(std::io::sink());
    process_input(input, config, &mut writer)
}

fn process_input<W: Write>(
    input: &Path,
    config: &ReconcileConfig,
    writer: &mut JsonlWriter<W>,
) -> Result<ConvertOutcome> {
    let mut outcome = ConvertOutcome::default();

    match InputKind::detect(input) {
        InputKind::Xml => {
            let reader = open_xml_file(input)?;
            convert_reader(reader, &input.display().to_string(), config, writer, &mut outcome)?;
        }
        InputKind::TarGz => {
            let entries = for_each_xml_entry(input, |name, reader| {
                info!("processing {}:{}", input.display(), name);
                convert_reader(reader, name, config, writer, &mut outcome)
            })?;
            if entries == 0 {
                warn!("no XML entries found in {}", input.display());
            }
        }
    }

    Ok(outcome)
}

/// Convert the documents of one BioC XML stream, accumulating into `outcome`.
///
/// Documents are read, rendered and dropped one at a time.
pub fn convert_reader<R: BufRead, W: Write>(
    reader: R,
    origin: &str,
    config: &ReconcileConfig,
    writer: &mut JsonlWriter<W>,
    outcome: &mut ConvertOutcome,
) -> Result<()> {
    for document in documents(DocumentReader::new(reader, origin)) {
        let document = document?;
        outcome.documents += 1;
        outcome.records += render_document(&document, config, writer, &mut outcome.stats)?;
    }

    Ok(())
}
