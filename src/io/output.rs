use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::models::PubAnnotationRecord;

/// Streaming JSON Lines writer: one compact record per line
pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
    records_written: usize,
}

impl JsonlWriter<File> {
    /// Create (or truncate) the output file at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| ConvertError::io(path, e))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
            records_written: 0,
        }
    }

    /// Serialize `record` and terminate the line
    pub fn write_record(&mut self, record: &PubAnnotationRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n").map_err(io_error)?;
        self.records_written += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flush buffered output and return the inner writer
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| io_error(e.into_error()))
    }
}

fn io_error(source: std::io::Error) -> ConvertError {
    ConvertError::io("<output>", source)
}

/// Output path for `input` inside `output_dir`: the file name with its
/// extension replaced by `jsonl`.
///
/// Archives lose the whole `.tar.gz` / `.tgz` suffix.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let lower = file_name.to_ascii_lowercase();
    let stem = if lower.ends_with(".tar.gz") {
        &file_name[..file_name.len() - ".tar.gz".len()]
    } else if lower.ends_with(".tgz") {
        &file_name[..file_name.len() - ".tgz".len()]
    } else {
        match file_name.rfind('.') {
            Some(dot) if dot > 0 => &file_name[..dot],
            _ => file_name.as_str(),
        }
    };

    output_dir.join(format!("{}.jsonl", stem))
}

/// Make sure the output directory exists, returning whether it was created
pub fn ensure_output_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(dir).map_err(|e| ConvertError::io(dir, e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Denotation, Span};

    #[test]
    fn test_output_path_for() {
        let out = Path::new("output");
        assert_eq!(
            output_path_for(Path::new("data/BioCXML.0.XML"), out),
            PathBuf::from("output/BioCXML.0.jsonl")
        );
        assert_eq!(
            output_path_for(Path::new("corpus.xml"), out),
            PathBuf::from("output/corpus.jsonl")
        );
        assert_eq!(
            output_path_for(Path::new("/tmp/BioCXML.tar.gz"), out),
            PathBuf::from("output/BioCXML.jsonl")
        );
        assert_eq!(
            output_path_for(Path::new("batch.TGZ"), out),
            PathBuf::from("output/batch.jsonl")
        );
        assert_eq!(
            output_path_for(Path::new("noext"), out),
            PathBuf::from("output/noext.jsonl")
        );
    }

    #[test]
    fn test_write_records() {
        let record = PubAnnotationRecord {
            sourcedb: "PubMed".to_string(),
            sourceid: "1".to_string(),
            text: "EGFR".to_string(),
            denotations: vec![Denotation {
                id: "1".to_string(),
                span: Span::new(0, 4),
                obj: "Gene".to_string(),
            }],
            attributes: vec![],
        };

        let mut writer = JsonlWriter::new(Vec::new());
        writer.write_record(&record).unwrap();
        writer.write_record(&record).unwrap();
        assert_eq!(writer.records_written(), 2);

        let bytes = writer.finish().unwrap();
        let output = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(output.ends_with('\n'));

        let parsed: PubAnnotationRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_ensure_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");
        assert!(ensure_output_dir(&dir).unwrap());
        assert!(!ensure_output_dir(&dir).unwrap());
        assert!(dir.is_dir());
    }
}
