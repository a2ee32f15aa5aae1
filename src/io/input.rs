use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{ConvertError, Result};

/// Kind of input file, decided from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A single BioC XML document
    Xml,
    /// A gzip-compressed tar archive of BioC XML files
    TarGz,
}

impl InputKind {
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            InputKind::TarGz
        } else {
            InputKind::Xml
        }
    }
}

/// Open a BioC XML file for streaming
pub fn open_xml_file(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    Ok(BufReader::new(file))
}

/// Whether an archive entry should be converted (case-insensitive `.xml` suffix)
pub fn is_xml_entry(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".xml")
}

/// Walk the entries of a `.tar.gz` archive in order and hand every XML
/// entry to `visit` as `(entry name, reader)`.
///
/// Entries are streamed straight out of the decompressor, never buffered
/// whole. Other entries are skipped. Returns the number of XML entries
/// visited.
pub fn for_each_xml_entry<F>(path: &Path, mut visit: F) -> Result<usize>
where
    F: FnMut(&str, &mut dyn BufRead) -> Result<()>,
{
    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    let mut visited = 0;
    let entries = archive.entries().map_err(|e| ConvertError::io(path, e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| ConvertError::io(path, e))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .map_err(|e| ConvertError::io(path, e))?
            .to_string_lossy()
            .into_owned();
        if !is_xml_entry(&name) {
            debug!("skipping archive entry {}", name);
            continue;
        }

        visit(&name, &mut BufReader::new(&mut entry))?;
        visited += 1;
    }

    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(InputKind::detect(Path::new("a/b.XML")), InputKind::Xml);
        assert_eq!(InputKind::detect(Path::new("BioCXML.tar.gz")), InputKind::TarGz);
        assert_eq!(InputKind::detect(Path::new("batch.TGZ")), InputKind::TarGz);
        assert_eq!(InputKind::detect(Path::new("plain.gz")), InputKind::Xml);
    }

    #[test]
    fn test_is_xml_entry() {
        assert!(is_xml_entry("output/BioCXML/0.xml"));
        assert!(is_xml_entry("0.XML"));
        assert!(!is_xml_entry("README.txt"));
        assert!(!is_xml_entry("xml"));
    }
}
