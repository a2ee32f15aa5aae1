use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use bioc2pubann::{
    ConvertConfig, ConvertError, PubAnnotationRecord, ReconcileConfig, ReconcilePolicy, Span,
    analyze_path, convert_path,
};

const CORPUS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE collection SYSTEM "BioC.dtd">
<collection>
  <source>PubTator</source>
  <date>2024-01-01</date>
  <key>BioC.key</key>
  <document>
    <id>100</id>
    <passage>
      <infon key="type">title</infon>
      <offset>0</offset>
      <text>Lung cancer genetics</text>
    </passage>
    <passage>
      <infon key="type">abstract</infon>
      <offset>100</offset>
      <text>EGFR mutation and KRAS</text>
      <annotation id="1">
        <infon key="identifier">1956</infon>
        <infon key="type">Gene</infon>
        <location offset="101" length="4"/>
        <text>EGFR</text>
      </annotation>
      <annotation id="2">
        <infon key="type">Gene</infon>
        <location offset="118" length="4"/>
        <text>KRAS</text>
      </annotation>
    </passage>
  </document>
  <document>
    <id>200</id>
    <passage>
      <offset>0</offset>
      <text>BRCA1 &amp; BRCA2</text>
      <annotation id="3">
        <infon key="identifier">672</infon>
        <infon key="type">Gene</infon>
        <location offset="0" length="5"/>
        <text>BRCA1</text>
      </annotation>
    </passage>
  </document>
</collection>"#;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn config(policy: ReconcilePolicy, output_dir: &Path) -> ConvertConfig {
    ConvertConfig {
        reconcile: ReconcileConfig {
            policy,
            ..Default::default()
        },
        output_dir: output_dir.to_path_buf(),
    }
}

fn read_records(path: &Path) -> Vec<PubAnnotationRecord> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_convert_xml_file_with_fix() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_file(tmp.path(), "corpus.XML", CORPUS);

    let outcome = convert_path(&input, &config(ReconcilePolicy::Fix, tmp.path())).unwrap();

    let output_path = outcome.output_path.unwrap();
    assert_eq!(output_path, tmp.path().join("corpus.jsonl"));
    assert_eq!(outcome.documents, 2);
    assert_eq!(outcome.records, 2);
    assert_eq!(outcome.stats.total, 3);
    assert_eq!(outcome.stats.invalid, 1);
    assert_eq!(outcome.stats.fixed, 1);

    let records = read_records(&output_path);
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.sourceid, "100");
    assert_eq!(first.denotations[0].span, Span::new(0, 4));
    assert_eq!(first.denotations[1].span, Span::new(18, 22));
    // Only the first annotation carries an identifier
    assert_eq!(first.attributes.len(), 1);
    assert_eq!(first.attributes[0].subj, "1");

    assert_eq!(records[1].text, "BRCA1 & BRCA2");
    assert_eq!(records[1].attributes[0].obj, "672");
}

#[test]
fn test_skip_policy_drops_annotation() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_file(tmp.path(), "corpus.xml", CORPUS);

    let outcome = convert_path(&input, &config(ReconcilePolicy::Skip, tmp.path())).unwrap();

    assert_eq!(outcome.stats.skipped, 1);
    let records = read_records(&outcome.output_path.unwrap());
    assert_eq!(records[0].denotations.len(), 1);
    assert_eq!(records[0].denotations[0].id, "2");
    assert!(records[0].attributes.is_empty());
}

#[test]
fn test_conversion_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_file(tmp.path(), "corpus.xml", CORPUS);
    let config = config(ReconcilePolicy::Report, tmp.path());

    let first = convert_path(&input, &config).unwrap();
    let first_bytes = std::fs::read(first.output_path.unwrap()).unwrap();
    let second = convert_path(&input, &config).unwrap();
    let second_bytes = std::fs::read(second.output_path.unwrap()).unwrap();

    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn test_no_qualifying_passages_gives_empty_file() {
    let tmp = tempfile::tempdir().unwrap();
    let xml = r#"<collection><document><id>1</id>
        <passage><offset>0</offset><text>No entities here</text></passage>
    </document></collection>"#;
    let input = write_file(tmp.path(), "empty.xml", xml);

    let outcome = convert_path(&input, &config(ReconcilePolicy::Go, tmp.path())).unwrap();

    assert_eq!(outcome.records, 0);
    let output = std::fs::read_to_string(outcome.output_path.unwrap()).unwrap();
    assert!(output.is_empty());
}

#[test]
fn test_annotations_without_text_are_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let xml = r#"<collection><document><id>55</id>
        <passage><offset>0</offset>
          <annotation id="1">
            <infon key="type">Gene</infon>
            <location offset="0" length="4"/>
            <text>EGFR</text>
          </annotation>
        </passage>
    </document></collection>"#;
    let input = write_file(tmp.path(), "notext.xml", xml);

    let err = convert_path(&input, &config(ReconcilePolicy::Go, tmp.path())).unwrap_err();
    assert!(matches!(err, ConvertError::PassageWithoutText { .. }));
}

#[test]
fn test_convert_tar_gz_archive() {
    let tmp = tempfile::tempdir().unwrap();
    let archive_path = tmp.path().join("BioCXML.tar.gz");

    {
        let file = File::create(&archive_path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, content) in [
            ("BioCXML/0.XML", CORPUS),
            ("BioCXML/README.txt", "not xml"),
            ("BioCXML/1.xml", CORPUS),
        ] {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_entry_type(tar::EntryType::Regular);
            header.set_cksum();
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    let out_dir = tmp.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();
    let outcome = convert_path(&archive_path, &config(ReconcilePolicy::Report, &out_dir)).unwrap();

    let output_path = outcome.output_path.unwrap();
    assert_eq!(output_path, out_dir.join("BioCXML.jsonl"));
    assert_eq!(outcome.documents, 4);
    assert_eq!(outcome.records, 4);
    assert_eq!(outcome.stats.total, 6);
    assert_eq!(outcome.stats.invalid, 2);
    assert_eq!(read_records(&output_path).len(), 4);
}

#[test]
fn test_analyze_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_file(tmp.path(), "corpus.xml", CORPUS);
    let config = ReconcileConfig {
        policy: ReconcilePolicy::Report,
        ..Default::default()
    };

    let outcome = analyze_path(&input, &config).unwrap();

    assert!(outcome.output_path.is_none());
    assert_eq!(outcome.stats.invalid, 1);
    let percent = outcome.stats.invalid_percent().unwrap();
    assert!((percent - 33.33).abs() < 0.01);
    assert!(!tmp.path().join("corpus.jsonl").exists());
}

#[test]
fn test_truncated_input_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_file(tmp.path(), "cut.xml", &CORPUS[..CORPUS.len() / 2]);

    let err = convert_path(&input, &config(ReconcilePolicy::Go, tmp.path())).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Truncated { .. } | ConvertError::Xml { .. }
    ));
}
