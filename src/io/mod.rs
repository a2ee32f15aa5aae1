pub mod input;
pub mod output;
pub mod xml;

pub use input::{InputKind, for_each_xml_entry, is_xml_entry, open_xml_file};
pub use output::{JsonlWriter, ensure_output_dir, output_path_for};
pub use xml::{DocumentReader, XmlElement, XmlNode};
