use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::warn;

use crate::error::{ConvertError, Result};

/// Minimal read-only view of an XML element tree.
///
/// Extraction only needs these lookups, so it works against this trait
/// instead of a concrete parser. Elements are cheap handles into a tree that
/// lives for `'a`.
pub trait XmlElement<'a>: Copy + 'a {
    /// Value of the attribute `name`
    fn attribute(self, name: &str) -> Option<&'a str>;

    /// Child elements named `tag`, in document order
    fn children_named<'t>(self, tag: &'t str) -> impl Iterator<Item = Self> + 't
    where
        'a: 't;

    /// Text content of this element, `None` when empty
    fn text(self) -> Option<&'a str>;

    /// First child element named `tag`
    fn child(self, tag: &str) -> Option<Self> {
        self.children_named(tag).next()
    }

    /// First child element named `tag` whose attribute `name` equals `value`,
    /// e.g. `infon[@key=type]`
    fn child_with_attribute(self, tag: &str, name: &str, value: &str) -> Option<Self> {
        self.children_named(tag)
            .find(|node| node.attribute(name) == Some(value))
    }
}

/// An owned element subtree: one `<document>` and everything below it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Local tag name
    pub name: String,
    /// Attributes in source order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Child elements in source order
    pub children: Vec<XmlNode>,
    /// Direct text content (text and CDATA), unescaped
    pub text: String,
}

impl<'a> XmlElement<'a> for &'a XmlNode {
    fn attribute(self, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn children_named<'t>(self, tag: &'t str) -> impl Iterator<Item = Self> + 't
    where
        'a: 't,
    {
        self.children.iter().filter(move |child| child.name == tag)
    }

    fn text(self) -> Option<&'a str> {
        if self.text.is_empty() {
            None
        } else {
            Some(&self.text)
        }
    }
}

/// Streams the `collection/document` elements of a BioC file.
///
/// Only the subtree of the current `<document>` is held in memory; everything
/// else (`<source>`, `<date>`, `<key>`, the DOCTYPE) is read past.
pub struct DocumentReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    origin: String,
    /// Open elements outside the current document, root included
    depth: usize,
    finished: bool,
}

impl<R: BufRead> DocumentReader<R> {
    pub fn new(input: R, origin: &str) -> Self {
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::new(),
            origin: origin.to_string(),
            depth: 0,
            finished: false,
        }
    }

    fn next_document(&mut self) -> Result<Option<XmlNode>> {
        // Elements of the document being built, outermost first
        let mut open: Vec<XmlNode> = Vec::new();

        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|source| xml_error(&self.origin, source))?;

            match event {
                Event::Start(start) => {
                    let node = element(&start, &self.origin)?;
                    if !open.is_empty() || (self.depth == 1 && node.name == "document") {
                        open.push(node);
                    } else if self.depth == 0 && node.name != "collection" {
                        warn!(
                            "{}: root element is <{}>, expected <collection>",
                            self.origin, node.name
                        );
                        return Ok(None);
                    } else {
                        self.depth += 1;
                    }
                }
                Event::Empty(start) => {
                    let node = element(&start, &self.origin)?;
                    if let Some(parent) = open.last_mut() {
                        parent.children.push(node);
                    } else if self.depth == 1 && node.name == "document" {
                        return Ok(Some(node));
                    } else if self.depth == 0 {
                        if node.name != "collection" {
                            warn!(
                                "{}: root element is <{}>, expected <collection>",
                                self.origin, node.name
                            );
                        }
                        return Ok(None);
                    }
                }
                Event::End(_) => match open.pop() {
                    Some(node) => match open.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => return Ok(Some(node)),
                    },
                    None => self.depth = self.depth.saturating_sub(1),
                },
                Event::Text(text) => {
                    if let Some(node) = open.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|source| xml_error(&self.origin, source))?;
                        node.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(node) = open.last_mut() {
                        node.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => {
                    return match open.into_iter().next() {
                        Some(node) => Err(ConvertError::Truncated {
                            origin: self.origin.clone(),
                            element: node.name,
                        }),
                        None => Ok(None),
                    };
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for DocumentReader<R> {
    type Item = Result<XmlNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_document() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Owned node for a start tag, without children yet
fn element(start: &BytesStart<'_>, origin: &str) -> Result<XmlNode> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|source| xml_error(origin, source.into()))?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|source| xml_error(origin, source))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(XmlNode {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn xml_error(origin: &str, source: quick_xml::Error) -> ConvertError {
    ConvertError::Xml {
        origin: origin.to_string(),
        source,
    }
}
