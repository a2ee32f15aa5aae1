use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::io::{XmlElement, XmlNode};
use crate::models::{Document, Location, Passage, RawAnnotation};

/// Extract each `<document>` element as it is read, in declaration order
pub fn documents<I>(nodes: I) -> impl Iterator<Item = Result<Document>>
where
    I: Iterator<Item = Result<XmlNode>>,
{
    nodes.map(|node| node.and_then(|node| extract_document(&node)))
}

/// Stage 0: extract a document and the raw annotations of its passages
///
/// Offsets are not checked against the text here. Any missing required
/// element, attribute or infon is a structural error, as is a location whose
/// passage-relative span does not fit in `i64`.
pub fn extract_document<'a, N: XmlElement<'a>>(node: N) -> Result<Document> {
    let id = required_text(node, "id", "document")?.to_string();

    let passages = node
        .children_named("passage")
        .map(|passage| extract_passage(passage, &id))
        .collect::<Result<Vec<_>>>()?;

    Ok(Document { id, passages })
}

/// Extract one passage: its absolute offset, optional text and annotations
pub fn extract_passage<'a, N: XmlElement<'a>>(node: N, doc_id: &str) -> Result<Passage> {
    let context = format!("document {}: passage", doc_id);

    let offset_text = required_text(node, "offset", &context)?;
    let offset = parse_integer(offset_text, &context)?;

    let text = node
        .child("text")
        .and_then(|t| t.text())
        .map(str::to_string);

    let annotations = node
        .children_named("annotation")
        .map(|annotation| extract_annotation(annotation, doc_id))
        .collect::<Result<Vec<_>>>()?;

    for annotation in &annotations {
        if annotation.checked_relative_span(offset).is_none() {
            return Err(ConvertError::LocationOverflow {
                context: format!("{}: annotation {}", context, annotation.id),
                offset: annotation.location.offset,
                length: annotation.location.length,
            });
        }
    }

    Ok(Passage {
        offset,
        text,
        annotations,
    })
}

/// Extract one annotation with its absolute location and literal text
pub fn extract_annotation<'a, N: XmlElement<'a>>(node: N, doc_id: &str) -> Result<RawAnnotation> {
    let id = node
        .attribute("id")
        .ok_or_else(|| ConvertError::MissingAttribute {
            context: format!("document {}: annotation", doc_id),
            attribute: "id",
        })?
        .to_string();
    let context = format!("document {}: annotation {}", doc_id, id);

    let resolved_id = infon(node, "identifier").map(str::to_string);
    let obj_type = infon(node, "type")
        .ok_or_else(|| ConvertError::MissingInfon {
            context: context.clone(),
            key: "type",
        })?
        .to_string();

    let mut locations = node.children_named("location");
    let location = locations
        .next()
        .ok_or_else(|| ConvertError::MissingElement {
            context: context.clone(),
            element: "location",
        })?;
    let extra_locations = locations.count();
    if extra_locations > 0 {
        debug!(
            "{}: ignoring {} additional location(s)",
            context, extra_locations
        );
    }

    let location = Location {
        offset: parse_integer(required_attribute(location, "offset", &context)?, &context)?,
        length: parse_integer(required_attribute(location, "length", &context)?, &context)?,
    };

    let text = node
        .child("text")
        .ok_or_else(|| ConvertError::MissingElement {
            context: context.clone(),
            element: "text",
        })?
        .text()
        .unwrap_or_default()
        .to_string();

    Ok(RawAnnotation {
        id,
        obj_type,
        resolved_id,
        location,
        text,
    })
}

/// Text of `<infon key="...">`, if present and non-empty
fn infon<'a, N: XmlElement<'a>>(node: N, key: &str) -> Option<&'a str> {
    node.child_with_attribute("infon", "key", key)
        .and_then(|infon| infon.text())
}

fn required_text<'a, N: XmlElement<'a>>(
    node: N,
    element: &'static str,
    context: &str,
) -> Result<&'a str> {
    node.child(element)
        .and_then(|child| child.text())
        .ok_or_else(|| ConvertError::MissingElement {
            context: context.to_string(),
            element,
        })
}

fn required_attribute<'a, N: XmlElement<'a>>(
    node: N,
    attribute: &'static str,
    context: &str,
) -> Result<&'a str> {
    node.attribute(attribute)
        .ok_or_else(|| ConvertError::MissingAttribute {
            context: context.to_string(),
            attribute,
        })
}

fn parse_integer(value: &str, context: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| ConvertError::InvalidNumber {
            context: context.to_string(),
            value: value.to_string(),
        })
}
