//! Minimal XML tree used by the definition parsers and for structural
//! comparison of generated documents.
//!
//! Parsing is done with [`quick_xml`]'s pull reader. Character data is kept
//! as sent; only whitespace-only text between child elements is dropped.
//! Comments, processing instructions and declarations are ignored.

// Local crates
use crate::error::{ModularInputError, Result};

// External crates
use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use std::io::Write;
use tracing::instrument;

/// One parsed XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Element name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Character data directly inside this element, untrimmed.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parse a complete document and return its root element.
    ///
    /// Fails if the document is not well-formed, has no root element, or has
    /// more than one root element.
    #[instrument(
        name = "modular_input_xml::parse",
        target = "helpers::xml::XmlNode",
        skip_all,
        level = "trace"
    )]
    pub fn parse(document: &str) -> Result<XmlNode> {
        let mut reader = Reader::from_str(document);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                ModularInputError::parse(format!(
                    "{e} at position {}",
                    reader.error_position()
                ))
            })?;

            match event {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let node = Self::from_start(&start)?;
                    Self::attach(node, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let mut node = stack
                        .pop()
                        .ok_or_else(|| ModularInputError::parse("unexpected closing tag"))?;
                    if !node.children.is_empty() && node.text.trim().is_empty() {
                        node.text.clear();
                    }
                    Self::attach(node, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(ModularInputError::parse)?;
                    Self::append_text(&mut stack, &text)?;
                }
                Event::CData(data) => {
                    let text = String::from_utf8(data.into_inner().into_owned())
                        .map_err(ModularInputError::parse)?;
                    Self::append_text(&mut stack, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ModularInputError::parse(format!(
                "unclosed element <{}>",
                open.name
            )));
        }

        root.ok_or_else(|| ModularInputError::parse("document has no root element"))
    }

    /// First direct child with the given element name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given element name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn from_start(start: &BytesStart<'_>) -> Result<XmlNode> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(ModularInputError::parse)?
            .to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(ModularInputError::parse)?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(ModularInputError::parse)?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(ModularInputError::parse)?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(XmlNode {
            name,
            attributes,
            ..Default::default()
        })
    }

    fn attach(
        node: XmlNode,
        stack: &mut [XmlNode],
        root: &mut Option<XmlNode>,
    ) -> Result<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None if root.is_none() => *root = Some(node),
            None => {
                return Err(ModularInputError::parse(format!(
                    "multiple root elements, found <{}> after the root",
                    node.name
                )));
            }
        }
        Ok(())
    }

    fn append_text(stack: &mut [XmlNode], text: &str) -> Result<()> {
        match stack.last_mut() {
            Some(current) => {
                current.text.push_str(text);
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(ModularInputError::parse("text content outside the root element")),
        }
    }
}

/// Structural equality of two element trees.
///
/// Names, attribute sets, trimmed text and the ordered list of children must
/// all match. Attribute order and insignificant whitespace are ignored.
pub fn structurally_equal(expected: &XmlNode, actual: &XmlNode) -> bool {
    if expected.name != actual.name || expected.text.trim() != actual.text.trim() {
        return false;
    }

    let mut expected_attrs = expected.attributes.clone();
    let mut actual_attrs = actual.attributes.clone();
    expected_attrs.sort();
    actual_attrs.sort();
    if expected_attrs != actual_attrs {
        return false;
    }

    expected.children.len() == actual.children.len()
        && expected
            .children
            .iter()
            .zip(&actual.children)
            .all(|(e, a)| structurally_equal(e, a))
}

/// Write one event through a quick-xml writer, mapping failures to
/// [`ModularInputError::Write`].
pub(crate) fn write_event<'a, W: Write>(
    writer: &mut Writer<W>,
    event: impl Into<Event<'a>>,
) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ModularInputError::Write(std::io::Error::other(e.to_string())))
}

/// Write `<name>text</name>`.
pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<()> {
    write_event(writer, Event::Start(BytesStart::new(name)))?;
    write_event(writer, Event::Text(BytesText::new(text)))?;
    write_event(writer, Event::End(BytesEnd::new(name)))
}
