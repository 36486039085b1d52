//! A small namespace-agnostic element tree built on `quick-xml`.
//!
//! Only what the FB2 description header needs: local names, attributes, the
//! trimmed text of an element, and an accessor normalizing optional or
//! repeated children.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use quick_xml::{
    events::{BytesStart, Event},
    name::PrefixDeclaration,
    Reader,
};

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

/// The children of an element sharing one name, whatever their count
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<'a> {
    Absent,
    One(&'a Element),
    Many(Vec<&'a Element>),
}

impl<'a> Field<'a> {
    /// Flatten the field into its elements, in document order
    #[must_use]
    pub fn into_vec(self) -> Vec<&'a Element> {
        match self {
            Self::Absent => Vec::new(),
            Self::One(element) => vec![element],
            Self::Many(elements) => elements,
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl Element {
    /// Parses a whole document and returns its root element
    ///
    /// ## Errors
    ///
    /// Fails on any ill-formed markup, unknown entity, element left open at the
    /// end of the document, or content after the root element
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().check_end_names = true;

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    close(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    // Names were checked by the reader
                    if let Some(element) = stack.pop() {
                        close(&mut stack, &mut root, element)?;
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    match stack.last_mut() {
                        Some(parent) => parent.text.push_str(&text),
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(Error::XmlOutsideRoot(text.trim().to_owned()));
                        }
                    }
                }
                Event::CData(cdata) => {
                    let text = String::from_utf8_lossy(&cdata);
                    match stack.last_mut() {
                        Some(parent) => parent.text.push_str(&text),
                        None => return Err(Error::XmlOutsideRoot(text.into_owned())),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(Error::XmlUnclosedElement(open.name));
        }

        root.ok_or(Error::XmlNoRoot)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Self::default()
        };

        for attribute in start.attributes() {
            let attribute = attribute?;
            let value = attribute.unescape_value()?.into_owned();

            match attribute.key.as_namespace_binding() {
                Some(PrefixDeclaration::Default) => element.namespace = Some(value),
                Some(PrefixDeclaration::Named(_)) => {}
                None => element.attributes.push((
                    String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned(),
                    value,
                )),
            }
        }

        Ok(element)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default namespace declared on this very element, if any
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text and CDATA directly under this element, trimmed
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Field<'_> {
        let mut matches = self.children.iter().filter(|child| child.name == name);

        match (matches.next(), matches.next()) {
            (None, _) => Field::Absent,
            (Some(element), None) => Field::One(element),
            (Some(first), Some(second)) => {
                let mut elements = vec![first, second];
                elements.extend(matches);
                Field::Many(elements)
            }
        }
    }

    /// Lookup a child that may appear at most once
    ///
    /// ## Errors
    ///
    /// Fails if the child is repeated
    pub fn child(&self, name: &'static str) -> Result<Option<&Element>> {
        match self.field(name) {
            Field::Absent => Ok(None),
            Field::One(element) => Ok(Some(element)),
            Field::Many(_) => Err(Error::RepeatedElement(name)),
        }
    }

    /// ## Errors
    ///
    /// Fails if the child is absent or repeated
    pub fn required_child(&self, name: &'static str) -> Result<&Element> {
        self.child(name)?.ok_or(Error::MissingElement(name))
    }
}

fn close(
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
    mut element: Element,
) -> Result<()> {
    let trimmed = element.text.trim();
    if trimmed.len() != element.text.len() {
        element.text = trimmed.to_owned();
    }

    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::XmlOutsideRoot(format!("<{}>", element.name))),
    }

    Ok(())
}

/// Decode raw document bytes to text.
///
/// A byte order mark wins, then the `encoding` of the XML declaration,
/// then UTF-8.
///
/// ## Errors
///
/// Fails if the declared encoding is unknown or the bytes are not valid in it
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let encoding = detect_encoding(bytes)?;
    let (text, actual, had_errors) = encoding.decode(bytes);

    if had_errors {
        return Err(Error::Decoding(actual.name()));
    }

    Ok(text)
}

fn detect_encoding(bytes: &[u8]) -> Result<&'static Encoding> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Ok(encoding);
    }

    let mut reader = Reader::from_reader(bytes);
    let Ok(Event::Decl(decl)) = reader.read_event() else {
        return Ok(UTF_8);
    };

    match decl.encoding() {
        Some(label) => {
            let label = label?;
            Encoding::for_label(&label)
                .ok_or_else(|| Error::UnknownEncoding(String::from_utf8_lossy(&label).into_owned()))
        }
        None => Ok(UTF_8),
    }
}
