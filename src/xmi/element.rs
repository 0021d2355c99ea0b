//! Generic XML element tree used by the XMI reader and writer

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::error::{CodecError, CodecResult};

/// An XML element with its attributes in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmiElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmiNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmiNode {
    Element(XmiElement),
    Text(String),
}

impl XmiElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn set_optional_attribute(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => self.set_attribute(key, value),
            None => self.attributes.retain(|(k, _)| k != key),
        }
    }

    /// Parse a numeric attribute
    pub fn numeric_attribute<T: std::str::FromStr>(&self, key: &str) -> CodecResult<Option<T>> {
        self.attribute(key)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| CodecError::invalid_attribute(&self.name, key, value))
            })
            .transpose()
    }

    /// Element children, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &XmiElement> {
        self.children.iter().filter_map(|child| match child {
            XmiNode::Element(element) => Some(element),
            XmiNode::Text(_) => None,
        })
    }

    fn from_start(start: &BytesStart<'_>) -> CodecResult<Self> {
        let name = utf8(start.name().as_ref())?;
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute
                .map_err(|e| CodecError::Malformed(format!("invalid attribute on <{name}>: {e}")))?;
            let key = utf8(attribute.key.as_ref())?;
            let value = attribute
                .unescape_value()
                .map_err(|e| CodecError::Malformed(format!("invalid value for '{key}': {e}")))?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> std::io::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            let escaped = escape_attribute(value);
            start.push_attribute((key.as_bytes(), escaped.as_bytes()));
        }

        if self.children.is_empty() {
            return writer.write_event(Event::Empty(start));
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            match child {
                XmiNode::Element(element) => element.write_to(writer)?,
                XmiNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))
    }
}

fn utf8(bytes: &[u8]) -> CodecResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| CodecError::Malformed(format!("invalid UTF-8 in name: {e}")))
}

/// Escape an attribute value, including whitespace that XML parsers would
/// otherwise normalize to spaces
pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Parse a complete XML document into its root element
pub fn parse(bytes: &[u8]) -> CodecResult<XmiElement> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmiElement> = Vec::new();
    let mut root: Option<XmiElement> = None;

    loop {
        let event = reader.read_event().map_err(|source| CodecError::Xml {
            position: reader.buffer_position() as u64,
            source,
        })?;

        match event {
            Event::Start(start) => stack.push(XmiElement::from_start(&start)?),
            Event::Empty(start) => {
                let element = XmiElement::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CodecError::Malformed("unbalanced closing tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|source| CodecError::Xml {
                    position: reader.buffer_position() as u64,
                    source,
                })?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| CodecError::Malformed(format!("invalid UTF-8 in CDATA: {e}")))?;
                push_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(CodecError::Truncated { open: stack.len() });
    }
    root.ok_or(CodecError::MissingRoot)
}

fn attach(
    stack: &mut [XmiElement],
    root: &mut Option<XmiElement>,
    element: XmiElement,
) -> CodecResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmiNode::Element(element));
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(CodecError::Malformed("more than one root element".into()));
    }
    Ok(())
}

fn push_text(stack: &mut [XmiElement], text: &str) -> CodecResult<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmiNode::Text(text.to_string()));
            Ok(())
        }
        None => Err(CodecError::Malformed("text outside of the root element".into())),
    }
}

/// Write a document with XML declaration and the given root
pub fn write_document(root: &XmiElement) -> std::io::Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    root.write_to(&mut writer)?;
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let xml = br#"<?xml version="1.0"?>
            <root a="1"><child b="x &amp; y"/><list><item>one</item></list></root>"#;
        let root = parse(xml).unwrap();

        assert_eq!(root.name, "root");
        assert_eq!(root.attribute("a"), Some("1"));
        let children: Vec<_> = root.elements().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attribute("b"), Some("x & y"));
        assert_eq!(
            children[1].elements().next().unwrap().children,
            vec![XmiNode::Text("one".into())]
        );
    }

    #[test]
    fn test_truncated_document() {
        let err = parse(b"<root><child>").unwrap_err();
        assert!(matches!(
            err,
            CodecError::Truncated { open: 2 } | CodecError::Xml { .. }
        ));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(parse(b"").unwrap_err(), CodecError::MissingRoot));
        assert!(matches!(parse(b"   ").unwrap_err(), CodecError::MissingRoot));
    }

    #[test]
    fn test_mismatched_end_tag() {
        assert!(matches!(
            parse(b"<root><a></b></root>").unwrap_err(),
            CodecError::Xml { .. }
        ));
    }

    #[test]
    fn test_escape_attribute_preserves_line_breaks() {
        let mut element = XmiElement::new("sofa");
        element.set_attribute("text", "a\n<b> & \"c\"");
        let bytes = write_document(&element).unwrap();
        let xml = String::from_utf8(bytes.clone()).unwrap();
        assert!(xml.contains("a&#10;&lt;b&gt; &amp; &quot;c&quot;"));

        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.attribute("text"), Some("a\n<b> & \"c\""));
    }

    #[test]
    fn test_numeric_attribute() {
        let mut element = XmiElement::new("type:Token");
        element.set_attribute("begin", "12");
        element.set_attribute("end", "x");

        assert_eq!(element.numeric_attribute::<usize>("begin").unwrap(), Some(12));
        assert_eq!(element.numeric_attribute::<usize>("missing").unwrap(), None);
        assert!(element.numeric_attribute::<usize>("end").is_err());
    }
}
