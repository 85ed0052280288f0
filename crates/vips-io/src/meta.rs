//! XML metadata carried in the extension block.
//!
//! The save path writes a document of this shape after the pixels:
//!
//! ```xml
//! <root xmlns="http://www.vips.ecs.soton.ac.uk/vips/7.12">
//!   <header>
//!     <field type="gchararray" name="Hist">line one
//! line two
//! </field>
//!   </header>
//!   <meta>
//!     <field type="gdouble" name="gamma">2.2</field>
//!   </meta>
//! </root>
//! ```
//!
//! [`MetaDocument::parse`] builds a small element tree with quick-xml and
//! checks the namespace. Lookups follow the document model the format was
//! designed against: element names compare by local name, only direct
//! children are scanned, and the first attribute with a given name wins.

use crate::{IoError, IoResult};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Namespace URI prefix every VIPS metadata document declares.
pub const NAMESPACE: &str = "http://www.vips.ecs.soton.ac.uk/vips";

/// Element holding builtin header fields.
pub const HEADER_BLOCK: &str = "header";
/// Element holding typed metadata fields.
pub const META_BLOCK: &str = "meta";
/// Element tag of each field inside a block.
pub const FIELD_TAG: &str = "field";
/// Name of the header field carrying history.
pub const HISTORY_FIELD: &str = "Hist";

// === Tree ===

/// Content of an element: child elements interleaved with text.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlContent {
    /// Nested element.
    Element(XmlNode),
    /// Character data, entities already resolved.
    Text(String),
}

/// One element of a parsed document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlNode {
    /// Local element name.
    pub name: String,
    /// Attributes in document order, keys as written (`xmlns:v`, `name`...).
    pub attrs: Vec<(String, String)>,
    /// Children in document order.
    pub content: Vec<XmlContent>,
}

impl XmlNode {
    /// Value of the first attribute called `key`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.content.iter().filter_map(|c| match c {
            XmlContent::Element(node) => Some(node),
            XmlContent::Text(_) => None,
        })
    }

    /// First direct child element called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.elements().find(|n| n.name == name)
    }

    /// Direct child elements called `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.elements().filter(move |n| n.name == name)
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for item in &self.content {
            match item {
                XmlContent::Text(t) => out.push_str(t),
                XmlContent::Element(node) => node.collect_text(out),
            }
        }
    }

    /// URI of the first namespace declared on this element.
    pub fn namespace_decl(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == "xmlns" || k.starts_with("xmlns:"))
            .map(|(_, v)| v.as_str())
    }
}

// === Document ===

/// A parsed, namespace-checked metadata document.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaDocument {
    root: XmlNode,
}

/// One `field` of the `meta` block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetaField<'a> {
    /// Field node.
    pub node: &'a XmlNode,
    /// `name` attribute.
    pub name: &'a str,
    /// `type` attribute.
    pub type_name: &'a str,
}

impl MetaDocument {
    /// Parses an extension block.
    ///
    /// Fails with [`IoError::MalformedMarkup`] if the bytes are not a single
    /// well-formed element tree, and with [`IoError::WrongNamespace`] if the
    /// root does not declare a namespace starting with [`NAMESPACE`]. The
    /// partially built tree is dropped on either path.
    pub fn parse(bytes: &[u8]) -> IoResult<Self> {
        let root = parse_tree(bytes)?;

        match root.namespace_decl() {
            Some(uri) if uri.starts_with(NAMESPACE) => {
                tracing::debug!("metadata namespace {}", uri);
                Ok(Self { root })
            }
            other => Err(IoError::WrongNamespace {
                found: other.map(str::to_string),
            }),
        }
    }

    /// Root element.
    pub fn root(&self) -> &XmlNode {
        &self.root
    }

    /// `field` elements of the `header` block, if the block exists.
    pub fn header_fields(&self) -> impl Iterator<Item = &XmlNode> {
        self.root
            .child(HEADER_BLOCK)
            .into_iter()
            .flat_map(|block| block.children_named(FIELD_TAG))
    }

    /// Text of every `Hist` header field, in document order.
    pub fn history_texts(&self) -> impl Iterator<Item = String> + '_ {
        self.header_fields()
            .filter(|f| f.attr("name") == Some(HISTORY_FIELD))
            .map(XmlNode::text_content)
    }

    /// `field` elements of the `meta` block carrying both `name` and `type`.
    pub fn meta_fields(&self) -> impl Iterator<Item = MetaField<'_>> {
        self.root
            .child(META_BLOCK)
            .into_iter()
            .flat_map(|block| block.children_named(FIELD_TAG))
            .filter_map(|node| {
                Some(MetaField {
                    node,
                    name: node.attr("name")?,
                    type_name: node.attr("type")?,
                })
            })
    }
}

/// Splits history text into lines. A trailing empty segment is dropped.
///
/// ```rust
/// use vips_io::meta::split_history;
///
/// assert_eq!(split_history("a\nb\nc"), ["a", "b", "c"]);
/// assert_eq!(split_history("a\nb\n"), ["a", "b"]);
/// assert!(split_history("").is_empty());
/// ```
pub fn split_history(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

// === Parser ===

fn malformed(msg: impl Into<String>) -> IoError {
    IoError::MalformedMarkup(msg.into())
}

fn start_node(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> IoResult<XmlNode> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| malformed(format!("bad attribute on <{}>: {}", name, e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| malformed(format!("bad value for {}: {}", key, e)))?
            .to_string();
        attrs.push((key, value));
    }
    Ok(XmlNode {
        name,
        attrs,
        content: Vec::new(),
    })
}

/// Hangs a finished element on its parent, or makes it the root.
fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> IoResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.content.push(XmlContent::Element(node));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(malformed(format!("second root element <{}>", node.name))),
    }
}

fn push_text(stack: &mut [XmlNode], text: &str) -> IoResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            if let Some(XmlContent::Text(prev)) = parent.content.last_mut() {
                prev.push_str(text);
            } else {
                parent.content.push(XmlContent::Text(text.to_string()));
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(malformed("text outside the root element")),
    }
}

fn parse_tree(bytes: &[u8]) -> IoResult<XmlNode> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let node = start_node(&e, &reader)?;
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                let node = start_node(&e, &reader)?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::End(_)) => {
                let node = stack.pop().ok_or_else(|| malformed("unbalanced end tag"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.decode().map_err(|e| malformed(e.to_string()))?;
                push_text(&mut stack, &text)?;
            }
            Ok(Event::CData(e)) => {
                let raw = e.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&raw))?;
            }
            Ok(Event::GeneralRef(e)) => {
                let entity = e.decode().map_err(|e| malformed(e.to_string()))?;
                let resolved = match e.resolve_char_ref() {
                    Ok(Some(ch)) => ch.to_string(),
                    Ok(None) => quick_xml::escape::resolve_predefined_entity(&entity)
                        .map(str::to_string)
                        .ok_or_else(|| malformed(format!("undefined entity &{};", entity)))?,
                    Err(e) => return Err(malformed(e.to_string())),
                };
                push_text(&mut stack, &resolved)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(malformed(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(malformed(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| malformed("document has no root element"))
}

// === Tests ===

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
<root xmlns="http://www.vips.ecs.soton.ac.uk/vips/7.12">
  <header>
    <field type="gchararray" name="Hist">im_copy a.v b.v
im_flip b.v c.v
</field>
  </header>
  <meta>
    <field type="gdouble" name="gamma">2.2</field>
    <field type="gint" name="count">3</field>
    <field name="untyped">x</field>
    <other type="gint" name="skipped">4</other>
  </meta>
</root>"#;

    #[test]
    fn test_parse_document() {
        let doc = MetaDocument::parse(DOC.as_bytes()).unwrap();
        assert_eq!(doc.root().name, "root");

        let history: Vec<String> = doc.history_texts().collect();
        assert_eq!(history.len(), 1);
        assert_eq!(split_history(&history[0]), ["im_copy a.v b.v", "im_flip b.v c.v"]);

        let fields: Vec<(&str, &str)> = doc.meta_fields().map(|f| (f.name, f.type_name)).collect();
        assert_eq!(fields, [("gamma", "gdouble"), ("count", "gint")]);
        assert_eq!(doc.meta_fields().next().unwrap().node.text_content(), "2.2");
    }

    #[test]
    fn test_meta_field_compares_by_node() {
        let doc = MetaDocument::parse(DOC.as_bytes()).unwrap();
        let meta = doc.root().child(META_BLOCK).unwrap();
        let gamma = meta.child(FIELD_TAG).unwrap();
        assert_eq!(
            doc.meta_fields().next(),
            Some(MetaField {
                node: gamma,
                name: "gamma",
                type_name: "gdouble",
            })
        );
        assert_ne!(doc.meta_fields().next(), doc.meta_fields().nth(1));
    }

    #[test]
    fn test_prefixed_namespace() {
        let doc = MetaDocument::parse(
            br#"<v:root xmlns:v="http://www.vips.ecs.soton.ac.uk/vips/8.0"><v:meta/></v:root>"#,
        )
        .unwrap();
        assert_eq!(doc.root().name, "root");
        assert!(doc.root().child("meta").is_some());
    }

    #[test]
    fn test_wrong_namespace() {
        match MetaDocument::parse(br#"<root xmlns="http://example.com/other"><meta/></root>"#) {
            Err(IoError::WrongNamespace { found }) => {
                assert_eq!(found.as_deref(), Some("http://example.com/other"));
            }
            other => panic!("expected WrongNamespace, got {:?}", other),
        }
        assert!(matches!(
            MetaDocument::parse(b"<root><meta/></root>"),
            Err(IoError::WrongNamespace { found: None })
        ));
    }

    #[test]
    fn test_malformed() {
        for bad in [
            &b"<root xmlns=\"http://www.vips.ecs.soton.ac.uk/vips\"><meta></root>"[..],
            b"<root xmlns=\"http://www.vips.ecs.soton.ac.uk/vips\">",
            b"",
            b"just text",
            b"<a xmlns=\"http://www.vips.ecs.soton.ac.uk/vips\"/><b/>",
        ] {
            assert!(
                matches!(MetaDocument::parse(bad), Err(IoError::MalformedMarkup(_))),
                "should reject {:?}",
                String::from_utf8_lossy(bad)
            );
        }
    }

    #[test]
    fn test_entities_and_cdata() {
        let doc = MetaDocument::parse(
            br#"<root xmlns="http://www.vips.ecs.soton.ac.uk/vips"><meta><field type="gchararray" name="s">a &amp; b &#65;<![CDATA[<raw>]]></field></meta></root>"#,
        )
        .unwrap();
        let field = doc.meta_fields().next().unwrap();
        assert_eq!(field.node.text_content(), "a & b A<raw>");
    }

    #[test]
    fn test_first_attribute_and_child_win() {
        let doc = MetaDocument::parse(
            br#"<root xmlns="http://www.vips.ecs.soton.ac.uk/vips"><meta><field name="first" type="gint">1</field></meta><meta><field name="second" type="gint">2</field></meta></root>"#,
        )
        .unwrap();
        let names: Vec<&str> = doc.meta_fields().map(|f| f.name).collect();
        assert_eq!(names, ["first"]);
    }

    #[test]
    fn test_split_history() {
        assert_eq!(split_history("a\nb\nc"), ["a", "b", "c"]);
        assert_eq!(split_history("a\n\nb\n"), ["a", "", "b"]);
        assert_eq!(split_history("single"), ["single"]);
        assert!(split_history("").is_empty());
    }
}
