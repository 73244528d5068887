use eyre::{bail, eyre, Result, WrapErr};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::str;

/// A node of the document tree.
///
/// Only element names, text content and child elements are kept. Attributes,
/// comments and processing instructions are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Local name of the element, without namespace prefix.
    pub name: String,
    /// Concatenated text and CDATA content, if any.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Creates an empty element named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), text: None, children: Vec::new() }
    }

    /// Parses `xml` and returns its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        loop {
            match reader.read_event().wrap_err("malformed XML")? {
                Event::Start(start) => stack.push(Self::open(&start)?),
                Event::Empty(start) => {
                    let element = Self::open(&start)?;
                    if let Some(root) = Self::close(&mut stack, element) {
                        return Ok(root);
                    }
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| eyre!("unbalanced closing tag"))?;
                    if let Some(root) = Self::close(&mut stack, element) {
                        return Ok(root);
                    }
                }
                Event::Text(text) => {
                    if let Some(element) = stack.last_mut() {
                        element.push_text(&text.unescape().wrap_err("malformed XML text")?);
                    }
                }
                Event::CData(data) => {
                    if let Some(element) = stack.last_mut() {
                        let data = data.into_inner();
                        element.push_text(str::from_utf8(&data).wrap_err("malformed CDATA")?);
                    }
                }
                Event::Eof => bail!("document has no root element or is truncated"),
                _ => {}
            }
        }
    }

    /// Returns the first direct child named `tag`.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == tag)
    }

    /// Returns an iterator over direct children named `tag`.
    pub fn children<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == tag)
    }

    /// Returns all descendants named `tag` in document order, excluding `self`.
    ///
    /// A matching element's own descendants are searched too.
    pub fn descendants<'a>(&'a self, tag: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        let mut stack = self.children.iter().rev().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            if node.name == tag {
                found.push(node);
            }
            stack.extend(node.children.iter().rev());
        }
        found
    }

    /// Returns the text content of the element.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = start.local_name();
        let name = str::from_utf8(name.as_ref()).wrap_err("malformed element name")?;
        Ok(Self::new(name))
    }

    /// Trims the accumulated text once, so text split by comments or child
    /// elements keeps its inner whitespace.
    fn close(stack: &mut Vec<Element>, mut element: Element) -> Option<Element> {
        element.text = element.text.take().and_then(|text| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        });
        match stack.last_mut() {
            Some(parent) => {
                parent.children.push(element);
                None
            }
            None => Some(element),
        }
    }

    fn push_text(&mut self, text: &str) {
        self.text.get_or_insert_with(String::new).push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree() {
        let root = Element::parse(
            "<?xml version=\"1.0\"?>\n<a><!-- c --><b>1</b><c><b>2</b></c><d/></a>",
        )
        .unwrap();
        assert_eq!(root.name, "a");
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.child("b").and_then(Element::text), Some("1"));
        assert_eq!(root.child("d").and_then(Element::text), None);
        assert_eq!(root.children("b").count(), 1);
        let texts = root.descendants("b").into_iter().filter_map(Element::text).collect::<Vec<_>>();
        assert_eq!(texts, ["1", "2"]);
    }

    #[test]
    fn keeps_cdata_and_unescapes_text() {
        let root = Element::parse("<a><b>x &amp; y</b><c><![CDATA[<raw>]]></c></a>").unwrap();
        assert_eq!(root.child("b").and_then(Element::text), Some("x & y"));
        assert_eq!(root.child("c").and_then(Element::text), Some("<raw>"));
    }

    #[test]
    fn keeps_whitespace_around_comments() {
        let root = Element::parse("<device><name>  A <!--x--> B  </name></device>").unwrap();
        assert_eq!(root.child("name").and_then(Element::text), Some("A  B"));
    }

    #[test]
    fn keeps_whitespace_around_child_elements() {
        let root =
            Element::parse("<device><description>foo <b>bar</b> baz</description></device>")
                .unwrap();
        let description = root.child("description").unwrap();
        assert_eq!(description.text(), Some("foo  baz"));
        assert_eq!(description.child("b").and_then(Element::text), Some("bar"));
    }

    #[test]
    fn whitespace_only_text_is_none() {
        let root = Element::parse("<a>\n  <b>  \n </b>\n</a>").unwrap();
        assert_eq!(root.text(), None);
        assert_eq!(root.child("b").and_then(Element::text), None);
    }

    #[test]
    fn strips_namespace_prefix() {
        let root = Element::parse("<svd:device xmlns:svd=\"urn:x\"><svd:name>N</svd:name></svd:device>")
            .unwrap();
        assert_eq!(root.name, "device");
        assert_eq!(root.child("name").and_then(Element::text), Some("N"));
    }

    #[test]
    fn rejects_truncated_document() {
        assert!(Element::parse("<a><b>1</b>").is_err());
        assert!(Element::parse("").is_err());
    }
}
