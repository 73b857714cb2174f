//! Loose XML tree for the BBC playlist, media selector and RSS documents.
//!
//! Element and attribute names are lowercased so lookups are
//! case-insensitive (`authString` is read as `authstring`), mismatched end
//! tags are tolerated, and a document that stops parsing halfway keeps
//! whatever was built up to that point.

use quick_xml::{events::Event, reader::Reader};

use crate::error::{CatalogueError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn parse(text: &str) -> Document {
        let mut reader = Reader::from_str(text);
        {
            let config = reader.config_mut();
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
        }

        // stack[0] is a nameless synthetic root
        let mut stack: Vec<Element> = vec![Element::default()];

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    stack.push(Element::open(&e));
                }
                Ok(Event::Empty(e)) => {
                    let el = Element::open(&e);
                    push_child(&mut stack, Node::Element(el));
                }
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                    // Ignore stray end tags; otherwise close everything up to the match.
                    if let Some(pos) = stack.iter().skip(1).rposition(|el| el.name == name) {
                        close_to(&mut stack, pos + 1);
                    }
                }
                Ok(Event::Text(t)) => {
                    push_text(&mut stack, &decode_entities(&String::from_utf8_lossy(&t)));
                }
                Ok(Event::CData(t)) => {
                    push_text(&mut stack, &String::from_utf8_lossy(&t));
                }
                Ok(Event::GeneralRef(r)) => {
                    let raw = format!("&{};", String::from_utf8_lossy(&r));
                    push_text(&mut stack, &decode_entities(&raw));
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        "XML error at byte {}: {e}; keeping partial tree",
                        reader.buffer_position()
                    );
                    break;
                }
            }
        }

        close_to(&mut stack, 1);
        let root = stack.pop().unwrap_or_default();
        Document { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn find(&self, tag: Option<&str>, attrs: &[(&str, &str)]) -> Option<&Element> {
        self.root.find(tag, attrs)
    }

    pub fn find_all(&self, tag: Option<&str>, attrs: &[(&str, &str)]) -> Vec<&Element> {
        self.root.find_all(tag, attrs)
    }
}

fn push_child(stack: &mut [Element], node: Node) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        // Merge runs split by entity references.
        if let Some(Node::Text(prev)) = top.children.last_mut() {
            prev.push_str(text);
        } else {
            top.children.push(Node::Text(text.to_string()));
        }
    }
}

/// Pop every element at index `depth` and above, attaching each to its parent.
fn close_to(stack: &mut Vec<Element>, depth: usize) {
    while stack.len() > depth.max(1) {
        if let Some(el) = stack.pop() {
            push_child(stack, Node::Element(el));
        }
    }
}

impl Element {
    fn open(start: &quick_xml::events::BytesStart<'_>) -> Element {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
        let attrs = start
            .html_attributes()
            .with_checks(false)
            .flatten()
            .map(|a| {
                let key = String::from_utf8_lossy(a.key.as_ref()).to_ascii_lowercase();
                let value = decode_entities(&String::from_utf8_lossy(&a.value));
                (key, value)
            })
            .collect();
        Element {
            name,
            attrs,
            children: Vec::new(),
        }
    }

    /// Attribute value by case-insensitive name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn required_attr(&self, name: &str) -> Result<&str> {
        self.attr(name).ok_or_else(|| {
            CatalogueError::parse(format!("<{}> is missing attribute `{name}`", self.name))
        })
    }

    /// Concatenated descendant text, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out.trim().to_string()
    }

    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack = Vec::new();
        push_elements_rev(&self.children, &mut stack);
        Descendants { stack }
    }

    pub fn find(&self, tag: Option<&str>, attrs: &[(&str, &str)]) -> Option<&Element> {
        let tag = tag.map(str::to_ascii_lowercase);
        self.descendants()
            .find(|el| el.matches(tag.as_deref(), attrs))
    }

    pub fn find_all(&self, tag: Option<&str>, attrs: &[(&str, &str)]) -> Vec<&Element> {
        let tag = tag.map(str::to_ascii_lowercase);
        self.descendants()
            .filter(|el| el.matches(tag.as_deref(), attrs))
            .collect()
    }

    /// First direct-or-nested child with the given tag name.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.find(Some(tag), &[])
    }

    fn matches(&self, tag: Option<&str>, attrs: &[(&str, &str)]) -> bool {
        tag.is_none_or(|t| self.name == t)
            && attrs
                .iter()
                .all(|(k, v)| self.attr(k).is_some_and(|actual| actual == *v))
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
        }
    }
}

fn push_elements_rev<'a>(children: &'a [Node], stack: &mut Vec<&'a Element>) {
    for child in children.iter().rev() {
        if let Node::Element(e) = child {
            stack.push(e);
        }
    }
}

/// Pre-order (document order) walk over nested elements.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let el = self.stack.pop()?;
        push_elements_rev(&el.children, &mut self.stack);
        Some(el)
    }
}

/// Decode the predefined XML entities plus numeric character references.
/// Unknown or malformed references are left as written.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_and_attribute_names_are_case_insensitive() {
        let doc = Document::parse(
            r#"<MediaSelection><Media Service="svc"><Connection Supplier="akamai" authString="a=1&amp;b=2"/></Media></MediaSelection>"#,
        );
        let media = doc.find(Some("media"), &[("service", "svc")]).unwrap();
        let conn = media.find(None, &[("supplier", "akamai")]).unwrap();
        assert_eq!(conn.name, "connection");
        assert_eq!(conn.attr("authstring"), Some("a=1&b=2"));
        assert_eq!(conn.attr("AUTHSTRING"), Some("a=1&b=2"));
    }

    #[test]
    fn find_all_walks_in_document_order() {
        let doc = Document::parse(
            r#"<playlist><item kind="ident" identifier="x"/><item kind="programme" identifier="first"><item kind="programme" identifier="nested"/></item><item kind="programme" identifier="last"/></playlist>"#,
        );
        let ids: Vec<_> = doc
            .find_all(Some("item"), &[("kind", "programme")])
            .iter()
            .filter_map(|el| el.attr("identifier"))
            .collect();
        assert_eq!(ids, ["first", "nested", "last"]);
    }

    #[test]
    fn tolerates_mismatched_and_unclosed_tags() {
        let doc = Document::parse(r#"<rss><channel><item><title>One</bogus></title></item><item><title>Two</title>"#);
        let titles: Vec<_> = doc.find_all(Some("title"), &[]).iter().map(|t| t.text()).collect();
        assert_eq!(titles, ["One", "Two"]);
    }

    #[test]
    fn text_keeps_spaces_around_entities() {
        let doc = Document::parse("<item><title>Kermode &amp; Mayo</title></item>");
        assert_eq!(doc.find(Some("title"), &[]).unwrap().text(), "Kermode & Mayo");
    }

    #[test]
    fn cdata_text_is_kept_verbatim() {
        let doc = Document::parse("<item><title><![CDATA[Mark & Simon <3]]></title></item>");
        assert_eq!(doc.find(Some("title"), &[]).unwrap().text(), "Mark & Simon <3");
    }

    #[test]
    fn required_attr_names_the_element() {
        let doc = Document::parse(r#"<item kind="programme"/>"#);
        let err = doc
            .find(Some("item"), &[])
            .unwrap()
            .required_attr("identifier")
            .unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert!(err.to_string().contains("<item> is missing attribute `identifier`"));
    }

    #[test]
    fn decodes_numeric_and_leaves_unknown_references() {
        assert_eq!(decode_entities("caf&#233; &#x41; &foo; a&b"), "café A &foo; a&b");
    }
}
