use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElementNode),
    Text(XmlTextNode),
}

/// A markup element under construction: tag name, attributes in stable
/// (sorted) order, and ordered children. Fragment generators assemble these
/// and hand them to an external serializer; `to_xml_string` is the
/// reference rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElementNode {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlTextNode {
    pub value: String,
}

impl XmlElementNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).text_child(text)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: XmlElementNode) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn text_child(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(XmlTextNode {
            value: text.into(),
        }));
        self
    }

    pub fn append(&mut self, node: XmlNode) {
        self.children.push(node);
    }

    /// Concatenation of all direct text children.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.value.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.name);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape_xml_attr(value));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write_xml(out),
                XmlNode::Text(text) => out.push_str(&escape_xml_text(&text.value)),
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

pub fn escape_xml_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_xml_attr(value: &str) -> String {
    escape_xml_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_element_renders_self_closing() {
        let node = XmlElementNode::new("bind").attr("nodeset", "/data/age");
        assert_eq!(node.to_xml_string(), r#"<bind nodeset="/data/age"/>"#);
    }

    #[test]
    fn attributes_render_in_sorted_order() {
        let node = XmlElementNode::new("bind")
            .attr("nodeset", "/data/age")
            .attr("calculate", "string('')");
        assert_eq!(
            node.to_xml_string(),
            r#"<bind calculate="string('')" nodeset="/data/age"/>"#
        );
    }

    #[test]
    fn text_and_element_children_interleave_in_order() {
        let mut label = XmlElementNode::with_text("label", "Hello ");
        label.append(XmlNode::Element(
            XmlElementNode::new("output").attr("value", "/data/name"),
        ));
        assert_eq!(
            label.to_xml_string(),
            r#"<label>Hello <output value="/data/name"/></label>"#
        );
        assert_eq!(label.text_content(), "Hello ");
    }

    #[test]
    fn markup_characters_in_text_and_attributes_are_escaped() {
        let node = XmlElementNode::with_text("label", "a < b & c > d")
            .attr("ref", "jr:itext('a\"b')");
        let rendered = node.to_xml_string();
        assert!(rendered.contains("a &lt; b &amp; c &gt; d"));
        assert!(rendered.contains("jr:itext('a&quot;b')"));
    }

    #[test]
    fn rendered_fragments_reparse_as_well_formed_xml() {
        let node = XmlElementNode::new("setvalue")
            .attr("ref", "/data/dob")
            .attr("value", "today()")
            .attr("event", "odk-instance-first-load");
        let rendered = node.to_xml_string();
        let parsed = roxmltree::Document::parse(&rendered).expect("fragment should parse");
        let root = parsed.root_element();
        assert_eq!(root.tag_name().name(), "setvalue");
        assert_eq!(root.attribute("event"), Some("odk-instance-first-load"));
    }
}
