pub mod node;

pub use node::{escape_xml_attr, escape_xml_text, XmlElementNode, XmlNode, XmlTextNode};
