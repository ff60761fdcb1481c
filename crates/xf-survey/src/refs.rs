use std::sync::OnceLock;

use regex::Regex;

use xf_core::XFormError;
use xf_xml::{XmlElementNode, XmlNode, XmlTextNode};

use crate::tree::{ElementId, SurveyTree};

/// Inline reference tokens: `${name}` or `${last-saved#name}`.
pub(crate) fn bracketed_tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\$\{(last-saved#)?([^{}]+)\}").expect("reference regex"))
}

fn function_call_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"[A-Za-z][A-Za-z0-9._-]*\(").expect("function call regex"))
}

fn resolve_reference(
    tree: &SurveyTree,
    name: &str,
    last_saved: bool,
    token: &str,
) -> Result<String, XFormError> {
    let target = tree
        .descendants(tree.root())
        .find(|id| tree.get(*id).name == name)
        .ok_or_else(|| {
            log::warn!("no survey element found for reference {}", token);
            XFormError::new(
                "UNRESOLVED_REFERENCE",
                format!(
                    "There is no survey element named '{}' to replace the reference '{}'.",
                    name, token
                ),
            )
        })?;
    let xpath = tree.xpath(target);
    if last_saved {
        Ok(format!("instance('__last-saved'){}", xpath))
    } else {
        Ok(xpath)
    }
}

impl SurveyTree {
    /// Replace every reference token in `value` with the absolute xpath of
    /// the element it names. Fails on unknown names.
    pub fn insert_xpaths(
        &self,
        value: &str,
        _context: ElementId,
    ) -> Result<String, XFormError> {
        let regex = bracketed_tag_regex();
        let mut result = String::new();
        let mut last_end = 0;
        for captures in regex.captures_iter(value) {
            let whole = captures.get(0).expect("match always has a whole group");
            let name = captures[2].trim().to_string();
            let xpath =
                resolve_reference(self, &name, captures.get(1).is_some(), whole.as_str())?;
            result.push_str(&value[last_end..whole.start()]);
            result.push_str(&xpath);
            last_end = whole.end();
        }
        result.push_str(&value[last_end..]);
        Ok(result)
    }

    /// Split display text on reference tokens, turning each token into an
    /// `<output value="..."/>` child and the surrounding text into text
    /// children. The flag reports whether any output node was inserted.
    pub fn insert_output_values(
        &self,
        text: &str,
        _context: ElementId,
    ) -> Result<(Vec<XmlNode>, bool), XFormError> {
        let regex = bracketed_tag_regex();
        let mut children = Vec::new();
        let mut inserted = false;
        let mut last_end = 0;
        for captures in regex.captures_iter(text) {
            let whole = captures.get(0).expect("match always has a whole group");
            let name = captures[2].trim().to_string();
            let xpath =
                resolve_reference(self, &name, captures.get(1).is_some(), whole.as_str())?;
            if whole.start() > last_end {
                children.push(XmlNode::Text(XmlTextNode {
                    value: text[last_end..whole.start()].to_string(),
                }));
            }
            children.push(XmlNode::Element(
                XmlElementNode::new("output").attr("value", xpath),
            ));
            inserted = true;
            last_end = whole.end();
        }
        if last_end < text.len() || !inserted {
            children.push(XmlNode::Text(XmlTextNode {
                value: text[last_end..].to_string(),
            }));
        }
        Ok((children, inserted))
    }
}

/// Whether a default value is an expression to evaluate at runtime rather
/// than a literal. References and function calls are dynamic; bare literals
/// are not. The full expression grammar is out of scope, so this is a
/// textual approximation.
pub fn default_is_dynamic(default: &str, _typ: &str) -> bool {
    if default.trim().is_empty() {
        return false;
    }
    bracketed_tag_regex().is_match(default) || function_call_regex().is_match(default)
}
