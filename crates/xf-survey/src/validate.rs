use xf_core::XFormError;

use crate::tree::{ElementId, SurveyTree};

fn is_valid_start_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == ':'
}

fn is_valid_tag_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | ':' | '-' | '.')
}

/// Whether a name is usable as a markup tag.
pub fn is_valid_xml_tag(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => is_valid_start_char(first) && chars.all(is_valid_tag_char),
        None => false,
    }
}

fn first_invalid_char(name: &str) -> Option<char> {
    name.chars().enumerate().find_map(|(index, ch)| {
        let valid = if index == 0 {
            is_valid_start_char(ch)
        } else {
            is_valid_tag_char(ch)
        };
        (!valid).then_some(ch)
    })
}

impl SurveyTree {
    /// Check the element's name against the markup identifier grammar,
    /// reporting the offending character.
    pub fn validate(&self, id: ElementId) -> Result<(), XFormError> {
        let name = &self.get(id).name;
        if is_valid_xml_tag(name) {
            return Ok(());
        }
        let message = match first_invalid_char(name) {
            Some(ch) => format!(
                "The name '{}' contains an invalid character '{}'. Names must begin with a letter, colon, or underscore, and may contain only letters, digits, hyphens, underscores, colons, and periods.",
                name, ch
            ),
            None => "The name may not be empty.".to_string(),
        };
        Err(XFormError::new("INVALID_NAME", message))
    }
}

#[cfg(test)]
mod tests {
    use crate::element::Element;
    use crate::tree::{SurveyOptions, TreeBuilder};

    use super::*;

    fn tree_with_name(name: &str) -> (SurveyTree, ElementId) {
        let mut builder = TreeBuilder::new(SurveyOptions::default());
        let root = builder.root(Element::new("survey", "data"));
        let id = builder.add_child(root, Element::new("string", name));
        (builder.freeze(), id)
    }

    #[test]
    fn identifier_grammar_accepts_tag_shaped_names() {
        assert!(is_valid_xml_tag("age"));
        assert!(is_valid_xml_tag("_hidden"));
        assert!(is_valid_xml_tag("jr:count"));
        assert!(is_valid_xml_tag("a-b.c_d"));
        assert!(!is_valid_xml_tag("1age"));
        assert!(!is_valid_xml_tag("a b"));
        assert!(!is_valid_xml_tag(""));
    }

    #[test]
    fn validate_reports_the_offending_character() {
        let (tree, id) = tree_with_name("bad name");
        let error = tree.validate(id).expect_err("space should be invalid");
        assert_eq!(error.code, "INVALID_NAME");
        assert!(error.message.contains("'bad name'"));
        assert!(error.message.contains("' '"));
    }

    #[test]
    fn validate_reports_a_bad_leading_character() {
        let (tree, id) = tree_with_name("9lives");
        let error = tree.validate(id).expect_err("leading digit should be invalid");
        assert!(error.message.contains("'9'"));
    }

    #[test]
    fn validate_accepts_well_formed_names() {
        let (tree, id) = tree_with_name("age_in_years");
        assert!(tree.validate(id).is_ok());
    }
}
