use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use xf_core::{
    annotation_style, XFormError, ANNOTATE_CHOICE_FILTER, ANNOTATE_CONSTRAINT_TYPE,
    ANNOTATE_CONTACTDATA, ANNOTATE_EXTERNAL, ANNOTATE_ITEMGROUP, ANNOTATE_READONLY,
    ANNOTATE_RELEVANT, ANNOTATE_REPEAT_COUNT, ANNOTATE_REQUIRED_TYPE,
    ANNOTATE_SELECT_FROM_FILE_MESSAGE, CUSTOM_ANNOTATION_PREFIX, GROUP, REPEAT,
    SELECT_ALL_THAT_APPLY, SELECT_ONE,
};

use crate::element::Element;
use crate::refs::bracketed_tag_regex;
use crate::tree::{ElementId, SurveyTree};

/// Annotated fields that are computed from bind/media/instance metadata
/// rather than read off a declared element field.
const COMPUTED_ANNOTATION_FIELDS: [&str; 16] = [
    "itemgroup",
    "relevant",
    "required",
    "required_type",
    "constraint",
    "constraint_type",
    "calculation",
    "readonly",
    "image",
    "video",
    "audio",
    "repeat_count",
    "external",
    "contactdata",
    "identifier",
    "custom",
];

/// Fields whose values are emitted verbatim, with no escaping at all.
const PASSTHROUGH_FIELDS: [&str; 6] = [
    "readonly",
    "external",
    "contactdata",
    "constraint_type",
    "required_type",
    "identifier",
];

/// Fields whose comparison operators are spelled out as `gt`/`lt`.
const COMPARISON_FIELDS: [&str; 9] = [
    "relevant",
    "required",
    "constraint",
    "default",
    "choice_filter",
    "calculation",
    "trigger",
    "repeat_count",
    "custom",
];

/// Fields whose `*` is escaped so it does not read as emphasis markup.
const STAR_FIELDS: [&str; 6] = [
    "relevant",
    "constraint",
    "default",
    "calculation",
    "required",
    "custom",
];

struct EscapeRule {
    applies: fn(&str) -> bool,
    apply: fn(&str) -> String,
}

/// Ordered escaping pipeline. Reference tokens are escaped as whole units
/// before anything else can touch their underscores, which is what keeps
/// label free-text underscores intact without double-escaping tokens.
static ESCAPE_RULES: [EscapeRule; 5] = [
    EscapeRule {
        applies: |field| field != "label",
        apply: escape_underscores,
    },
    EscapeRule {
        applies: |field| field == "label",
        apply: escape_reference_underscores,
    },
    EscapeRule {
        applies: |field| COMPARISON_FIELDS.contains(&field),
        apply: spell_out_comparisons,
    },
    EscapeRule {
        applies: |field| STAR_FIELDS.contains(&field),
        apply: escape_stars,
    },
    EscapeRule {
        applies: |_| true,
        apply: brackets_for_braces,
    },
];

fn escape_underscores(value: &str) -> String {
    value.replace('_', "\\_")
}

fn escape_reference_underscores(value: &str) -> String {
    bracketed_tag_regex()
        .replace_all(value, |captures: &regex::Captures<'_>| {
            escape_underscores(&captures[0])
        })
        .into_owned()
}

fn spell_out_comparisons(value: &str) -> String {
    value.replace('>', " gt ").replace('<', " lt ")
}

fn escape_stars(value: &str) -> String {
    value.replace('*', "\\*")
}

fn brackets_for_braces(value: &str) -> String {
    value.replace('{', "[").replace('}', "]")
}

/// Escape an annotation value for display, keyed by the field kind.
pub fn escape_annotated_value(value: &str, field: &str) -> String {
    if PASSTHROUGH_FIELDS.contains(&field) {
        return value.to_string();
    }
    ESCAPE_RULES.iter().fold(value.to_string(), |value, rule| {
        if (rule.applies)(field) {
            (rule.apply)(&value)
        } else {
            value
        }
    })
}

fn custom_annotation_key_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("custom annotation key regex"))
}

fn custom_annotations(element: &Element) -> BTreeMap<&str, String> {
    element
        .bind
        .iter()
        .filter(|(key, _)| key.starts_with(CUSTOM_ANNOTATION_PREFIX))
        .map(|(key, value)| (key.as_str(), value.text_for_lang(None)))
        .collect()
}

fn check_custom_annotations(element: &Element) -> Result<(), XFormError> {
    for key in custom_annotations(element).keys() {
        let label = &key[CUSTOM_ANNOTATION_PREFIX.len()..];
        if label.is_empty() {
            continue;
        }
        if !custom_annotation_key_regex().is_match(label) {
            return Err(XFormError::new(
                "INVALID_CUSTOM_ANNOTATION_KEY",
                "Custom annotation labels can only include letters, digits, underscores, and hyphens.",
            ));
        }
        if !label.chars().next().is_some_and(|ch| ch.is_ascii_alphanumeric()) {
            return Err(XFormError::new(
                "INVALID_CUSTOM_ANNOTATION_KEY",
                "Custom annotation labels must start with a letter or digit.",
            ));
        }
    }
    Ok(())
}

/// Python-style title case: every `_`-separated segment capitalised, the
/// separators kept.
fn title_case(field: &str) -> String {
    field
        .split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}

fn single_line(value: &str) -> String {
    value.replace('\n', "").replace('\r', "")
}

fn bind_text(element: &Element, key: &str, lang: Option<&str>) -> String {
    element
        .bind
        .get(key)
        .map(|value| value.text_for_lang(lang))
        .unwrap_or_default()
}

fn media_text(element: &Element, key: &str, lang: Option<&str>) -> String {
    element
        .media
        .get(key)
        .map(|value| value.text_for_lang(lang))
        .unwrap_or_default()
}

fn instance_text(element: &Element, key: &str) -> String {
    element.instance.get(key).cloned().unwrap_or_default()
}

impl SurveyTree {
    /// Find the `<repeat_name>_count` element whose calculate binding holds
    /// a repeat's count expression: first among the root's children, then
    /// one level inside any group-typed child of the root.
    fn repeat_count_element(&self, repeat_name: &str) -> Option<ElementId> {
        let count_name = format!("{}_count", repeat_name);
        let root = self.root();
        let top_level = self
            .children(root)
            .iter()
            .copied()
            .find(|child| self.get(*child).name == count_name);
        if top_level.is_some() {
            return top_level;
        }
        for child in self.children(root) {
            if self.get(*child).typ == GROUP {
                let inner = self
                    .children(*child)
                    .iter()
                    .copied()
                    .find(|entry| self.get(*entry).name == count_name);
                if inner.is_some() {
                    return inner;
                }
            }
        }
        None
    }

    /// The label shown for `id` in form-design review: the authored label
    /// plus the configured metadata annotations, escaped and styled.
    pub fn annotated_label(
        &self,
        id: ElementId,
        lang: Option<&str>,
    ) -> Result<String, XFormError> {
        let element = self.get(id);
        let options = self.options();

        if !options.is_annotated_form() {
            check_custom_annotations(element)?;
            return Ok(self.effective(id, "label").text_for_lang(lang));
        }

        let is_choice_item = self.parent(id).is_some_and(|parent| {
            let parent_type = &self.get(parent).typ;
            parent_type == SELECT_ONE || parent_type == SELECT_ALL_THAT_APPLY
        });

        let label_text = self.effective(id, "label").text_for_lang(lang);
        let mut annotated_label = escape_annotated_value(&label_text, "label");
        let mut is_select_from_file = false;

        if is_choice_item {
            annotated_label =
                escape_annotated_value(&format!("{} [{}]", label_text, element.name), "choices");
        } else {
            for (idx, field) in options.expanded_annotated_fields().iter().enumerate() {
                let field = field.as_str();
                if !Element::is_declared_field(field)
                    && !COMPUTED_ANNOTATION_FIELDS.contains(&field)
                {
                    continue;
                }

                let mut attr_label = title_case(field);
                let mut attr_value = if Element::is_declared_field(field) {
                    self.effective(id, field).text_for_lang(lang)
                } else {
                    String::new()
                };
                let mut field_annotations: BTreeMap<String, String> = BTreeMap::new();
                let mut has_custom = false;

                match field {
                    "type" => {
                        if attr_value == SELECT_ONE || attr_value == SELECT_ALL_THAT_APPLY {
                            attr_value = if attr_value == SELECT_ONE {
                                "select_one".to_string()
                            } else {
                                "select_multiple".to_string()
                            };
                            if !element.list_name.is_empty() {
                                attr_value.push(' ');
                                attr_value.push_str(&element.list_name);
                            } else if !element.itemset.is_empty() {
                                is_select_from_file = true;
                                attr_value.push_str("_from_file ");
                                attr_value.push_str(&element.itemset);
                            }
                        } else if attr_value == "photo" {
                            attr_value = "image".to_string();
                        }
                    }
                    "itemgroup" => {
                        attr_value = bind_text(element, "oc:itemgroup", None);
                        if !attr_value.is_empty() {
                            attr_label = ANNOTATE_ITEMGROUP.to_string();
                        }
                    }
                    "relevant" => {
                        attr_value = bind_text(element, "relevant", lang);
                        if !attr_value.is_empty() {
                            attr_label = ANNOTATE_RELEVANT.to_string();
                        }
                    }
                    "required" => {
                        attr_value = bind_text(element, "required", lang);
                    }
                    "required_type" => {
                        attr_value = bind_text(element, "oc:required-type", lang);
                        if !attr_value.is_empty() {
                            attr_label = ANNOTATE_REQUIRED_TYPE.to_string();
                        }
                    }
                    "constraint" => {
                        attr_value = bind_text(element, "constraint", lang);
                    }
                    "constraint_type" => {
                        attr_value = bind_text(element, "oc:constraint-type", None);
                        if !attr_value.is_empty() {
                            attr_label = ANNOTATE_CONSTRAINT_TYPE.to_string();
                        }
                    }
                    "calculation" => {
                        attr_value = bind_text(element, "calculate", None);
                    }
                    "readonly" => {
                        attr_value = bind_text(element, "readonly", lang);
                        if !attr_value.is_empty() {
                            attr_label = ANNOTATE_READONLY.to_string();
                        }
                    }
                    "image" | "video" | "audio" => {
                        attr_value = media_text(element, field, lang);
                    }
                    "repeat_count" if element.typ == REPEAT => {
                        if let Some(count_element) = self.repeat_count_element(&element.name) {
                            attr_value = bind_text(self.get(count_element), "calculate", None);
                            if !attr_value.is_empty() {
                                attr_label = ANNOTATE_REPEAT_COUNT.to_string();
                            }
                        }
                    }
                    "external" => {
                        attr_value = bind_text(element, "oc:external", None);
                        if !attr_value.is_empty() {
                            attr_label = ANNOTATE_EXTERNAL.to_string();
                        }
                    }
                    "contactdata" => {
                        attr_value = instance_text(element, "oc:contactdata");
                        if !attr_value.is_empty() {
                            attr_label = ANNOTATE_CONTACTDATA.to_string();
                        }
                    }
                    "choice_filter" => {
                        if !attr_value.is_empty() {
                            attr_label = ANNOTATE_CHOICE_FILTER.to_string();
                        }
                    }
                    "identifier" => {
                        attr_value = instance_text(element, "oc:identifier");
                    }
                    "custom" => {
                        check_custom_annotations(element)?;
                        for (key, value) in custom_annotations(element) {
                            has_custom = true;
                            let mut label = key[CUSTOM_ANNOTATION_PREFIX.len()..].to_string();
                            if label.contains('_') {
                                label = label.replace('_', " ").trim().to_string();
                            }
                            field_annotations.insert(label, value);
                        }
                    }
                    _ => {}
                }

                if !has_custom {
                    field_annotations.insert(attr_label, attr_value);
                }

                let attr_style = annotation_style(field);
                for (label, value) in &field_annotations {
                    if label.is_empty() || value.is_empty() {
                        continue;
                    }
                    let value = escape_annotated_value(&single_line(value), field);
                    let annotation = format!(" [{}: {}]", label, value);
                    // One newline separates the authored label from the
                    // annotations, tied to the first configured field.
                    if idx == 0 {
                        annotated_label.push('\n');
                    }
                    match attr_style {
                        Some(style) => {
                            annotated_label.push_str(&format!(
                                "<span style=\"{}\">{}</span>",
                                style, annotation
                            ));
                        }
                        None => annotated_label.push_str(&annotation),
                    }
                }
            }
        }

        if is_select_from_file {
            annotated_label.push_str("<br>");
            annotated_label.push_str(ANNOTATE_SELECT_FROM_FILE_MESSAGE);
        }

        Ok(annotated_label)
    }
}
