use std::collections::BTreeMap;

use xf_core::FieldValue;

use crate::tree::ElementId;

/// Serialized names of every declared element field, in snapshot order.
pub const DECLARED_FIELDS: [&str; 25] = [
    "name",
    "compact_tag",
    "sms_field",
    "sms_option",
    "label",
    "hint",
    "guidance_hint",
    "default",
    "type",
    "appearance",
    "parameters",
    "intent",
    "jr:count",
    "bind",
    "instance",
    "control",
    "media",
    "itemset",
    "choice_filter",
    "query",
    "autoplay",
    "flat",
    "action",
    "list_name",
    "trigger",
];

/// One survey construct: a question, group, repeat, or the root. Fields hold
/// the values set on this instance; the effective value of a field overlays
/// these on the type-default table (see `SurveyTree::effective`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub typ: String,
    pub label: FieldValue,
    pub hint: FieldValue,
    pub guidance_hint: FieldValue,
    pub default: String,
    pub appearance: String,
    pub intent: String,
    pub jr_count: String,
    pub compact_tag: String,
    pub sms_field: String,
    pub sms_option: String,
    pub bind: BTreeMap<String, FieldValue>,
    pub media: BTreeMap<String, FieldValue>,
    pub control: BTreeMap<String, String>,
    pub instance: BTreeMap<String, String>,
    pub parameters: BTreeMap<String, String>,
    pub action: BTreeMap<String, String>,
    pub itemset: String,
    pub choice_filter: String,
    pub query: String,
    pub autoplay: String,
    pub list_name: String,
    pub trigger: String,
    pub flat: bool,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
}

impl Element {
    pub fn new(typ: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            typ: typ.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_declared_field(field: &str) -> bool {
        DECLARED_FIELDS.contains(&field)
    }

    /// The raw value of a declared field by its serialized name. Unknown
    /// names resolve to the empty value, matching absent-field defaults.
    pub fn field(&self, field: &str) -> FieldValue {
        match field {
            "name" => FieldValue::text(self.name.clone()),
            "type" => FieldValue::text(self.typ.clone()),
            "label" => self.label.clone(),
            "hint" => self.hint.clone(),
            "guidance_hint" => self.guidance_hint.clone(),
            "default" => FieldValue::text(self.default.clone()),
            "appearance" => FieldValue::text(self.appearance.clone()),
            "intent" => FieldValue::text(self.intent.clone()),
            "jr:count" => FieldValue::text(self.jr_count.clone()),
            "compact_tag" => FieldValue::text(self.compact_tag.clone()),
            "sms_field" => FieldValue::text(self.sms_field.clone()),
            "sms_option" => FieldValue::text(self.sms_option.clone()),
            "bind" => FieldValue::Map(self.bind.clone()),
            "media" => FieldValue::Map(self.media.clone()),
            "control" => string_map_value(&self.control),
            "instance" => string_map_value(&self.instance),
            "parameters" => string_map_value(&self.parameters),
            "action" => string_map_value(&self.action),
            "itemset" => FieldValue::text(self.itemset.clone()),
            "choice_filter" => FieldValue::text(self.choice_filter.clone()),
            "query" => FieldValue::text(self.query.clone()),
            "autoplay" => FieldValue::text(self.autoplay.clone()),
            "list_name" => FieldValue::text(self.list_name.clone()),
            "trigger" => FieldValue::text(self.trigger.clone()),
            "flat" => FieldValue::Bool(self.flat),
            _ => FieldValue::default(),
        }
    }
}

fn string_map_value(map: &BTreeMap<String, String>) -> FieldValue {
    FieldValue::Map(
        map.iter()
            .map(|(key, value)| (key.clone(), FieldValue::text(value.clone())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_elements_default_every_field_empty() {
        let element = Element::new("string", "age");
        assert_eq!(element.typ, "string");
        assert_eq!(element.name, "age");
        assert!(element.label.is_empty());
        assert!(element.bind.is_empty());
        assert!(!element.flat);
        assert_eq!(element.parent, None);
    }

    #[test]
    fn field_exposes_raw_values_by_serialized_name() {
        let mut element = Element::new("string", "age");
        element.label = FieldValue::text("Age");
        element
            .bind
            .insert("relevant".to_string(), FieldValue::text("${x} > 1"));
        assert_eq!(element.field("label"), FieldValue::text("Age"));
        assert_eq!(element.field("type"), FieldValue::text("string"));
        let bind = element.field("bind");
        assert_eq!(
            bind.as_map().expect("bind map").get("relevant"),
            Some(&FieldValue::text("${x} > 1"))
        );
    }

    #[test]
    fn unknown_field_names_resolve_empty() {
        let element = Element::new("string", "age");
        assert!(element.field("no_such_field").is_empty());
        assert!(!Element::is_declared_field("no_such_field"));
        assert!(Element::is_declared_field("jr:count"));
    }
}
