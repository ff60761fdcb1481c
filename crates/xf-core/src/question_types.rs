use std::collections::BTreeMap;

use crate::types::{SELECT_ALL_THAT_APPLY, SELECT_ONE};
use crate::value::FieldValue;

/// The type-default lookup table: question type name -> field name ->
/// default value. The effective value of an element field is its own value
/// overlaid on the entry found here. Callers with their own question
/// catalogue inject a custom table; `builtin` covers the common types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDefaults {
    by_type: BTreeMap<String, BTreeMap<String, FieldValue>>,
}

impl TypeDefaults {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        value: FieldValue,
    ) {
        self.by_type
            .entry(type_name.into())
            .or_default()
            .insert(field.into(), value);
    }

    pub fn field_default(&self, type_name: &str, field: &str) -> Option<&FieldValue> {
        self.by_type.get(type_name)?.get(field)
    }

    pub fn builtin() -> Self {
        let mut defaults = Self::empty();
        let mut entry = |type_name: &str, control: &[(&str, &str)], bind: &[(&str, &str)]| {
            if !control.is_empty() {
                defaults.insert(type_name, "control", string_map(control));
            }
            if !bind.is_empty() {
                defaults.insert(type_name, "bind", string_map(bind));
            }
        };

        entry("string", &[("tag", "input")], &[("type", "string")]);
        entry("text", &[("tag", "input")], &[("type", "string")]);
        entry("int", &[("tag", "input")], &[("type", "int")]);
        entry("integer", &[("tag", "input")], &[("type", "int")]);
        entry("decimal", &[("tag", "input")], &[("type", "decimal")]);
        entry("date", &[("tag", "input")], &[("type", "date")]);
        entry("time", &[("tag", "input")], &[("type", "time")]);
        entry("dateTime", &[("tag", "input")], &[("type", "dateTime")]);
        entry("geopoint", &[("tag", "input")], &[("type", "geopoint")]);
        entry("barcode", &[("tag", "input")], &[("type", "barcode")]);
        entry(
            "note",
            &[("tag", "input")],
            &[("readonly", "true()"), ("type", "string")],
        );
        entry("calculate", &[], &[("type", "string")]);
        entry(SELECT_ONE, &[("tag", "select1")], &[("type", "string")]);
        entry(
            SELECT_ALL_THAT_APPLY,
            &[("tag", "select")],
            &[("type", "string")],
        );
        entry(
            "photo",
            &[("tag", "upload"), ("mediatype", "image/*")],
            &[("type", "binary")],
        );
        entry(
            "audio",
            &[("tag", "upload"), ("mediatype", "audio/*")],
            &[("type", "binary")],
        );
        entry(
            "video",
            &[("tag", "upload"), ("mediatype", "video/*")],
            &[("type", "binary")],
        );
        entry("trigger", &[("tag", "trigger")], &[("type", "string")]);
        entry("acknowledge", &[("tag", "trigger")], &[("type", "string")]);
        entry(
            "start",
            &[],
            &[
                ("jr:preload", "timestamp"),
                ("jr:preloadParams", "start"),
                ("type", "dateTime"),
            ],
        );
        entry(
            "end",
            &[],
            &[
                ("jr:preload", "timestamp"),
                ("jr:preloadParams", "end"),
                ("type", "dateTime"),
            ],
        );
        entry(
            "today",
            &[],
            &[
                ("jr:preload", "date"),
                ("jr:preloadParams", "today"),
                ("type", "date"),
            ],
        );
        entry(
            "deviceid",
            &[],
            &[
                ("jr:preload", "property"),
                ("jr:preloadParams", "deviceid"),
                ("type", "string"),
            ],
        );

        defaults
    }
}

fn string_map(entries: &[(&str, &str)]) -> FieldValue {
    FieldValue::Map(
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), FieldValue::text(*value)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_carries_bind_type_defaults() {
        let defaults = TypeDefaults::builtin();
        let bind = defaults
            .field_default("string", "bind")
            .expect("string bind default");
        assert_eq!(
            bind.as_map().expect("bind map").get("type"),
            Some(&FieldValue::text("string"))
        );
    }

    #[test]
    fn builtin_table_gives_selects_their_control_tag() {
        let defaults = TypeDefaults::builtin();
        let control = defaults
            .field_default(SELECT_ONE, "control")
            .expect("select control default");
        assert_eq!(
            control.as_map().expect("control map").get("tag"),
            Some(&FieldValue::text("select1"))
        );
    }

    #[test]
    fn note_defaults_mark_the_field_readonly() {
        let defaults = TypeDefaults::builtin();
        let bind = defaults.field_default("note", "bind").expect("note bind");
        assert_eq!(
            bind.as_map().expect("bind map").get("readonly"),
            Some(&FieldValue::text("true()"))
        );
    }

    #[test]
    fn injected_tables_override_nothing_by_default() {
        let mut defaults = TypeDefaults::empty();
        assert_eq!(defaults.field_default("string", "bind"), None);
        defaults.insert("string", "appearance", FieldValue::text("minimal"));
        assert_eq!(
            defaults.field_default("string", "appearance"),
            Some(&FieldValue::text("minimal"))
        );
    }
}
