use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single survey-element field value. Scalar text, per-language text,
/// nested attribute maps, and flags all flow through the same type so the
/// overlay resolver and the serializer can treat every field uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
    Translated(BTreeMap<String, String>),
    Map(BTreeMap<String, FieldValue>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn translated(entries: &[(&str, &str)]) -> Self {
        FieldValue::Translated(
            entries
                .iter()
                .map(|(lang, text)| ((*lang).to_string(), (*text).to_string()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Bool(value) => !value,
            FieldValue::Text(value) => value.is_empty(),
            FieldValue::Translated(values) => values.is_empty(),
            FieldValue::Map(values) => values.is_empty(),
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, FieldValue::Translated(_) | FieldValue::Map(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Map(values) => Some(values),
            _ => None,
        }
    }

    /// Resolve the display text of this value for a language. A scalar is
    /// its own text in every language; a translated value falls back to its
    /// first language when none is requested and to the empty string when
    /// the requested language is missing.
    pub fn text_for_lang(&self, lang: Option<&str>) -> String {
        match self {
            FieldValue::Text(value) => value.clone(),
            FieldValue::Translated(values) => match lang {
                Some(lang) => values.get(lang).cloned().unwrap_or_default(),
                None => values.values().next().cloned().unwrap_or_default(),
            },
            FieldValue::Bool(_) | FieldValue::Map(_) => String::new(),
        }
    }
}

/// Overlay an explicitly-set value onto a type default. Mappings merge with
/// the explicit keys winning and default-only keys preserved; anything else
/// is replaced wholesale by a non-empty explicit value.
pub fn overlay(over: &FieldValue, under: &FieldValue) -> FieldValue {
    match (over, under) {
        (FieldValue::Map(over_map), FieldValue::Map(under_map)) => {
            let mut merged = under_map.clone();
            for (key, value) in over_map {
                merged.insert(key.clone(), value.clone());
            }
            FieldValue::Map(merged)
        }
        (FieldValue::Translated(over_map), FieldValue::Translated(under_map)) => {
            let mut merged = under_map.clone();
            for (key, value) in over_map {
                merged.insert(key.clone(), value.clone());
            }
            FieldValue::Translated(merged)
        }
        (over, under) => {
            if over.is_empty() {
                under.clone()
            } else {
                over.clone()
            }
        }
    }
}
