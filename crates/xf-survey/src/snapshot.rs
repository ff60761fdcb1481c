use serde_json::{Map, Value};

use xf_core::{FieldValue, XFormError};

use crate::element::DECLARED_FIELDS;
use crate::tree::{ElementId, SurveyTree};

fn field_value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Bool(value) => Value::Bool(*value),
        FieldValue::Text(value) => Value::String(value.clone()),
        FieldValue::Translated(values) => Value::Object(
            values
                .iter()
                .map(|(lang, text)| (lang.clone(), Value::String(text.clone())))
                .collect(),
        ),
        FieldValue::Map(values) => Value::Object(
            values
                .iter()
                .map(|(key, entry)| (key.clone(), field_value_to_json(entry)))
                .collect(),
        ),
    }
}

impl SurveyTree {
    /// A validated, plain nested-mapping snapshot of the subtree at `id`:
    /// raw field values under their serialized names, children recursed,
    /// and every empty value pruned. Internal linkage never appears.
    pub fn plain_value(&self, id: ElementId) -> Result<Value, XFormError> {
        self.validate(id)?;
        let element = self.get(id);
        let mut map = Map::new();
        for field in DECLARED_FIELDS {
            let value = element.field(field);
            if value.is_empty() {
                continue;
            }
            map.insert(field.to_string(), field_value_to_json(&value));
        }
        let children = element
            .children
            .iter()
            .map(|child| self.plain_value(*child))
            .collect::<Result<Vec<_>, _>>()?;
        if !children.is_empty() {
            map.insert("children".to_string(), Value::Array(children));
        }
        Ok(Value::Object(map))
    }

    pub fn to_json(&self, id: ElementId) -> Result<String, XFormError> {
        Ok(self.plain_value(id)?.to_string())
    }
}

/// Structural equality: two elements are equal iff their plain snapshots
/// are. Works across trees.
pub fn plain_eq(
    left_tree: &SurveyTree,
    left: ElementId,
    right_tree: &SurveyTree,
    right: ElementId,
) -> Result<bool, XFormError> {
    Ok(left_tree.plain_value(left)? == right_tree.plain_value(right)?)
}

#[cfg(test)]
mod tests {
    use crate::element::Element;
    use crate::tree::{SurveyOptions, TreeBuilder};

    use super::*;

    fn sample_tree() -> SurveyTree {
        let mut builder = TreeBuilder::new(SurveyOptions::default());
        let root = builder.root(Element::new("survey", "data"));
        let mut question = Element::new("string", "name");
        question.label = FieldValue::text("Name");
        question
            .bind
            .insert("relevant".to_string(), FieldValue::text("true()"));
        builder.add_child(root, question);
        builder.freeze()
    }

    #[test]
    fn snapshots_prune_empty_fields_and_keep_set_ones() {
        let tree = sample_tree();
        let value = tree.plain_value(tree.root()).expect("snapshot");
        let root = value.as_object().expect("root object");
        assert_eq!(root.get("name"), Some(&Value::String("data".to_string())));
        assert_eq!(root.get("type"), Some(&Value::String("survey".to_string())));
        assert!(!root.contains_key("label"));
        assert!(!root.contains_key("flat"));
        assert!(!root.contains_key("parent"));

        let children = root
            .get("children")
            .and_then(Value::as_array)
            .expect("children array");
        assert_eq!(children.len(), 1);
        let question = children[0].as_object().expect("child object");
        assert_eq!(question.get("label"), Some(&Value::String("Name".to_string())));
        let bind = question.get("bind").and_then(Value::as_object).expect("bind");
        assert_eq!(bind.get("relevant"), Some(&Value::String("true()".to_string())));
    }

    #[test]
    fn snapshots_validate_every_element() {
        let mut builder = TreeBuilder::new(SurveyOptions::default());
        let root = builder.root(Element::new("survey", "data"));
        builder.add_child(root, Element::new("string", "bad name"));
        let tree = builder.freeze();
        let error = tree
            .plain_value(tree.root())
            .expect_err("invalid child name should fail");
        assert_eq!(error.code, "INVALID_NAME");
    }

    #[test]
    fn snapshot_equality_is_structural() {
        let first = sample_tree();
        let second = sample_tree();
        assert!(
            plain_eq(&first, first.root(), &second, second.root()).expect("comparable trees")
        );

        let mut builder = TreeBuilder::new(SurveyOptions::default());
        let root = builder.root(Element::new("survey", "data"));
        builder.add_child(root, Element::new("string", "other"));
        let different = builder.freeze();
        assert!(
            !plain_eq(&first, first.root(), &different, different.root())
                .expect("comparable trees")
        );
    }

    #[test]
    fn to_json_round_trips_through_serde() {
        let tree = sample_tree();
        let json = tree.to_json(tree.root()).expect("json");
        let reparsed: Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(reparsed, tree.plain_value(tree.root()).expect("snapshot"));
    }

    #[test]
    fn translated_values_snapshot_as_language_objects() {
        let mut builder = TreeBuilder::new(SurveyOptions::default());
        let root = builder.root(Element::new("survey", "data"));
        let mut question = Element::new("string", "name");
        question.label = FieldValue::translated(&[("en", "Name"), ("id", "Nama")]);
        builder.add_child(root, question);
        let tree = builder.freeze();
        let value = tree.plain_value(tree.root()).expect("snapshot");
        let label = value
            .pointer("/children/0/label")
            .and_then(Value::as_object)
            .expect("label object");
        assert_eq!(label.get("en"), Some(&Value::String("Name".to_string())));
        assert_eq!(label.get("id"), Some(&Value::String("Nama".to_string())));
    }
}
