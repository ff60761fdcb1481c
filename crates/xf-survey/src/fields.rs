use std::collections::BTreeMap;

use xf_core::{overlay, FieldValue};

use crate::tree::{ElementId, SurveyTree};

impl SurveyTree {
    /// The effective value of a declared field: the instance value overlaid
    /// on the type default. Total; absent fields resolve to their empty
    /// defaults.
    pub fn effective(&self, id: ElementId, field: &str) -> FieldValue {
        let element = self.get(id);
        let over = element.field(field);
        let Some(under) = self.type_defaults().field_default(&element.typ, field) else {
            return over;
        };
        if under.is_empty() {
            return over;
        }
        overlay(&over, under)
    }

    pub fn effective_bind(&self, id: ElementId) -> BTreeMap<String, FieldValue> {
        match self.effective(id, "bind") {
            FieldValue::Map(map) => map,
            _ => BTreeMap::new(),
        }
    }

    pub fn effective_media(&self, id: ElementId) -> BTreeMap<String, FieldValue> {
        match self.effective(id, "media") {
            FieldValue::Map(map) => map,
            _ => BTreeMap::new(),
        }
    }

    pub fn effective_action(&self, id: ElementId) -> BTreeMap<String, FieldValue> {
        match self.effective(id, "action") {
            FieldValue::Map(map) => map,
            _ => BTreeMap::new(),
        }
    }
}
