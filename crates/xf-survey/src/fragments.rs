use xf_core::{FieldValue, XFormError, CALCULATE, REPEAT};
use xf_xml::XmlElementNode;

use crate::refs::{bracketed_tag_regex, default_is_dynamic};
use crate::tree::{ElementId, SurveyTree};

/// Literal spellings recognised as XPath booleans in bind values.
const BINDING_CONVERSIONS: [(&str, &str); 12] = [
    ("yes", "true()"),
    ("Yes", "true()"),
    ("YES", "true()"),
    ("true", "true()"),
    ("True", "true()"),
    ("TRUE", "true()"),
    ("no", "false()"),
    ("No", "false()"),
    ("NO", "false()"),
    ("false", "false()"),
    ("False", "false()"),
    ("FALSE", "false()"),
];

/// Bind attributes the boolean conversion applies to.
const CONVERTIBLE_BIND_ATTRIBUTES: [&str; 5] =
    ["readonly", "required", "relevant", "constraint", "calculate"];

/// Bind attributes holding user-facing messages that may live in itext.
const MESSAGE_BIND_ATTRIBUTES: [&str; 3] =
    ["jr:constraintMsg", "jr:requiredMsg", "jr:noAppErrorString"];

fn convert_boolean_literal(value: &str) -> Option<&'static str> {
    BINDING_CONVERSIONS
        .iter()
        .find(|(literal, _)| *literal == value)
        .map(|(_, converted)| *converted)
}

fn itext_ref(path: &str) -> String {
    format!("jr:itext('{}')", path)
}

impl SurveyTree {
    pub fn label_node(&self, id: ElementId) -> Result<XmlElementNode, XFormError> {
        if self.needs_itext_ref(id) {
            let reference = itext_ref(&self.translation_path(id, "label"));
            return Ok(XmlElementNode::new("label").attr("ref", reference));
        }
        let output_label = self.effective(id, "label").text_for_lang(None);
        let annotated = self.annotated_label(id, None)?;
        let label = if annotated != output_label {
            annotated
        } else {
            output_label
        };
        let (children, _inserted) = self.insert_output_values(&label, id)?;
        let mut node = XmlElementNode::new("label");
        node.children = children;
        Ok(node)
    }

    pub fn hint_node(&self, id: ElementId) -> Result<XmlElementNode, XFormError> {
        let hint = self.effective(id, "hint");
        if matches!(hint, FieldValue::Translated(_))
            || !self.effective(id, "guidance_hint").is_empty()
        {
            let reference = itext_ref(&self.translation_path(id, "hint"));
            return Ok(XmlElementNode::new("hint").attr("ref", reference));
        }
        let (children, _inserted) =
            self.insert_output_values(&hint.text_for_lang(None), id)?;
        let mut node = XmlElementNode::new("hint");
        node.children = children;
        Ok(node)
    }

    /// Label and hint fragments for one element, in sibling order. A hint
    /// requires a preceding label sibling, so one is synthesised when only
    /// a hint exists.
    pub fn label_and_hint_nodes(
        &self,
        id: ElementId,
    ) -> Result<Vec<XmlElementNode>, XFormError> {
        let element = self.get(id);
        let label = self.effective(id, "label");
        let media = self.effective_media(id);
        let hint = self.effective(id, "hint");
        let guidance_hint = self.effective(id, "guidance_hint");
        let annotated_form = self.options().is_annotated_form();

        let mut result = Vec::new();
        let mut label_appended = false;
        if !label.is_empty() || !media.is_empty() || (annotated_form && element.typ == CALCULATE)
        {
            result.push(self.label_node(id)?);
            label_appended = true;
        }

        if !hint.is_empty() || !guidance_hint.is_empty() {
            if !label_appended {
                result.push(self.label_node(id)?);
            }
            result.push(self.hint_node(id)?);
        }

        let message = format!(
            "The survey element named '{}' has no label or hint.",
            element.name
        );
        if result.is_empty() && !annotated_form {
            return Err(XFormError::with_path(
                "MISSING_LABEL_OR_HINT",
                message,
                self.xpath(id),
            ));
        }

        // A guidance hint cannot stand alone; clients may hide it entirely.
        if label.is_empty() && media.is_empty() && hint.is_empty() && !guidance_hint.is_empty() {
            return Err(XFormError::with_path(
                "ORPHAN_GUIDANCE_HINT",
                message,
                self.xpath(id),
            ));
        }

        if !media.contains_key("image") && media.contains_key("big-image") {
            return Err(XFormError::with_path(
                "INVALID_MEDIA_COMBINATION",
                format!(
                    "To use big-image, you must also specify an image for the survey element named '{}'.",
                    element.name
                ),
                self.xpath(id),
            ));
        }

        Ok(result)
    }

    /// The `<bind>` fragment for one element, or `None` when the element
    /// carries no binding of its own.
    pub fn binding_node(&self, id: ElementId) -> Result<Option<XmlElementNode>, XFormError> {
        let element = self.get(id);
        if element.flat {
            return Ok(None);
        }
        let effective_bind = self.effective_bind(id);
        if effective_bind.is_empty() {
            return Ok(None);
        }
        let mut bind_map = effective_bind.clone();

        // A trigger routes the expression through a setvalue action; keeping
        // the calculate binding too would compute it twice.
        if !self.effective(id, "trigger").is_empty() && effective_bind.contains_key("calculate")
        {
            bind_map.remove("calculate");
        }

        if self.options().is_annotated_form() {
            let annotated_fields = self.options().expanded_annotated_fields();
            if annotated_fields.iter().any(|field| field == "relevant")
                && effective_bind.contains_key("relevant")
            {
                log::debug!(
                    "suppressing binding for {} while relevant is annotated",
                    self.xpath(id)
                );
                return Ok(None);
            } else if annotated_fields.iter().any(|field| field == "calculation")
                && effective_bind.contains_key("calculate")
            {
                bind_map.insert("calculate".to_string(), FieldValue::text("string('')"));
            }
        }

        let mut node = XmlElementNode::new("bind").attr("nodeset", self.xpath(id));
        for (key, value) in &bind_map {
            let raw = match value {
                FieldValue::Text(text) => {
                    let mut text = text.clone();
                    if CONVERTIBLE_BIND_ATTRIBUTES.contains(&key.as_str()) {
                        if let Some(converted) = convert_boolean_literal(&text) {
                            text = converted.to_string();
                        }
                    }
                    if (key == "jr:constraintMsg" || key == "jr:requiredMsg")
                        && bracketed_tag_regex().is_match(&text)
                    {
                        text = itext_ref(&self.translation_path(id, key));
                    }
                    text
                }
                FieldValue::Translated(_) => {
                    if MESSAGE_BIND_ATTRIBUTES.contains(&key.as_str()) {
                        itext_ref(&self.translation_path(id, key))
                    } else {
                        value.text_for_lang(Some(self.options().default_language.as_str()))
                    }
                }
                other => other.text_for_lang(None),
            };
            let substituted = self.insert_xpaths(&raw, id)?;
            node.attributes.insert(key.clone(), substituted);
        }
        Ok(Some(node))
    }

    /// The `<setvalue>` fragment assigning a dynamic default, or `None` for
    /// static defaults and annotation-suppressed ones. Body-layer callers
    /// inside repeats pass `in_repeat` to extend the trigger events.
    pub fn setvalue_for_dynamic_default(
        &self,
        id: ElementId,
        in_repeat: bool,
    ) -> Result<Option<XmlElementNode>, XFormError> {
        let default = self.effective(id, "default").text_for_lang(None);
        if default.is_empty() || !default_is_dynamic(&default, &self.get(id).typ) {
            return Ok(None);
        }
        let options = self.options();
        if options.is_annotated_form()
            && options
                .expanded_annotated_fields()
                .iter()
                .any(|field| field == "default")
        {
            return Ok(None);
        }
        let value = self.insert_xpaths(&default, id)?;
        let mut event = "odk-instance-first-load".to_string();
        if in_repeat {
            event.push_str(" odk-new-repeat");
        }
        Ok(Some(
            XmlElementNode::new("setvalue")
                .attr("ref", self.xpath(id))
                .attr("value", value)
                .attr("event", event),
        ))
    }

    /// Bindings for this element and every descendant, in preorder, with
    /// model-level dynamic-default setvalue fragments interleaved. Dynamic
    /// defaults under a repeat are emitted by the body layer instead.
    pub fn descendant_binding_nodes(
        &self,
        id: ElementId,
    ) -> Result<Vec<XmlElementNode>, XFormError> {
        let mut result = Vec::new();
        for entry in self.descendants(id) {
            if let Some(binding) = self.binding_node(entry)? {
                result.push(binding);
            }
            let in_repeat = self
                .lineage(entry)
                .iter()
                .any(|ancestor| self.get(*ancestor).typ == REPEAT);
            if !in_repeat {
                if let Some(setvalue) = self.setvalue_for_dynamic_default(entry, false)? {
                    result.push(setvalue);
                }
            }
        }
        Ok(result)
    }

    /// The action fragment for one element: an element named by the action
    /// map's `name` entry, referencing this element's xpath.
    pub fn action_node(&self, id: ElementId) -> Option<XmlElementNode> {
        let action = self.effective_action(id);
        if action.is_empty() {
            return None;
        }
        let name = action.get("name")?.text_for_lang(None);
        let mut node = XmlElementNode::new(name).attr("ref", self.xpath(id));
        for (key, value) in &action {
            if key != "name" {
                node.attributes
                    .insert(key.clone(), value.text_for_lang(None));
            }
        }
        Some(node)
    }

    pub fn descendant_action_nodes(&self, id: ElementId) -> Vec<XmlElementNode> {
        self.descendants(id)
            .filter_map(|entry| self.action_node(entry))
            .collect()
    }
}
