use serde::Serialize;

use xf_core::{FieldValue, XFormError};

use crate::refs::bracketed_tag_regex;
use crate::tree::{ElementId, SurveyTree};

/// One entry for the centralized multi-language text table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationRecord {
    pub path: String,
    pub lang: String,
    pub text: String,
    #[serde(skip)]
    pub element: ElementId,
}

impl SurveyTree {
    pub fn translation_path(&self, id: ElementId, display: &str) -> String {
        format!("{}:{}", self.xpath(id), display)
    }

    /// Whether the element's label must be an itext reference: a
    /// multi-language label, or any attached media.
    pub fn needs_itext_ref(&self, id: ElementId) -> bool {
        matches!(self.effective(id, "label"), FieldValue::Translated(_))
            || !self.effective_media(id).is_empty()
    }

    /// The translation records this element contributes. Every call walks
    /// the element afresh; records carry the element so the root assembler
    /// can substitute embedded references in context.
    pub fn translations(
        &self,
        id: ElementId,
        default_language: &str,
    ) -> Result<Vec<TranslationRecord>, XFormError> {
        let element = self.get(id);
        let mut records = Vec::new();

        let mut push = |path: String, lang: &str, text: String| {
            records.push(TranslationRecord {
                path,
                lang: lang.to_string(),
                text,
                element: id,
            });
        };

        for message_key in ["jr:constraintMsg", "jr:requiredMsg"] {
            match element.bind.get(message_key) {
                Some(FieldValue::Translated(by_lang)) => {
                    for (lang, text) in by_lang {
                        push(self.translation_path(id, message_key), lang, text.clone());
                    }
                }
                Some(FieldValue::Text(text)) if bracketed_tag_regex().is_match(text) => {
                    push(
                        self.translation_path(id, message_key),
                        default_language,
                        text.clone(),
                    );
                }
                _ => {}
            }
        }
        if let Some(FieldValue::Translated(by_lang)) = element.bind.get("jr:noAppErrorString") {
            for (lang, text) in by_lang {
                push(
                    self.translation_path(id, "jr:noAppErrorString"),
                    lang,
                    text.clone(),
                );
            }
        }

        for display in ["label", "hint", "guidance_hint"] {
            let mut value = element.field(display);

            let wrap = match (display, &value) {
                ("label", FieldValue::Text(text)) => {
                    !text.is_empty() && self.needs_itext_ref(id)
                }
                // Guidance hints live in the itext table by definition.
                ("guidance_hint", FieldValue::Text(text)) => !text.is_empty(),
                // A hint follows its guidance hint into the table.
                ("hint", FieldValue::Text(text)) => {
                    !text.is_empty() && !element.field("guidance_hint").is_empty()
                }
                _ => false,
            };
            if wrap {
                let text = value.text_for_lang(None);
                value = FieldValue::translated(&[(default_language, text.as_str())]);
            }

            if let FieldValue::Translated(by_lang) = value {
                for (lang, mut text) in by_lang {
                    if display == "label" {
                        let annotated = self.annotated_label(id, Some(&lang))?;
                        if annotated != text {
                            text = annotated;
                        }
                    }
                    records.push(TranslationRecord {
                        path: self.translation_path(id, display),
                        lang,
                        text,
                        element: id,
                    });
                }
            }
        }

        Ok(records)
    }
}
