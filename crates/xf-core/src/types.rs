/// Question type names as they appear in survey definitions.
pub const SELECT_ONE: &str = "select one";
pub const SELECT_ALL_THAT_APPLY: &str = "select all that apply";
pub const REPEAT: &str = "repeat";
pub const GROUP: &str = "group";
pub const CALCULATE: &str = "calculate";
pub const SURVEY: &str = "survey";

/// Media kinds a question may attach.
pub const SUPPORTED_MEDIA: [&str; 4] = ["image", "big-image", "audio", "video"];

/// Bind keys carrying this prefix are custom annotations; the suffix is the
/// annotation's display label.
pub const CUSTOM_ANNOTATION_PREFIX: &str = "oc:oc_annotation_";

/// Display labels for annotated fields whose title-cased field name is not
/// the label shown to reviewers.
pub const ANNOTATE_ITEMGROUP: &str = "Item Group";
pub const ANNOTATE_RELEVANT: &str = "Show When";
pub const ANNOTATE_REQUIRED_TYPE: &str = "Required Type";
pub const ANNOTATE_CONSTRAINT_TYPE: &str = "Constraint Type";
pub const ANNOTATE_READONLY: &str = "Read-Only";
pub const ANNOTATE_REPEAT_COUNT: &str = "Repeat Count";
pub const ANNOTATE_EXTERNAL: &str = "External";
pub const ANNOTATE_CONTACTDATA: &str = "Contact Data";
pub const ANNOTATE_CHOICE_FILTER: &str = "Choice Filter";

/// Advisory appended to annotated labels of select-from-file questions,
/// whose choice lists are not part of the document.
pub const ANNOTATE_SELECT_FROM_FILE_MESSAGE: &str =
    "Choices are loaded from an external file and are not shown here.";

/// Expansion of the "all" sentinel, in emission order.
pub const ALL_ANNOTATED_FIELDS: [&str; 21] = [
    "name",
    "type",
    "itemgroup",
    "relevant",
    "required",
    "required_type",
    "constraint",
    "constraint_type",
    "default",
    "choice_filter",
    "calculation",
    "trigger",
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

/// Inline span style for an annotated field, if it has one.
pub fn annotation_style(field: &str) -> Option<&'static str> {
    match field {
        "type" => Some("color: black"),
        "name" => Some("color: orangered"),
        "itemgroup" => Some("color: blue"),
        "relevant" => Some("color: green"),
        "required" => Some("color: red"),
        "required_type" => Some("color: cornflowerblue"),
        "constraint" => Some("color: magenta"),
        "constraint_type" => Some("color: darkolivegreen"),
        "default" => Some("color: deepskyblue"),
        "choice_filter" => Some("color: dodgerblue"),
        "calculation" => Some("color: maroon"),
        "trigger" => Some("color: darkgreen"),
        "readonly" => Some("color: chocolate"),
        "image" | "video" | "audio" => Some("color: darkviolet"),
        "repeat_count" => Some("color: lime"),
        "external" => Some("color: indigo"),
        "contactdata" | "identifier" => Some("color: tomato"),
        "custom" => Some("color: black"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_style_covers_every_all_field_except_name_only_ones() {
        assert_eq!(annotation_style("name"), Some("color: orangered"));
        assert_eq!(annotation_style("repeat_count"), Some("color: lime"));
        assert_eq!(annotation_style("not_a_field"), None);
    }

    #[test]
    fn all_annotated_fields_keep_name_before_type_before_itemgroup() {
        let position = |field: &str| {
            ALL_ANNOTATED_FIELDS
                .iter()
                .position(|entry| *entry == field)
                .expect("field present")
        };
        assert!(position("name") < position("type"));
        assert!(position("type") < position("itemgroup"));
        assert!(position("itemgroup") < position("calculation"));
    }
}
