pub mod annotate;
pub mod element;
pub mod fields;
pub mod fragments;
pub mod refs;
pub mod snapshot;
pub mod translate;
pub mod tree;
pub mod validate;

pub use annotate::escape_annotated_value;
pub use element::Element;
pub use refs::default_is_dynamic;
pub use snapshot::plain_eq;
pub use translate::TranslationRecord;
pub use tree::{ElementId, SurveyOptions, SurveyTree, TreeBuilder};
pub use validate::is_valid_xml_tag;
