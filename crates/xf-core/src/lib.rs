pub mod error;
pub mod question_types;
pub mod types;
pub mod value;

pub use error::XFormError;
pub use question_types::TypeDefaults;
pub use types::*;
pub use value::{overlay, FieldValue};
