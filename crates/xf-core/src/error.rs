use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct XFormError {
    pub code: String,
    pub message: String,
    pub path: Option<String>,
}

impl XFormError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(
        code: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_code_and_message() {
        let error = XFormError::new("INVALID_NAME", "The name 'a b' is not valid.");
        assert_eq!(error.to_string(), "INVALID_NAME: The name 'a b' is not valid.");
        assert_eq!(error.path, None);
    }

    #[test]
    fn error_with_path_keeps_the_element_xpath() {
        let error = XFormError::with_path("MISSING_LABEL_OR_HINT", "no label", "/data/q1");
        assert_eq!(error.path.as_deref(), Some("/data/q1"));
    }
}
