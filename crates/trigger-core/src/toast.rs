use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Success,
    Error,
}

/// A transient user-facing message queued by the explorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub variant: ToastVariant,
    pub title: String,
    pub message: String,
}

impl Toast {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastVariant::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ToastVariant::Error, title, message)
    }

    fn new(variant: ToastVariant, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            variant,
            title: title.into(),
            message: message.into(),
        }
    }
}
