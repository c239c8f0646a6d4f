use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("trigger setting not found: {0}")]
    SettingNotFound(String),

    #[error("trigger action not found: {0}")]
    ActionNotFound(String),

    #[error("developer name already in use: {0}")]
    DuplicateName(String),

    #[error("invalid developer name '{0}': must start with a letter and contain only letters, digits and single underscores")]
    InvalidDeveloperName(String),

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("invalid timing: {0}")]
    InvalidTiming(String),

    #[error("invalid section: {0}")]
    InvalidSection(String),

    #[error("invalid record '{name}': {reason}")]
    InvalidRecord { name: String, reason: String },

    #[error(transparent)]
    ManualOrder(#[from] ManualOrderError),

    #[error("no order edit session is active for the {0} section")]
    NoActiveSession(String),

    #[error("a deployment is already in progress")]
    DeploymentPending,

    #[error("{0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TriggerError {
    /// Text shown to the user inside a form or toast.
    pub fn user_message(&self) -> String {
        match self {
            TriggerError::Validation(msg) | TriggerError::Backend(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Field-level error raised by manual order entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManualOrderError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("order values allow at most {max} decimal places")]
    TooManyDecimals { max: usize },
}

pub type Result<T> = std::result::Result<T, TriggerError>;
