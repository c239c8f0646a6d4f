use crate::error::{Result, TriggerError};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Longest developer name the platform accepts.
pub const MAX_DEVELOPER_NAME_LEN: usize = 40;

// ---------------------------------------------------------------------------
// Developer name validation
// ---------------------------------------------------------------------------

static DEV_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn dev_name_re() -> &'static Regex {
    DEV_NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*(_[A-Za-z0-9]+)*$").unwrap())
}

pub fn validate_developer_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_DEVELOPER_NAME_LEN || !dev_name_re().is_match(name) {
        return Err(TriggerError::InvalidDeveloperName(name.to_string()));
    }
    Ok(())
}

/// Developer names are immutable once a record exists.
pub fn ensure_unchanged(stored: Option<&str>, edited: &str) -> Result<()> {
    match stored {
        Some(stored) if stored != edited.trim() => Err(TriggerError::Validation(format!(
            "Developer Name cannot be changed once created (was {stored})."
        ))),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// KnownNames
// ---------------------------------------------------------------------------

/// Developer names seen in the last full load, per metadata type.
///
/// Optimistic pre-flight only; the backend owns uniqueness. Comparison is
/// case-insensitive because the platform treats `Foo` and `foo` as the same
/// developer name.
#[derive(Debug, Clone, Default)]
pub struct KnownNames {
    settings: HashSet<String>,
    actions: HashSet<String>,
}

impl KnownNames {
    pub fn rebuild<'a>(
        settings: impl IntoIterator<Item = &'a str>,
        actions: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            settings: settings.into_iter().map(str::to_ascii_lowercase).collect(),
            actions: actions.into_iter().map(str::to_ascii_lowercase).collect(),
        }
    }

    pub fn has_setting(&self, name: &str) -> bool {
        self.settings.contains(&name.trim().to_ascii_lowercase())
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains(&name.trim().to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.settings.len() + self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
