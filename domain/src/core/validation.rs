//! Structured configuration issues.
//!
//! Configuration is validated in one pass and every problem is reported as
//! a [`ConfigIssue`] instead of failing on the first one. Callers decide
//! whether warnings are shown and whether errors abort startup.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A model entry has an empty name.
    EmptyModelName,
    /// A threshold or ratio lies outside `0.0..=1.0`.
    OutOfRange { field: String },
    /// `min_models` is greater than `max_models`.
    InvertedBounds { field: String },
    /// A model is routed to a provider that is not defined.
    UndefinedProvider { model: String, provider: String },
    /// A provider command could not be found; its models are excluded.
    ProviderUnavailable { provider: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Report an issue when `value` is outside `0.0..=1.0`.
pub fn check_unit_interval(field: &str, value: f64) -> Option<ConfigIssue> {
    if (0.0..=1.0).contains(&value) {
        return None;
    }
    Some(ConfigIssue::error(
        ConfigIssueCode::OutOfRange {
            field: field.to_string(),
        },
        format!("{field}: {value} is outside 0.0..=1.0"),
    ))
}
