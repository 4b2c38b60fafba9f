//! Session configuration and the validation policy.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::model::{ReleaseStatus, ValidationIssue};
use crate::{Error, Result};

// ============================================================================
// Validation modes
// ============================================================================

/// What to do with validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Fail with [`Error::Validation`].
    Error,
    /// Emit a `tracing` warning and continue.
    #[default]
    Warning,
    /// Record in the session's validation log and continue.
    Log,
    /// Continue silently.
    #[serde(alias = "none")]
    Off,
}

/// An issue recorded under [`ValidationMode::Log`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedIssue {
    pub type_name: String,
    pub issue: ValidationIssue,
}

/// Process-wide default mode plus per-type overrides.
///
/// Setters return the value they replace so callers can restore it.
#[derive(Debug, Default)]
pub struct ValidationPolicy {
    default: ValidationMode,
    overrides: HashMap<String, ValidationMode>,
    log: Mutex<Vec<LoggedIssue>>,
}

impl ValidationPolicy {
    pub fn new(default: ValidationMode) -> Self {
        Self { default, ..Self::default() }
    }

    pub fn default_mode(&self) -> ValidationMode {
        self.default
    }

    /// Effective mode for a type: its override, else the default.
    pub fn mode_for(&self, type_name: &str) -> ValidationMode {
        self.overrides.get(type_name).copied().unwrap_or(self.default)
    }

    pub fn set_default(&mut self, mode: ValidationMode) -> ValidationMode {
        std::mem::replace(&mut self.default, mode)
    }

    pub fn set_for_type(&mut self, type_name: &str, mode: ValidationMode) -> Option<ValidationMode> {
        self.overrides.insert(type_name.to_owned(), mode)
    }

    pub fn clear_for_type(&mut self, type_name: &str) -> Option<ValidationMode> {
        self.overrides.remove(type_name)
    }

    /// Apply the effective mode of `type_name` to `issues`.
    pub fn check(&self, type_name: &str, issues: Vec<ValidationIssue>) -> Result<()> {
        if issues.is_empty() {
            return Ok(());
        }
        match self.mode_for(type_name) {
            ValidationMode::Error => {
                return Err(Error::Validation { type_name: type_name.to_owned(), issues });
            }
            ValidationMode::Warning => {
                for issue in &issues {
                    tracing::warn!(type_name, %issue, "validation issue");
                }
            }
            ValidationMode::Log => {
                let mut log = self.log.lock();
                for issue in issues {
                    tracing::info!(type_name, %issue, "validation issue recorded");
                    log.push(LoggedIssue { type_name: type_name.to_owned(), issue });
                }
            }
            ValidationMode::Off => {}
        }
        Ok(())
    }

    /// Snapshot of the issues recorded so far.
    pub fn logged(&self) -> Vec<LoggedIssue> {
        self.log.lock().clone()
    }

    pub fn drain_log(&self) -> Vec<LoggedIssue> {
        std::mem::take(&mut *self.log.lock())
    }
}

// ============================================================================
// Existence check
// ============================================================================

/// How an existence-query match is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceCheck {
    /// Adopt the single match's identifier on a key match alone.
    #[default]
    KeyOnly,
    /// Adopt only if every locally set property agrees with the match;
    /// otherwise fail with [`Error::IdentityConflict`].
    Strict,
}

// ============================================================================
// SessionConfig
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Scope used for lookups and queries.
    pub scope: ReleaseStatus,
    /// Initial default validation mode.
    pub validation: ValidationMode,
    pub existence_check: ExistenceCheck,
    /// Depth used by [`Session::resolve_default`](crate::Session::resolve_default).
    pub default_resolve_depth: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scope: ReleaseStatus::Released,
            validation: ValidationMode::Warning,
            existence_check: ExistenceCheck::KeyOnly,
            default_resolve_depth: 0,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_scope(mut self, scope: ReleaseStatus) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    pub fn with_existence_check(mut self, check: ExistenceCheck) -> Self {
        self.existence_check = check;
        self
    }

    pub fn with_resolve_depth(mut self, depth: u32) -> Self {
        self.default_resolve_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing() -> Vec<ValidationIssue> {
        vec![ValidationIssue::MissingRequired { property: "name" }]
    }

    #[test]
    fn test_error_mode_fails() {
        let policy = ValidationPolicy::new(ValidationMode::Error);
        assert!(matches!(policy.check("Person", missing()), Err(Error::Validation { .. })));
        assert!(policy.check("Person", Vec::new()).is_ok());
    }

    #[test]
    fn test_override_and_restore() {
        let mut policy = ValidationPolicy::new(ValidationMode::Error);
        assert_eq!(policy.set_for_type("Person", ValidationMode::Off), None);
        assert!(policy.check("Person", missing()).is_ok());
        assert!(policy.check("Dataset", missing()).is_err());

        let previous = policy.set_default(ValidationMode::Off);
        assert_eq!(previous, ValidationMode::Error);
        assert!(policy.check("Dataset", missing()).is_ok());

        policy.set_default(previous);
        assert_eq!(policy.clear_for_type("Person"), Some(ValidationMode::Off));
        assert_eq!(policy.mode_for("Person"), ValidationMode::Error);
    }

    #[test]
    fn test_log_mode_records() {
        let policy = ValidationPolicy::new(ValidationMode::Log);
        policy.check("Person", missing()).unwrap();
        assert_eq!(policy.logged().len(), 1);
        assert_eq!(policy.drain_log()[0].type_name, "Person");
        assert!(policy.logged().is_empty());
    }

    #[test]
    fn test_config_from_json() {
        let config = SessionConfig::from_json(
            r#"{"scope": "any", "validation": "none", "existence_check": "strict"}"#,
        )
        .unwrap();
        assert_eq!(config.scope, ReleaseStatus::Any);
        assert_eq!(config.validation, ValidationMode::Off);
        assert_eq!(config.existence_check, ExistenceCheck::Strict);
        assert_eq!(config.default_resolve_depth, 0);
    }
}
