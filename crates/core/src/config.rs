//! Runtime configuration for the resilience layer.
//!
//! Configuration objects are plain values passed into the functions that
//! need them; nothing here is global.

use crate::error::CoreError;
use crate::idempotency::IDEMPOTENCY_HEADER;

/// When to substitute mock data for failed API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackConfig {
    /// Master switch. When `false`, nothing ever falls back.
    pub enabled: bool,
    /// Serve mock data for every request regardless of the error.
    pub force_mock: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            force_mock: false,
        }
    }
}

impl FallbackConfig {
    /// Load from environment variables.
    ///
    /// | Env Var                 | Default |
    /// |-------------------------|---------|
    /// | `SISM_FALLBACK_ENABLED` | `true`  |
    /// | `SISM_FORCE_MOCK`       | `false` |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();
        Ok(Self {
            enabled: bool_var(&lookup, "SISM_FALLBACK_ENABLED", defaults.enabled)?,
            force_mock: bool_var(&lookup, "SISM_FORCE_MOCK", defaults.force_mock)?,
        })
    }
}

/// When write requests carry an idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyConfig {
    pub enabled: bool,
    pub header_name: String,
    /// Path prefixes that never get a key (e.g. login endpoints).
    pub exempt_paths: Vec<String>,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            header_name: IDEMPOTENCY_HEADER.to_string(),
            exempt_paths: Vec::new(),
        }
    }
}

impl IdempotencyConfig {
    /// Load from environment variables.
    ///
    /// | Env Var                         | Default |
    /// |---------------------------------|---------|
    /// | `SISM_IDEMPOTENCY_ENABLED`      | `true`  |
    /// | `SISM_IDEMPOTENCY_EXEMPT_PATHS` | (none)  |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let exempt_paths = lookup("SISM_IDEMPOTENCY_EXEMPT_PATHS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            enabled: bool_var(&lookup, "SISM_IDEMPOTENCY_ENABLED", defaults.enabled)?,
            header_name: defaults.header_name,
            exempt_paths,
        })
    }
}

/// All resilience-layer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreConfig {
    pub fallback: FallbackConfig,
    pub idempotency: IdempotencyConfig,
}

impl CoreConfig {
    pub fn from_env() -> Result<Self, CoreError> {
        Ok(Self {
            fallback: FallbackConfig::from_env()?,
            idempotency: IdempotencyConfig::from_env()?,
        })
    }
}

fn bool_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: bool,
) -> Result<bool, CoreError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => parse_bool(&raw).ok_or_else(|| {
            CoreError::Configuration(format!("{name} must be a boolean, got '{raw}'"))
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let fallback = FallbackConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(fallback, FallbackConfig::default());
        let idempotency = IdempotencyConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(idempotency, IdempotencyConfig::default());
    }

    #[test]
    fn reads_boolean_spellings() {
        let config = FallbackConfig::from_lookup(lookup(&[
            ("SISM_FALLBACK_ENABLED", "off"),
            ("SISM_FORCE_MOCK", "Yes"),
        ]))
        .unwrap();
        assert!(!config.enabled);
        assert!(config.force_mock);
    }

    #[test]
    fn rejects_garbage_booleans() {
        let err = FallbackConfig::from_lookup(lookup(&[("SISM_FORCE_MOCK", "maybe")])).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(ref msg) if msg.contains("SISM_FORCE_MOCK")));
    }

    #[test]
    fn exempt_paths_are_split_and_trimmed() {
        let config = IdempotencyConfig::from_lookup(lookup(&[(
            "SISM_IDEMPOTENCY_EXEMPT_PATHS",
            " /api/auth , ,/api/upload",
        )]))
        .unwrap();
        assert_eq!(config.exempt_paths, vec!["/api/auth", "/api/upload"]);
    }
}
