//! Engine configuration and server-capability probing.
//!
//! The native-rename capability flag arrives from deployment configuration
//! with loose typing (a real boolean, or strings like `"true"`, `"1"`,
//! `"yes"`). The coercion lives here, at one boundary, and never fails:
//! an absent or unreadable value degrades to the default of `true`, because
//! most modern directory servers support ModRDN and an incorrect `true` only
//! causes a later transparent fallback, not data loss.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for the RDN migration engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Whether the target server supports native rename (ModRDN).
    /// Accepts booleans and boolean-like strings; absent means `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_rename: Option<Value>,
}

impl MigrationConfig {
    /// Create a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the native-rename capability flag.
    #[must_use]
    pub fn with_native_rename(mut self, value: impl Into<Value>) -> Self {
        self.native_rename = Some(value.into());
        self
    }

    /// Probe whether the target server supports native rename.
    ///
    /// Never fails: configuration problems degrade to the default of `true`.
    #[must_use]
    pub fn supports_native_rename(&self) -> bool {
        self.native_rename.as_ref().map_or(true, coerce_bool)
    }
}

/// Coerce a loosely-typed configuration value to a boolean.
///
/// Recognizes real booleans, the strings `true`/`1`/`yes` and
/// `false`/`0`/`no` (case-insensitively), and numbers (zero is false).
/// Anything unrecognizable yields the safe default of `true`.
fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => true,
        },
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_supported() {
        assert!(MigrationConfig::new().supports_native_rename());
    }

    #[test]
    fn test_boolean_values() {
        assert!(MigrationConfig::new()
            .with_native_rename(true)
            .supports_native_rename());
        assert!(!MigrationConfig::new()
            .with_native_rename(false)
            .supports_native_rename());
    }

    #[test]
    fn test_truthy_strings() {
        for value in ["true", "True", "TRUE", "1", "yes", "YES", " yes "] {
            assert!(
                MigrationConfig::new()
                    .with_native_rename(value)
                    .supports_native_rename(),
                "expected '{value}' to coerce to true"
            );
        }
    }

    #[test]
    fn test_falsy_strings() {
        for value in ["false", "False", "0", "no", "NO"] {
            assert!(
                !MigrationConfig::new()
                    .with_native_rename(value)
                    .supports_native_rename(),
                "expected '{value}' to coerce to false"
            );
        }
    }

    #[test]
    fn test_unreadable_values_degrade_to_default() {
        for value in [json!("maybe"), json!(null), json!(["yes"]), json!({"v": 1})] {
            assert!(
                MigrationConfig::new()
                    .with_native_rename(value.clone())
                    .supports_native_rename(),
                "expected {value} to degrade to the default"
            );
        }
    }

    #[test]
    fn test_numeric_values() {
        assert!(MigrationConfig::new()
            .with_native_rename(1)
            .supports_native_rename());
        assert!(!MigrationConfig::new()
            .with_native_rename(0)
            .supports_native_rename());
    }

    #[test]
    fn test_config_serialization() {
        let config = MigrationConfig::new().with_native_rename("yes");

        let json = serde_json::to_string(&config).unwrap();
        let parsed: MigrationConfig = serde_json::from_str(&json).unwrap();

        assert!(parsed.supports_native_rename());
    }

    #[test]
    fn test_empty_config_deserializes() {
        let parsed: MigrationConfig = serde_json::from_str("{}").unwrap();
        assert!(parsed.supports_native_rename());
        // The capability flag is the engine's only configuration surface.
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "{}");
    }
}
