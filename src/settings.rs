//! Application settings store.
//!
//! A key/value map configured at startup and read thereafter: routing
//! options consulted at router-creation time and arbitrary handler-visible
//! configuration. Shared with each request through an `Arc` back-reference.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Setting key controlling literal-segment case sensitivity. Read when the
/// application's root router is created.
pub const CASE_SENSITIVE_ROUTING: &str = "case sensitive routing";

/// Setting key controlling strict trailing-slash matching. Read when the
/// application's root router is created.
pub const STRICT_ROUTING: &str = "strict routing";

/// Key→value settings shared between the application facade and handlers.
///
/// Expected to be configured before serving begins and only read afterwards;
/// the lock exists so the store can be shared by reference with in-flight
/// requests.
#[derive(Debug, Default)]
pub struct SettingsStore {
    values: RwLock<HashMap<String, Value>>,
}

impl SettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a setting.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.values
            .write()
            .expect("settings lock poisoned")
            .insert(key.into(), value.into());
    }

    /// Look up a setting.
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .expect("settings lock poisoned")
            .get(key)
            .cloned()
    }

    /// Set a boolean setting to `true`.
    pub fn enable(&self, key: impl Into<String>) {
        self.set(key, true);
    }

    /// Set a boolean setting to `false`.
    pub fn disable(&self, key: impl Into<String>) {
        self.set(key, false);
    }

    /// Whether a setting is present and truthy.
    #[must_use]
    pub fn enabled(&self, key: &str) -> bool {
        match self.setting(key) {
            Some(Value::Bool(b)) => b,
            Some(Value::Null) | None => false,
            Some(_) => true,
        }
    }

    #[must_use]
    pub fn disabled(&self, key: &str) -> bool {
        !self.enabled(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_disable() {
        let settings = SettingsStore::new();
        assert!(settings.disabled(STRICT_ROUTING));
        settings.enable(STRICT_ROUTING);
        assert!(settings.enabled(STRICT_ROUTING));
        settings.disable(STRICT_ROUTING);
        assert!(settings.disabled(STRICT_ROUTING));
    }

    #[test]
    fn test_arbitrary_values_are_truthy() {
        let settings = SettingsStore::new();
        settings.set("view engine", "askama");
        assert!(settings.enabled("view engine"));
        assert_eq!(
            settings.setting("view engine"),
            Some(Value::String("askama".to_string()))
        );
    }
}
