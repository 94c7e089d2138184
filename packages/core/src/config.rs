/// Configuration for rule-graph projects
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DATA_DIR: &str = "RULEGRAPH_DATA_DIR";
pub const ENV_ACCESSORIES: &str = "RULEGRAPH_ACCESSORIES";
pub const ENV_PERSIST_ATTEMPTS: &str = "RULEGRAPH_PERSIST_ATTEMPTS";
pub const ENV_PERSIST_TIMEOUT_MS: &str = "RULEGRAPH_PERSIST_TIMEOUT_MS";

/// Top-level configuration shared by every project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Directory holding one subdirectory per project
    pub data_dir: PathBuf,

    /// Whether Accessory nodes may be created
    pub accessories_enabled: bool,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Retry policy for durable writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Attempts per write before giving up
    pub max_attempts: u32,

    /// Pause between attempts
    pub retry_backoff_ms: u64,

    /// Upper bound on the total time spent on one write
    pub timeout_ms: u64,
}

/// Default canvas layout for nodes that have no stored position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub origin_x: f64,
    pub origin_y: f64,
    pub column_spacing: f64,
    pub row_spacing: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            accessories_enabled: true,
            persistence: PersistenceConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 25,
            timeout_ms: 2000,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            column_spacing: 320.0,
            row_spacing: 140.0,
        }
    }
}

impl PersistenceConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Resolve the default project root
///
/// - macOS/Linux: ~/.rulegraph/projects/
/// - Windows: %USERPROFILE%\.rulegraph\projects\
///
/// Falls back to a relative `.rulegraph/projects` when no home directory exists.
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".rulegraph").join("projects"))
        .unwrap_or_else(|| PathBuf::from(".rulegraph").join("projects"))
}

impl GraphConfig {
    /// Configuration rooted at an explicit directory, defaults otherwise
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Build configuration from `RULEGRAPH_*` environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unset keys keep their defaults; the result is validated.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(flag) = lookup(ENV_ACCESSORIES) {
            config.accessories_enabled = parse_flag(&flag)
                .ok_or_else(|| format!("{} must be a boolean, got '{}'", ENV_ACCESSORIES, flag))?;
        }

        if let Some(attempts) = lookup(ENV_PERSIST_ATTEMPTS) {
            config.persistence.max_attempts = attempts.trim().parse().map_err(|_| {
                format!("{} must be a positive integer, got '{}'", ENV_PERSIST_ATTEMPTS, attempts)
            })?;
        }

        if let Some(timeout) = lookup(ENV_PERSIST_TIMEOUT_MS) {
            config.persistence.timeout_ms = timeout.trim().parse().map_err(|_| {
                format!("{} must be milliseconds, got '{}'", ENV_PERSIST_TIMEOUT_MS, timeout)
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir cannot be empty".to_string());
        }

        if self.persistence.max_attempts == 0 {
            return Err("persistence.max_attempts must be greater than 0".to_string());
        }

        if self.persistence.timeout_ms == 0 {
            return Err("persistence.timeout_ms must be greater than 0".to_string());
        }

        let layout = &self.layout;
        if !layout.origin_x.is_finite() || !layout.origin_y.is_finite() {
            return Err("layout origin must be finite".to_string());
        }
        if !(layout.column_spacing.is_finite() && layout.column_spacing > 0.0) {
            return Err("layout.column_spacing must be a positive number".to_string());
        }
        if !(layout.row_spacing.is_finite() && layout.row_spacing > 0.0) {
            return Err("layout.row_spacing must be a positive number".to_string());
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = GraphConfig::default();
        assert!(config.accessories_enabled);
        assert!(config.data_dir.ends_with("projects"));
        assert_eq!(config.persistence.max_attempts, 3);
        assert_eq!(config.persistence.timeout(), Duration::from_millis(2000));
        assert_eq!(config.layout.column_spacing, 320.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GraphConfig::with_data_dir("/tmp/rulegraph");
        assert!(config.validate().is_ok());

        // Invalid: zero attempts
        config.persistence.max_attempts = 0;
        assert!(config.validate().is_err());

        // Invalid: zero timeout
        config.persistence.max_attempts = 1;
        config.persistence.timeout_ms = 0;
        assert!(config.validate().is_err());

        // Invalid: non-positive spacing
        config.persistence.timeout_ms = 100;
        config.layout.row_spacing = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = GraphConfig::from_lookup(lookup_from(&[
            (ENV_DATA_DIR, "/srv/rulegraph"),
            (ENV_ACCESSORIES, "off"),
            (ENV_PERSIST_ATTEMPTS, "5"),
            (ENV_PERSIST_TIMEOUT_MS, "750"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/rulegraph"));
        assert!(!config.accessories_enabled);
        assert_eq!(config.persistence.max_attempts, 5);
        assert_eq!(config.persistence.timeout_ms, 750);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(GraphConfig::from_lookup(lookup_from(&[(ENV_ACCESSORIES, "maybe")])).is_err());
        assert!(GraphConfig::from_lookup(lookup_from(&[(ENV_PERSIST_ATTEMPTS, "0")])).is_err());
        assert!(GraphConfig::from_lookup(lookup_from(&[(ENV_PERSIST_TIMEOUT_MS, "soon")])).is_err());
    }
}
