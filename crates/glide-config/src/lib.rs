//! Glide configuration system
//!
//! Settings for the prop-commit pipeline and the layout animation manager,
//! loaded from `glide.toml` with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`GlideConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting holds a value the runtime cannot use.
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Main configuration structure for Glide
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GlideConfig {
    /// Prop update manager settings
    pub props: PropsConfig,
    /// Layout animation manager settings
    pub layout: LayoutConfig,
    /// Frame driver settings
    pub frame: FrameConfig,
}

/// Which native commit primitive the prop update manager talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Shadow-tree commits with settling detection.
    #[default]
    Fabric,
    /// View-manager commits keyed by view type name.
    Paper,
    /// Host environment without a native layer; props apply synchronously.
    Web,
}

impl BackendKind {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "fabric" => Some(Self::Fabric),
            "paper" => Some(Self::Paper),
            "web" => Some(Self::Web),
            _ => None,
        }
    }
}

/// Prop update manager configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PropsConfig {
    /// Commit backend selected at startup
    pub backend: BackendKind,
    /// Time without updates after which a tag counts as settled (~2 frames at 60fps)
    pub settle_threshold_ms: f64,
    /// View type name used when a descriptor carries none (Paper only)
    pub default_view_name: String,
    /// Running under a test harness: the unavailable manager stays inert instead of failing
    pub test_harness: bool,
}

/// Layout animation manager configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Run `start` on the next display refresh (platforms where layout is measured a frame late)
    pub defer_start_to_next_frame: bool,
}

/// Frame driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrameConfig {
    /// Interval between display refresh ticks in milliseconds
    pub interval_ms: f64,
}

impl Default for PropsConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Fabric,
            settle_threshold_ms: 20.0,
            default_view_name: "RCTView".to_string(),
            test_harness: false,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            defer_start_to_next_frame: false,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000.0 / 60.0,
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn valid_threshold(ms: f64) -> bool {
    ms.is_finite() && ms >= 0.0
}

fn valid_interval(ms: f64) -> bool {
    ms.is_finite() && ms > 0.0
}

impl GlideConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the numeric settings the runtime relies on.
    pub fn validate(&self) -> Result<()> {
        if !valid_threshold(self.props.settle_threshold_ms) {
            return Err(ConfigError::Invalid {
                key: "props.settle_threshold_ms",
                value: self.props.settle_threshold_ms.to_string(),
            });
        }
        if !valid_interval(self.frame.interval_ms) {
            return Err(ConfigError::Invalid {
                key: "frame.interval_ms",
                value: self.frame.interval_ms.to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from `glide.toml` in the current directory,
    /// or return the defaults if the file is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file("glide.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        self.merge_with_vars(|name| std::env::var(name).ok());
    }

    /// Merge overrides from an arbitrary variable source.
    pub fn merge_with_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Props settings
        if let Some(val) = lookup("GLIDE_BACKEND") {
            if let Some(kind) = BackendKind::parse(&val) {
                self.props.backend = kind;
            }
        }
        if let Some(val) = lookup("GLIDE_SETTLE_THRESHOLD_MS") {
            match val.parse::<f64>() {
                Ok(threshold) if valid_threshold(threshold) => {
                    self.props.settle_threshold_ms = threshold;
                }
                _ => log::warn!("ignoring GLIDE_SETTLE_THRESHOLD_MS={val}"),
            }
        }
        if let Some(name) = lookup("GLIDE_DEFAULT_VIEW_NAME") {
            self.props.default_view_name = name;
        }
        if let Some(val) = lookup("GLIDE_TEST_HARNESS") {
            self.props.test_harness = parse_flag(&val);
        }

        // Layout settings
        if let Some(val) = lookup("GLIDE_DEFER_LAYOUT_START") {
            self.layout.defer_start_to_next_frame = parse_flag(&val);
        }

        // Frame settings
        if let Some(val) = lookup("GLIDE_FRAME_INTERVAL_MS") {
            match val.parse::<f64>() {
                Ok(interval) if valid_interval(interval) => self.frame.interval_ms = interval,
                _ => log::warn!("ignoring GLIDE_FRAME_INTERVAL_MS={val}"),
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from glide.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = GlideConfig::default();
        assert_eq!(config.props.backend, BackendKind::Fabric);
        assert_eq!(config.props.settle_threshold_ms, 20.0);
        assert_eq!(config.props.default_view_name, "RCTView");
        assert!(!config.props.test_harness);
        assert!(!config.layout.defer_start_to_next_frame);
    }

    #[test]
    fn test_toml_serialization() {
        let config = GlideConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: GlideConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glide.toml");
        std::fs::write(
            &path,
            "[props]\nbackend = \"paper\"\n\n[layout]\ndefer_start_to_next_frame = true\n",
        )
        .unwrap();

        let config = GlideConfig::load_from_file(&path).unwrap();
        assert_eq!(config.props.backend, BackendKind::Paper);
        assert_eq!(config.props.settle_threshold_ms, 20.0);
        assert!(config.layout.defer_start_to_next_frame);
    }

    #[test]
    fn test_invalid_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glide.toml");
        std::fs::write(&path, "[props]\nbackend = 12\n").unwrap();

        let err = GlideConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_reports_read_error() {
        let err = GlideConfig::load_from_file("/nonexistent/glide.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn test_merge_with_vars() {
        let vars: HashMap<&str, &str> = [
            ("GLIDE_BACKEND", "Web"),
            ("GLIDE_SETTLE_THRESHOLD_MS", "12.5"),
            ("GLIDE_TEST_HARNESS", "true"),
            ("GLIDE_DEFER_LAYOUT_START", "1"),
            ("GLIDE_FRAME_INTERVAL_MS", "-3"),
        ]
        .into_iter()
        .collect();

        let mut config = GlideConfig::default();
        config.merge_with_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.props.backend, BackendKind::Web);
        assert_eq!(config.props.settle_threshold_ms, 12.5);
        assert!(config.props.test_harness);
        assert!(config.layout.defer_start_to_next_frame);
        // Non-positive intervals are ignored
        assert_eq!(config.frame.interval_ms, 1000.0 / 60.0);
    }

    #[test]
    fn test_unusable_threshold_is_ignored() {
        for raw in ["NaN", "-5", "inf", "soon"] {
            let mut config = GlideConfig::default();
            config.merge_with_vars(|name| {
                (name == "GLIDE_SETTLE_THRESHOLD_MS").then(|| raw.to_string())
            });
            assert_eq!(config.props.settle_threshold_ms, 20.0, "accepted {raw}");
        }

        let mut config = GlideConfig::default();
        config.merge_with_vars(|name| (name == "GLIDE_SETTLE_THRESHOLD_MS").then(|| "0".to_string()));
        assert_eq!(config.props.settle_threshold_ms, 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = GlideConfig::default();
        assert!(config.validate().is_ok());

        config.props.settle_threshold_ms = f64::NAN;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "props.settle_threshold_ms", .. }));

        config.props.settle_threshold_ms = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_with_negative_threshold_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glide.toml");
        std::fs::write(&path, "[props]\nsettle_threshold_ms = -20.0\n").unwrap();

        let err = GlideConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "props.settle_threshold_ms", .. }));
    }

    #[test]
    fn test_unknown_backend_is_ignored() {
        let mut config = GlideConfig::default();
        config.merge_with_vars(|name| (name == "GLIDE_BACKEND").then(|| "metal".to_string()));
        assert_eq!(config.props.backend, BackendKind::Fabric);
    }
}
