//! Dashboard configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/pulse/config.toml) when it exists
//! 2. Embedded defaults (compiled into binary)
//!
//! Environment variables are applied last:
//! - `PULSE_NARRATIVE_BACKEND`: narrative backend (ollama, mock)
//! - `OLLAMA_HOST`: narrative server URL
//! - `OLLAMA_MODEL`: narrative model name
//!
//! Insight thresholds and the inactivity cutoff are not configurable.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ranking::DEFAULT_RANKING_LIMIT;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/pulse.toml");

const DEFAULT_HOST: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which narrative backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeBackendKind {
    Ollama,
    Mock,
}

impl NarrativeBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeBackendKind::Ollama => "ollama",
            NarrativeBackendKind::Mock => "mock",
        }
    }
}

impl fmt::Display for NarrativeBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NarrativeBackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(NarrativeBackendKind::Ollama),
            "mock" => Ok(NarrativeBackendKind::Mock),
            _ => Err(format!("Unknown narrative backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportConfig {
    /// Entries kept per ranking
    pub ranking_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            ranking_limit: DEFAULT_RANKING_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeConfig {
    pub enabled: bool,
    pub backend: NarrativeBackendKind,
    pub host: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl NarrativeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: NarrativeBackendKind::Ollama,
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Resolved configuration for one process
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardConfig {
    pub report: ReportConfig,
    pub narrative: NarrativeConfig,
    /// File the settings came from, `None` for embedded defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl DashboardConfig {
    /// Load configuration and apply environment overrides
    ///
    /// An explicit path must exist. Without one, the data dir override is
    /// used when present and the embedded defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (content, source) = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                (read_config(path)?, Some(path.to_path_buf()))
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => (read_config(&path)?, Some(path)),
                None => (DEFAULT_CONFIG.to_string(), None),
            },
        };

        let mut config = Self::from_toml(&content)?;
        config.source = source;
        config.apply_overrides(|key| std::env::var(key).ok());

        tracing::debug!(
            source = %config.source_label(),
            ranking_limit = config.report.ranking_limit,
            narrative = config.narrative.enabled,
            backend = %config.narrative.backend,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Parse configuration from TOML, filling unset keys with defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = DashboardConfig::default();

        if let Some(report) = raw.report {
            if let Some(limit) = report.ranking_limit {
                if limit == 0 {
                    return Err(Error::Config(
                        "report.ranking_limit must be at least 1".to_string(),
                    ));
                }
                config.report.ranking_limit = limit;
            }
        }

        if let Some(narrative) = raw.narrative {
            if let Some(enabled) = narrative.enabled {
                config.narrative.enabled = enabled;
            }
            if let Some(backend) = narrative.backend {
                config.narrative.backend = backend.parse().map_err(Error::Config)?;
            }
            if let Some(host) = narrative.host {
                config.narrative.host = host;
            }
            if let Some(model) = narrative.model {
                config.narrative.model = model;
            }
            if let Some(timeout) = narrative.timeout_secs {
                if timeout == 0 {
                    return Err(Error::Config(
                        "narrative.timeout_secs must be at least 1".to_string(),
                    ));
                }
                config.narrative.timeout_secs = timeout;
            }
        }

        Ok(config)
    }

    /// Apply environment-style overrides from a lookup function
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("PULSE_NARRATIVE_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.narrative.backend = kind,
                Err(e) => {
                    tracing::warn!(backend = %backend, error = %e, "Ignoring PULSE_NARRATIVE_BACKEND")
                }
            }
        }
        if let Some(host) = lookup("OLLAMA_HOST").filter(|h| !h.is_empty()) {
            self.narrative.host = host;
        }
        if let Some(model) = lookup("OLLAMA_MODEL").filter(|m| !m.is_empty()) {
            self.narrative.model = model;
        }
    }

    pub fn source_label(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "embedded defaults".to_string(),
        }
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to render config: {}", e)))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pulse").join("config.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config {}: {}",
            path.display(),
            e
        ))
    })
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    report: Option<RawReport>,
    narrative: Option<RawNarrative>,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    ranking_limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawNarrative {
    enabled: Option<bool>,
    backend: Option<String>,
    host: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_parse_default_config() {
        let config = DashboardConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.report.ranking_limit, 5);
        assert!(!config.narrative.enabled);
        assert_eq!(config.narrative.backend, NarrativeBackendKind::Ollama);
        assert_eq!(config.narrative.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_embedded_defaults_match_default_impl() {
        let parsed = DashboardConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, DashboardConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = DashboardConfig::from_toml(
            r#"
            [narrative]
            enabled = true
            backend = "mock"
            "#,
        )
        .unwrap();

        assert!(config.narrative.enabled);
        assert_eq!(config.narrative.backend, NarrativeBackendKind::Mock);
        assert_eq!(config.narrative.model, DEFAULT_MODEL);
        assert_eq!(config.report.ranking_limit, DEFAULT_RANKING_LIMIT);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DashboardConfig::from_toml("[report]\nranking_limit = 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            DashboardConfig::from_toml("[narrative]\nbackend = \"gpt\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            DashboardConfig::from_toml("[narrative]\ntimeout_secs = 0"),
            Err(Error::Config(_))
        ));
        assert!(DashboardConfig::from_toml("not = [valid").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PULSE_NARRATIVE_BACKEND", "mock"),
            ("OLLAMA_HOST", "http://10.0.0.5:11434"),
            ("OLLAMA_MODEL", "gemma3"),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.narrative.backend, NarrativeBackendKind::Mock);
        assert_eq!(config.narrative.host, "http://10.0.0.5:11434");
        assert_eq!(config.narrative.model, "gemma3");
    }

    #[test]
    fn test_unknown_backend_override_ignored() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(|key| {
            (key == "PULSE_NARRATIVE_BACKEND").then(|| "carrier-pigeon".to_string())
        });
        assert_eq!(config.narrative.backend, NarrativeBackendKind::Ollama);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[report]\nranking_limit = 3").unwrap();

        let config = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.report.ranking_limit, 3);
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = DashboardConfig::load(Some(Path::new("/nonexistent/pulse.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = DashboardConfig::default();
        config.report.ranking_limit = 8;
        let rendered = config.to_toml().unwrap();
        let parsed = DashboardConfig::from_toml(&rendered).unwrap();
        assert_eq!(parsed.report.ranking_limit, 8);
        assert_eq!(parsed.narrative, config.narrative);
    }
}
