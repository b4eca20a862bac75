//! Configuration loading and resolution
//!
//! Bootstrap configuration is a single TOML document. Every field carries a
//! built-in default, so a missing file never prevents startup.
//!
//! # Resolution Priority
//!
//! 1. Command-line `--config` path (highest priority)
//! 2. `DOSHA_CONFIG` environment variable
//! 3. Platform config file (`~/.config/dosha/config.toml` on Linux)
//! 4. Compiled defaults (fallback)
//!
//! `DOSHA_LOG_LEVEL` overrides `logging.level` regardless of where the file
//! came from.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DOSHA_CONFIG";

/// Environment variable overriding the configured log level
pub const LOG_LEVEL_ENV_VAR: &str = "DOSHA_LOG_LEVEL";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Default per-modality fusion weights
    #[serde(default)]
    pub fusion: FusionSettings,

    /// Pulse feature extraction parameters
    #[serde(default)]
    pub pulse: PulseSettings,

    /// External analyzer call settings
    #[serde(default)]
    pub analyzers: AnalyzerSettings,

    /// Feature cache settings
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Default modality weights
///
/// Tongue diagnosis carries the most weight, pulse is secondary and
/// self-reported symptoms are supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionSettings {
    #[serde(default = "default_tongue_weight")]
    pub tongue: f64,
    #[serde(default = "default_pulse_weight")]
    pub pulse: f64,
    #[serde(default = "default_symptoms_weight")]
    pub symptoms: f64,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            tongue: default_tongue_weight(),
            pulse: default_pulse_weight(),
            symptoms: default_symptoms_weight(),
        }
    }
}

/// Pulse feature extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseSettings {
    /// Sampling rate assumed when a request does not state one (Hz)
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,

    /// Heart rate reported for degenerate signals without an override (bpm)
    #[serde(default = "default_heart_rate")]
    pub default_heart_rate: f64,

    /// Minimum peak prominence; zero disables prominence filtering
    #[serde(default = "default_min_prominence")]
    pub min_prominence: f64,

    /// Minimum sample count for the advisory signal quality check
    #[serde(default = "default_min_signal_length")]
    pub min_signal_length: usize,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            sampling_rate: default_sampling_rate(),
            default_heart_rate: default_heart_rate(),
            min_prominence: default_min_prominence(),
            min_signal_length: default_min_signal_length(),
        }
    }
}

/// External analyzer call settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// Per-analyzer timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Feature cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Maximum in-memory entries
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Optional on-disk cache directory
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Age after which on-disk entries are purged
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_entries: default_max_entries(),
            dir: None,
            max_age_days: default_max_age_days(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tongue_weight() -> f64 {
    0.50
}

fn default_pulse_weight() -> f64 {
    0.30
}

fn default_symptoms_weight() -> f64 {
    0.20
}

fn default_sampling_rate() -> f64 {
    125.0
}

fn default_heart_rate() -> f64 {
    70.0
}

fn default_min_prominence() -> f64 {
    0.1
}

fn default_min_signal_length() -> usize {
    500
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_cache_enabled() -> bool {
    true
}

fn default_max_entries() -> usize {
    256
}

fn default_max_age_days() -> u64 {
    7
}

/// Where the resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    PlatformFile(PathBuf),
    CompiledDefaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CommandLine(p) => write!(f, "command line ({})", p.display()),
            ConfigSource::Environment(p) => write!(f, "{} ({})", CONFIG_ENV_VAR, p.display()),
            ConfigSource::PlatformFile(p) => write!(f, "platform config ({})", p.display()),
            ConfigSource::CompiledDefaults => write!(f, "compiled defaults"),
        }
    }
}

/// Resolved configuration with provenance
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

/// Configuration resolver following the priority order in the module docs
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the command-line config path (highest priority)
    pub fn with_cli_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_path = path;
        self
    }

    /// Resolve the configuration
    ///
    /// Explicitly named files (CLI or environment) that are missing fall back
    /// to defaults with a warning. A file that exists but does not parse is an
    /// error: silently ignoring a malformed weight table would change results.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let (candidate, source) = if let Some(path) = &self.cli_path {
            (Some(path.clone()), ConfigSource::CommandLine(path.clone()))
        } else if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            (Some(path.clone()), ConfigSource::Environment(path))
        } else if let Some(path) = platform_config_path().filter(|p| p.exists()) {
            (Some(path.clone()), ConfigSource::PlatformFile(path))
        } else {
            (None, ConfigSource::CompiledDefaults)
        };

        let (mut config, source) = match candidate {
            Some(path) if path.exists() => {
                let config = load_toml_config(&path)?;
                info!("Loaded configuration from {}", source);
                (config, source)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                (TomlConfig::default(), ConfigSource::CompiledDefaults)
            }
            None => (TomlConfig::default(), ConfigSource::CompiledDefaults),
        };

        if let Ok(level) = std::env::var(LOG_LEVEL_ENV_VAR) {
            if !level.trim().is_empty() {
                config.logging.level = level.trim().to_string();
            }
        }

        Ok(ResolvedConfig { config, source })
    }
}

/// Platform config file path (`<config_dir>/dosha/config.toml`)
pub fn platform_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dosha").join("config.toml"))
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Write a TOML config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Write the compiled defaults as a starting config file
///
/// Targets `path`, or the platform config path when `None`. An existing file
/// is left alone unless `overwrite` is set. Returns the path written.
pub fn write_default_config(path: Option<&Path>, overwrite: bool) -> Result<PathBuf> {
    let target = match path {
        Some(p) => p.to_path_buf(),
        None => platform_config_path()
            .ok_or_else(|| Error::Config("No platform config directory".to_string()))?,
    };
    if target.exists() && !overwrite {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            target.display()
        )));
    }

    write_toml_config(&TomlConfig::default(), &target)?;
    info!("Wrote default configuration to {}", target.display());
    Ok(target)
}
