//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/groupsplit/groupsplit.toml`
//! 3. Local config: `<dir>/.groupsplit.toml` (usually the working directory)
//! 4. Environment variables: `GROUPSPLIT_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

/// Largest number of decimals accepted for amount display.
const MAX_PRECISION: usize = 12;

/// Unified configuration for groupsplit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Relative epsilon for zero-sum checks and settled balances, scaled by ledger size (default: 1e-9)
    pub tolerance: f64,
    /// Decimals shown for amounts (default: 2)
    pub precision: usize,
    /// Prefix for displayed amounts (default: "$")
    pub currency_symbol: String,
    /// Session file used when none is given on the command line
    pub session_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            precision: 2,
            currency_symbol: "$".into(),
            session_file: None,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified, inherit").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub tolerance: Option<f64>,
    pub precision: Option<usize>,
    pub currency_symbol: Option<String>,
    pub session_file: Option<PathBuf>,
}

/// Get the XDG config directory for groupsplit.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "groupsplit").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("groupsplit.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".groupsplit.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; the input is kept if expansion fails.
fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            tolerance: overlay.tolerance.unwrap_or(self.tolerance),
            precision: overlay.precision.unwrap_or(self.precision),
            currency_symbol: overlay
                .currency_symbol
                .clone()
                .unwrap_or_else(|| self.currency_symbol.clone()),
            session_file: overlay
                .session_file
                .clone()
                .or_else(|| self.session_file.clone()),
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.session_file {
            let expanded = expand_env_vars(path.to_string_lossy().as_ref());
            self.session_file = Some(PathBuf::from(expanded));
        }
    }

    /// Reject values the ledger cannot work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ApplicationError::Config {
                message: format!("tolerance must be a positive number, got {}", self.tolerance),
            });
        }
        if self.precision > MAX_PRECISION {
            return Err(ApplicationError::Config {
                message: format!(
                    "precision must be at most {MAX_PRECISION}, got {}",
                    self.precision
                ),
            });
        }
        Ok(())
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.groupsplit.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/groupsplit/groupsplit.toml`
    /// 3. Local config: `<local_dir>/.groupsplit.toml`
    /// 4. Environment variables: `GROUPSPLIT_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("load: global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("load: local config {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply GROUPSPLIT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("GROUPSPLIT").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_float("tolerance") {
            settings.tolerance = val;
        }
        if let Ok(val) = config.get_int("precision") {
            settings.precision = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("precision must not be negative, got {val}"),
            })?;
        }
        if let Ok(val) = config.get_string("currency_symbol") {
            settings.currency_symbol = val;
        }
        if let Ok(val) = config.get_string("session_file") {
            settings.session_file = Some(PathBuf::from(val));
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# groupsplit configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/groupsplit/groupsplit.toml
#   Local:  ./.groupsplit.toml
#   Env:    GROUPSPLIT_* environment variables (e.g. GROUPSPLIT_PRECISION=0)

# Relative epsilon for zero-sum checks, scaled by the ledger's total amounts;
# balances closer to zero count as settled
# tolerance = 1e-9

# Decimals shown for amounts
# precision = 2

# Prefix for displayed amounts
# currency_symbol = "$"

# Session file used when --session is not given
# session_file = "~/trips/current.toml"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
