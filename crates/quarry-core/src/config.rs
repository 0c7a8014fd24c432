//! Client configuration, loaded once from a TOML file.
//!
//! Each section has serde defaults so a partial file works. Path fields may
//! use `~/` shorthand, expanded from `$HOME` at load time. The loaded value
//! is an explicit context object: callers hold it in an `Arc` and pass it to
//! constructors, so independent client instances (and tests) never share
//! hidden module state.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::errors::{QuarryError, QuarryResult};

/// Top-level configuration. Immutable after load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryConfig {
    pub model: ModelConfig,
    pub cache: CacheConfig,
    pub api: ApiConfig,
    pub defaults: DefaultsConfig,
}

/// Embedding model selection and local asset storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name, resolved against the set of supported 768-dim models.
    pub name: String,
    /// Directory where downloaded model assets live.
    pub cache_dir: PathBuf,
}

/// On-disk result-cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false, lookups and inserts are no-ops (clearing still works).
    pub enabled: bool,
    /// Path of the single-file JSON cache document.
    pub path: PathBuf,
    /// Entry lifetime in hours.
    pub ttl_hours: f64,
}

/// Remote backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, without a trailing slash.
    pub url: String,
    /// Per-request timeout, enforced by cancellation.
    pub timeout_ms: u64,
}

/// Fallback values for caller-optional request fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Result limit used when a search call does not specify one.
    pub limit: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: constants::DEFAULT_MODEL_NAME.to_string(),
            cache_dir: PathBuf::from(constants::DEFAULT_MODEL_CACHE_DIR),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(constants::DEFAULT_CACHE_PATH),
            ttl_hours: constants::DEFAULT_CACHE_TTL_HOURS,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_API_URL.to_string(),
            timeout_ms: constants::DEFAULT_API_TIMEOUT_MS,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            limit: constants::DEFAULT_RESULT_LIMIT,
        }
    }
}

impl QuarryConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// `ConfigMissing` if the file does not exist, `ConfigInvalid` if it
    /// cannot be read or parsed.
    pub fn load(path: &Path) -> QuarryResult<Self> {
        if !path.exists() {
            return Err(QuarryError::ConfigMissing {
                path: path.display().to_string(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| QuarryError::ConfigInvalid {
            reason: format!("unable to read {}: {e}", path.display()),
        })?;
        Self::from_toml(&text)
    }

    /// Parse configuration from a TOML string. Absent sections and fields
    /// fall back to defaults; `~`-prefixed paths are expanded.
    pub fn from_toml(text: &str) -> QuarryResult<Self> {
        let mut config: QuarryConfig =
            toml::from_str(text).map_err(|e| QuarryError::ConfigInvalid {
                reason: e.to_string(),
            })?;
        config.expand_paths();
        Ok(config)
    }

    /// Cache entry lifetime in milliseconds.
    pub fn ttl_millis(&self) -> i64 {
        (self.cache.ttl_hours * 3_600_000.0) as i64
    }

    fn expand_paths(&mut self) {
        self.model.cache_dir = expand_home(&self.model.cache_dir);
        self.cache.path = expand_home(&self.cache.path);
    }
}

/// Expand a leading `~` component using `$HOME`. Paths without the shorthand
/// (or when `$HOME` is unset) pass through unchanged.
fn expand_home(path: &Path) -> PathBuf {
    let Some(rest) = path.to_str().and_then(|s| s.strip_prefix('~')) else {
        return path.to_path_buf();
    };
    let Some(home) = env::var_os("HOME") else {
        return path.to_path_buf();
    };
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    if rest.is_empty() {
        PathBuf::from(home)
    } else {
        PathBuf::from(home).join(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_home_leaves_absolute_paths_alone() {
        let path = Path::new("/var/cache/quarry");
        assert_eq!(expand_home(path), PathBuf::from("/var/cache/quarry"));
    }

    #[test]
    fn expand_home_resolves_tilde_prefix() {
        if let Some(home) = env::var_os("HOME") {
            let expanded = expand_home(Path::new("~/x/y"));
            assert_eq!(expanded, PathBuf::from(home).join("x/y"));
        }
    }

    #[test]
    fn ttl_millis_converts_fractional_hours() {
        let mut config = QuarryConfig::default();
        config.cache.ttl_hours = 0.5;
        assert_eq!(config.ttl_millis(), 1_800_000);
    }
}
