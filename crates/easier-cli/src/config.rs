use std::path::{Path, PathBuf};
use std::time::Duration;

use easier_client::client::{DEFAULT_BASE_URL, ServiceClient};
use easier_core::models::document::{DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K};
use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

/// Environment variable that overrides the configured API URL.
pub const API_URL_ENV: &str = "EASIER_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EasierConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Request timeout. Unset means no client-side timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

fn default_similarity_threshold() -> f32 {
    DEFAULT_SIMILARITY_THRESHOLD
}

impl Default for EasierConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            api_url: default_api_url(),
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            timeout_secs: None,
        }
    }
}

impl EasierConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Set one key from its textual form, validating the value.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> eyre::Result<()> {
        let value = value.trim();
        match key {
            ConfigKey::ApiUrl => {
                ServiceClient::new(value, None)?;
                self.api_url = value.trim_end_matches('/').to_string();
            }
            ConfigKey::TopK => {
                let top_k: u32 = value
                    .parse()
                    .map_err(|e| eyre::eyre!("top_k must be a positive integer: {e}"))?;
                if top_k == 0 {
                    return Err(eyre::eyre!("top_k must be at least 1"));
                }
                self.top_k = top_k;
            }
            ConfigKey::SimilarityThreshold => {
                let threshold: f32 = value
                    .parse()
                    .map_err(|e| eyre::eyre!("similarity_threshold must be a number: {e}"))?;
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(eyre::eyre!("similarity_threshold must be between 0 and 1"));
                }
                self.similarity_threshold = threshold;
            }
            ConfigKey::TimeoutSecs => {
                self.timeout_secs = match value {
                    "" | "none" => None,
                    secs => Some(
                        secs.parse()
                            .map_err(|e| eyre::eyre!("timeout_secs must be whole seconds: {e}"))?,
                    ),
                };
            }
        }
        Ok(())
    }
}

/// Keys accepted by `easier config set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum ConfigKey {
    ApiUrl,
    TopK,
    SimilarityThreshold,
    TimeoutSecs,
}

/// API URL in order of precedence: command-line flag, environment, config
/// file.
pub fn resolve_api_url(flag: Option<&str>, env: Option<&str>, config: &EasierConfig) -> String {
    flag.or(env)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(&config.api_url)
        .to_string()
}

/// `<config dir>/easier/config.json`.
pub fn default_config_path() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("easier").join("config.json"))
}

/// Load the config at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> eyre::Result<EasierConfig> {
    if !path.exists() {
        return Ok(EasierConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: EasierConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update easier."
        ));
    }

    // v0 → v1: the service address was stored as `base_url`.
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        if let Some(url) = obj.remove("base_url") {
            obj.entry("api_url").or_insert(url);
        }
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (base_url renamed to api_url)");
    }

    Ok(json)
}

pub fn save_config(path: &Path, config: &EasierConfig) -> eyre::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| eyre::eyre!("config path has no parent directory"))?;
    std::fs::create_dir_all(dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let json = serde_json::to_string_pretty(&stamped)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
