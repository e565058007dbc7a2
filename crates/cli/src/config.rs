//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use social_state_adapters::feed::{DUMMYJSON_BASE_URL, JSONPLACEHOLDER_BASE_URL};
use social_state_adapters::snapshot::DEFAULT_NAMESPACE;
use social_state_domain::SourceTag;
use social_state_domain::policy::ComposePolicy;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub compose: ComposeConfig,
}

/// Where the durable record lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    File,
    Sqlite,
    /// Nothing outlives the process
    Memory,
}

/// Where feed pages come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedProvider {
    Http,
    /// Canned posts, no network
    Stub,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_state_backend")]
    pub state_backend: StateBackend,

    /// JSON file for the `file` backend, database file for `sqlite`
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    #[serde(default = "default_namespace")]
    pub state_namespace: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_flush_debounce_ms")]
    pub flush_debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_provider")]
    pub provider: FeedProvider,

    #[serde(default = "default_sources")]
    pub sources: Vec<SourceTag>,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    #[serde(default = "default_jsonplaceholder_base_url")]
    pub jsonplaceholder_base_url: String,

    #[serde(default = "default_dummyjson_base_url")]
    pub dummyjson_base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub offline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Signed-in viewer
    #[serde(default = "default_viewer_id")]
    pub viewer_id: Option<u64>,

    /// Run signed out; every mutation is refused
    #[serde(default)]
    pub anonymous: bool,
}

impl IdentityConfig {
    pub fn viewer(&self) -> Option<u64> {
        if self.anonymous { None } else { self.viewer_id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    #[serde(default)]
    pub min_title_chars: Option<usize>,

    #[serde(default)]
    pub min_body_chars: Option<usize>,

    #[serde(default)]
    pub max_title_chars: Option<usize>,

    #[serde(default)]
    pub max_body_chars: Option<usize>,

    #[serde(default = "default_true")]
    pub extract_hashtags: bool,
}

// Default value functions
fn default_state_backend() -> StateBackend {
    StateBackend::File
}

fn default_state_path() -> PathBuf {
    PathBuf::from("./social-state.json")
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_flush_debounce_ms() -> u64 {
    250
}

fn default_feed_provider() -> FeedProvider {
    FeedProvider::Http
}

fn default_sources() -> Vec<SourceTag> {
    SourceTag::ALL.to_vec()
}

fn default_page_size() -> u32 {
    10
}

fn default_max_pages() -> u32 {
    1
}

fn default_jsonplaceholder_base_url() -> String {
    JSONPLACEHOLDER_BASE_URL.to_string()
}

fn default_dummyjson_base_url() -> String {
    DUMMYJSON_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_viewer_id() -> Option<u64> {
    Some(1)
}

fn default_true() -> bool {
    true
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_backend: default_state_backend(),
            state_path: default_state_path(),
            state_namespace: default_namespace(),
            log_level: default_log_level(),
            flush_debounce_ms: default_flush_debounce_ms(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            provider: default_feed_provider(),
            sources: default_sources(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            jsonplaceholder_base_url: default_jsonplaceholder_base_url(),
            dummyjson_base_url: default_dummyjson_base_url(),
            timeout_secs: default_timeout(),
            offline: false,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            viewer_id: default_viewer_id(),
            anonymous: false,
        }
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            min_title_chars: None,
            min_body_chars: None,
            max_title_chars: None,
            max_body_chars: None,
            extract_hashtags: default_true(),
        }
    }
}

impl ComposeConfig {
    pub fn policy(&self) -> ComposePolicy {
        ComposePolicy {
            min_title_chars: self.min_title_chars,
            min_body_chars: self.min_body_chars,
            max_title_chars: self.max_title_chars,
            max_body_chars: self.max_body_chars,
            extract_hashtags: self.extract_hashtags,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("SOCIAL_STATE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# social-state configuration

[general]
state_backend = "file"  # file, sqlite, memory
state_path = "./social-state.json"
state_namespace = "social-state"
log_level = "info"
# Writes within this window collapse into one
flush_debounce_ms = 250

[feed]
provider = "http"  # http, stub
sources = ["jsonplaceholder", "dummyjson"]
page_size = 10
max_pages = 1
jsonplaceholder_base_url = "https://jsonplaceholder.typicode.com"
dummyjson_base_url = "https://dummyjson.com"
timeout_secs = 15
offline = false

[identity]
viewer_id = 1
anonymous = false  # true refuses every mutation

[compose]
min_title_chars = 5
min_body_chars = 10
max_title_chars = 100
# max_body_chars = 2000
extract_hashtags = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();

        assert_eq!(config.general.state_backend, StateBackend::File);
        assert_eq!(config.feed.sources, SourceTag::ALL.to_vec());
        assert_eq!(config.identity.viewer_id, Some(1));
        assert_eq!(config.compose.policy().max_title_chars, Some(100));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(config.general.flush_debounce_ms, 250);
        assert_eq!(config.feed.page_size, 10);
        assert_eq!(config.feed.provider, FeedProvider::Http);
        assert!(config.compose.extract_hashtags);
        assert_eq!(config.compose.min_title_chars, None);
    }

    #[test]
    fn test_memory_backend_and_stub_provider_parse() {
        let config: AppConfig =
            toml::from_str("[general]\nstate_backend = \"memory\"\n\n[feed]\nprovider = \"stub\"\n")
                .unwrap();

        assert_eq!(config.general.state_backend, StateBackend::Memory);
        assert_eq!(config.feed.provider, FeedProvider::Stub);
    }

    #[test]
    fn test_anonymous_overrides_viewer() {
        let config: AppConfig = toml::from_str("[identity]\nviewer_id = 4\nanonymous = true\n").unwrap();

        assert_eq!(config.identity.viewer_id, Some(4));
        assert_eq!(config.identity.viewer(), None);
    }
}
