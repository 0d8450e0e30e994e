//! Configuration settings for Snippetropolis.

use crate::api::Threshold;
use crate::error::{Result, SnipError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the video API key.
pub const API_KEY_ENV: &str = "TWELVE_LABS_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub api: ApiSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub summary: SummarySettings,
    pub chat: ChatSettings,
    pub indexing: IndexingSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Video understanding API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the API, including the version segment.
    pub base_url: String,
    /// API key. The environment variable takes precedence.
    pub api_key: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.twelvelabs.io/v1.3".to_string(),
            api_key: None,
        }
    }
}

/// Dashboard HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Sessions unused for this long are dropped with their caches.
    pub session_idle_minutes: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            session_idle_minutes: 60,
        }
    }
}

/// Search request defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum number of results per search.
    pub page_limit: u32,
    /// Minimum confidence level for results.
    pub threshold: Threshold,
    /// Modalities to search (visual, audio).
    pub options: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_limit: 10,
            threshold: Threshold::None,
            options: vec!["visual".to_string(), "audio".to_string()],
        }
    }
}

/// Summary generation policy. One policy is used everywhere in the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Summary type sent to the API (summary, chapter, highlight).
    pub summary_type: String,
    /// Instructions sent along with the summary request.
    pub prompt: Option<String>,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            summary_type: "summary".to_string(),
            prompt: Some(
                "Provide a very concise summary. Focus on the main points without unnecessary details."
                    .to_string(),
            ),
        }
    }
}

/// Chat panel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Number of previous answered exchanges included in each prompt (0 disables).
    pub context_turns: usize,
    /// Questions offered when a transcript is empty.
    pub suggestions: Vec<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            context_turns: 5,
            suggestions: vec![
                "What is this video about?".to_string(),
                "Who are the speakers?".to_string(),
                "What happens at 2:30?".to_string(),
            ],
        }
    }
}

/// Indexing CLI and video listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    /// Engines (models) enabled on newly created indexes.
    pub engines: Vec<String>,
    /// Default language code for uploaded videos.
    pub language: String,
    /// Seconds between upload task status polls.
    pub poll_interval_secs: u64,
    /// Maximum number of videos fetched per index listing.
    pub video_page_limit: u32,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            engines: vec!["marengo2.7".to_string(), "pegasus1.2".to_string()],
            language: "en".to_string(),
            poll_interval_secs: 5,
            video_page_limit: 50,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Self::expand_path(&p.to_string_lossy()),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else if path.is_some() {
            Err(SnipError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SnipError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snippetropolis")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Resolve the API key from the environment, then the config file.
    ///
    /// A missing key is fatal for every command that talks to the API.
    pub fn api_key(&self) -> Result<String> {
        self.resolve_api_key(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key(&self, from_env: Option<String>) -> Result<String> {
        from_env
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                self.api
                    .api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty())
            })
            .ok_or_else(|| {
                SnipError::Config(format!(
                    "{} not found. Add it to .env or export it as an environment variable.",
                    API_KEY_ENV
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8501);
        assert_eq!(settings.search.page_limit, 10);
        assert_eq!(settings.search.threshold, Threshold::None);
        assert_eq!(settings.summary.summary_type, "summary");
        assert_eq!(settings.indexing.poll_interval_secs, 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            port = 9000

            [search]
            threshold = "medium"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.session_idle_minutes, 60);
        assert_eq!(settings.search.threshold, Threshold::Medium);
        assert_eq!(settings.search.options, vec!["visual", "audio"]);
    }

    #[test]
    fn test_load_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.chat.context_turns = 2;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.chat.context_turns, 2);
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(matches!(
            Settings::load_from(Some(&path)),
            Err(SnipError::Config(_))
        ));
    }

    #[test]
    fn test_api_key_resolution_order() {
        let mut settings = Settings::default();
        settings.api.api_key = Some("from-file".to_string());

        assert_eq!(
            settings.resolve_api_key(Some("from-env".to_string())).unwrap(),
            "from-env"
        );
        assert_eq!(settings.resolve_api_key(Some("  ".to_string())).unwrap(), "from-file");
        assert_eq!(settings.resolve_api_key(None).unwrap(), "from-file");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let settings = Settings::default();
        let err = settings.resolve_api_key(None).unwrap_err();
        assert!(matches!(err, SnipError::Config(_)));
        assert!(err.to_string().contains(API_KEY_ENV));
    }
}
