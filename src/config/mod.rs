//! Configuration module for Snippetropolis.
//!
//! Handles loading settings from the config file and resolving the API key.

mod settings;

pub use settings::{
    ApiSettings, ChatSettings, GeneralSettings, IndexingSettings, SearchSettings,
    ServerSettings, Settings, SummarySettings, API_KEY_ENV,
};
