//! Doctor command - verify configuration and API connectivity.

use crate::api::{TwelveLabsClient, VideoApi};
use crate::cli::Output;
use crate::config::{Settings, API_KEY_ENV};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Snippetropolis Doctor");
    println!();
    println!("Checking configuration and API access...\n");

    let mut checks = Vec::new();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    println!("{}", style("API").bold());
    let key_check = check_api_key(settings);
    key_check.print();
    let has_key = key_check.status == CheckStatus::Ok;
    checks.push(key_check);

    if has_key {
        let api_check = check_connectivity(settings).await;
        api_check.print();
        checks.push(api_check);
    }

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Snippetropolis.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Snippetropolis is ready to use.");
    }

    Ok(())
}

/// Check that an API key is available, without printing it.
fn check_api_key(settings: &Settings) -> CheckResult {
    match settings.api_key() {
        Ok(key) => CheckResult::ok(API_KEY_ENV, &format!("configured ({})", mask(&key))),
        Err(_) => CheckResult::error(
            API_KEY_ENV,
            "not set",
            &format!("Set with: export {}='tlk_...' (or add it to .env)", API_KEY_ENV),
        ),
    }
}

/// List indexes to check connectivity.
async fn check_connectivity(settings: &Settings) -> CheckResult {
    let client = match TwelveLabsClient::from_settings(settings) {
        Ok(client) => client,
        Err(e) => return CheckResult::error("API connection", &e.to_string(), "Check api.base_url"),
    };

    match client.list_indexes().await {
        Ok(indexes) if indexes.is_empty() => CheckResult::warning(
            "API connection",
            &format!("reachable at {}, no indexes", settings.api.base_url),
            "Create one with: snippetropolis create-index <name>",
        ),
        Ok(indexes) => CheckResult::ok(
            "API connection",
            &format!("{} index(es) available", indexes.len()),
        ),
        Err(e) => CheckResult::error(
            "API connection",
            &e.to_string(),
            "Check the API key and api.base_url",
        ),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: snippetropolis config set server.port 8501",
        )
    }
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}...", visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_missing_config_file_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_config_file(&dir.path().join("config.toml"));
        assert_eq!(result.status, CheckStatus::Warning);
    }

    #[tokio::test]
    async fn test_connectivity_reports_index_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.3/indexes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "_id": "ix1", "index_name": "Talks" }]
            })))
            .mount(&server)
            .await;

        let mut settings = Settings::default();
        settings.api.base_url = format!("{}/v1.3", server.uri());
        settings.api.api_key = Some("tlk_test".to_string());

        let result = check_connectivity(&settings).await;
        assert_eq!(result.status, CheckStatus::Ok);
        assert_eq!(result.message, "1 index(es) available");
    }

    #[tokio::test]
    async fn test_connectivity_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.3/indexes"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Invalid API key"
            })))
            .mount(&server)
            .await;

        let mut settings = Settings::default();
        settings.api.base_url = format!("{}/v1.3", server.uri());
        settings.api.api_key = Some("bad".to_string());

        let result = check_connectivity(&settings).await;
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.message.contains("Invalid API key"));
    }
}
