use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const API_URL_ENV: &str = "SURVEY_INSIGHT_API_URL";
pub const API_TOKEN_ENV: &str = "SURVEY_INSIGHT_API_TOKEN";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_summary_kind")]
    pub summary_kind: String,
}

fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

// The AI endpoints can take minutes on large surveys.
fn default_request_timeout_secs() -> u64 {
    600
}

fn default_summary_kind() -> String {
    "summary".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            summary_kind: default_summary_kind(),
        }
    }
}

impl AppConfig {
    /// Environment variables win over the config file.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.api_token = token.trim().to_string();
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api_base_url must start with http:// or https://, got {:?}",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config("request_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// First and last few characters of the token, for display.
    pub fn token_preview(&self) -> String {
        let chars: Vec<char> = self.api_token.chars().collect();
        if chars.len() > 8 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        } else if chars.is_empty() {
            String::new()
        } else {
            "****".to_string()
        }
    }
}

pub fn default_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("survey-insight")
}

pub fn get_config_path(app_data_dir: &Path) -> PathBuf {
    app_data_dir.join("config.json")
}

pub fn load_config(app_data_dir: &Path) -> AppConfig {
    let path = get_config_path(app_data_dir);
    match fs::read_to_string(&path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable config at {}: {}", path.display(), e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

pub fn save_config(app_data_dir: &Path, config: &AppConfig) -> Result<()> {
    config.validate()?;
    let path = get_config_path(app_data_dir);
    fs::create_dir_all(app_data_dir)?;
    let content = serde_json::to_string_pretty(config)?;
    fs::write(&path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn unit_load_config_returns_default_when_file_missing() {
        let dir = tempdir().expect("temp directory should exist");

        let loaded = load_config(dir.path());

        assert_eq!(loaded, AppConfig::default());
        assert_eq!(loaded.api_base_url, "http://localhost:8080");
        assert_eq!(loaded.request_timeout_secs, 600);
    }

    #[test]
    fn unit_load_config_fills_missing_fields_and_survives_garbage() {
        let dir = tempdir().expect("temp directory should exist");
        fs::write(get_config_path(dir.path()), r#"{"api_token": "abc"}"#).expect("config should write");
        let loaded = load_config(dir.path());
        assert_eq!(loaded.api_token, "abc");
        assert_eq!(loaded.summary_kind, "summary");

        fs::write(get_config_path(dir.path()), "not-json").expect("config should write");
        assert_eq!(load_config(dir.path()), AppConfig::default());
    }

    #[test]
    fn integration_save_and_load_config_round_trip() {
        let dir = tempdir().expect("temp directory should exist");
        let app_data_dir = dir.path().join("nested");

        let config = AppConfig {
            api_base_url: "https://survey.example.com".to_string(),
            api_token: "token-1234567890".to_string(),
            request_timeout_secs: 30,
            summary_kind: "summary".to_string(),
        };

        save_config(&app_data_dir, &config).expect("config should save");
        let loaded = load_config(&app_data_dir);

        assert_eq!(loaded, config);
    }

    #[test]
    fn unit_save_config_rejects_invalid_url() {
        let dir = tempdir().expect("temp directory should exist");
        let config = AppConfig {
            api_base_url: "localhost:8080".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(save_config(dir.path(), &config), Err(AppError::Config(_))));
        assert!(!get_config_path(dir.path()).exists());
    }

    #[test]
    fn unit_token_preview_hides_the_middle() {
        let mut config = AppConfig::default();
        assert_eq!(config.token_preview(), "");
        config.api_token = "short".to_string();
        assert_eq!(config.token_preview(), "****");
        config.api_token = "abcd-secret-wxyz".to_string();
        assert_eq!(config.token_preview(), "abcd...wxyz");
    }
}
