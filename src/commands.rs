use crate::analysis::{AnalysisResult, FreshnessCache, SummaryView};
use crate::client::{AnalysisBackend, AnalysisJob, BackendClient};
use crate::config::{self, AppConfig};
use crate::db::{AnalysisRecord, Database};
use crate::error::Result;
use crate::fragments::normalize_ai_text_array;
use crate::normalize::normalize_ai_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

pub struct AppState {
    pub db: Database,
    pub app_data_dir: PathBuf,
    pub config: AppConfig,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SettingsResponse {
    pub api_base_url: String,
    pub api_token_set: bool,
    pub api_token_preview: String,
    pub request_timeout_secs: u64,
    pub summary_kind: String,
}

/// Fields left as `None` keep their saved value.
#[derive(Debug, Default, Clone)]
pub struct SettingsUpdate {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

// ── Offline normalization ──

pub fn normalize_text(raw: &str) -> String {
    normalize_ai_text(raw)
}

pub fn normalize_items(items: &[String]) -> Vec<String> {
    normalize_ai_text_array(items)
}

pub fn analyze_text(raw: &str) -> SummaryView {
    SummaryView::from_raw(raw)
}

// ── Survey summaries ──

/// Returns the cached summary while the survey's response count is unchanged,
/// otherwise asks the backend for a new one.
pub async fn get_survey_summary<B: AnalysisBackend>(
    state: &AppState,
    backend: &B,
    survey_id: i64,
    force_refresh: bool,
) -> Result<AnalysisResult> {
    let kind = state.config.summary_kind.as_str();
    let current_count = backend.response_count(survey_id).await?;
    let cache = FreshnessCache::new(&state.db);

    if !force_refresh {
        if let Some(cached) = cache.lookup(survey_id, kind, current_count)? {
            info!("Survey {} unchanged at {} responses, using cached summary", survey_id, current_count);
            return Ok(cached);
        }
    }

    let response = backend.summarize(survey_id).await?;
    let result = AnalysisResult::from_summary(survey_id, kind, &response);

    // Failed or blank summaries are not worth remembering.
    if !result.view.is_empty() {
        cache.store(current_count, &result)?;
        state.db.record_analysis(&result)?;
    }

    Ok(result)
}

pub async fn get_latest_summary<B: AnalysisBackend>(
    backend: &B,
    survey_id: i64,
    kind: &str,
) -> Result<AnalysisResult> {
    let response = backend.latest_analysis(survey_id, kind).await?;
    Ok(AnalysisResult::from_summary(survey_id, kind, &response))
}

pub async fn run_backend_analysis(client: &BackendClient, survey_id: i64, job: AnalysisJob) -> Result<Value> {
    client.run_analysis(survey_id, job).await
}

pub fn get_analysis_history(state: &AppState, survey_id: i64) -> Result<Vec<AnalysisRecord>> {
    state.db.get_analysis_history(survey_id)
}

pub fn clear_cached_summary(state: &AppState, survey_id: i64) -> Result<()> {
    FreshnessCache::new(&state.db).invalidate(survey_id, &state.config.summary_kind)?;
    state.db.delete_analysis_history(survey_id)?;
    info!("Cleared cached summary for survey {}", survey_id);
    Ok(())
}

// ── Settings ──

pub fn get_settings(state: &AppState) -> SettingsResponse {
    let config = &state.config;
    SettingsResponse {
        api_base_url: config.api_base_url.clone(),
        api_token_set: !config.api_token.is_empty(),
        api_token_preview: config.token_preview(),
        request_timeout_secs: config.request_timeout_secs,
        summary_kind: config.summary_kind.clone(),
    }
}

/// Saves the file-backed config. Environment overrides are not persisted.
pub fn save_settings(state: &mut AppState, update: SettingsUpdate) -> Result<()> {
    let mut saved = config::load_config(&state.app_data_dir);
    if let Some(url) = update.api_base_url {
        saved.api_base_url = url.trim().to_string();
    }
    if let Some(token) = update.api_token {
        saved.api_token = token.trim().to_string();
    }
    if let Some(timeout) = update.request_timeout_secs {
        saved.request_timeout_secs = timeout;
    }

    config::save_config(&state.app_data_dir, &saved)?;
    state.config = saved.apply_env_overrides();
    Ok(())
}
