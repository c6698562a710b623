use crate::dto::SummaryResponse;
use crate::error::Result;
use crate::normalize::normalize_ai_text;
use crate::sections::{extract_sections, AnalysisSections};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// What the UI shows for one AI summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum SummaryView {
    /// Categorized bullet lists, at least one of them non-empty.
    Sections(AnalysisSections),
    /// No usable labels; the cleaned text as a paragraph.
    Prose(String),
    Empty,
}

impl SummaryView {
    pub fn from_raw(raw: &str) -> SummaryView {
        if let Some(sections) = extract_sections(raw) {
            let normalized = sections.normalized();
            if !normalized.is_empty() {
                return SummaryView::Sections(normalized);
            }
        }

        let prose = normalize_ai_text(raw);
        if prose.is_empty() {
            SummaryView::Empty
        } else {
            SummaryView::Prose(prose)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SummaryView::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub survey_id: i64,
    pub kind: String,
    /// Responses the backend summarized.
    pub response_count: u64,
    pub view: SummaryView,
    pub raw_summary: String,
    pub generated_at: String,
}

impl AnalysisResult {
    pub fn from_summary(survey_id: i64, kind: &str, response: &SummaryResponse) -> AnalysisResult {
        let view = if response.is_empty() {
            SummaryView::Empty
        } else {
            SummaryView::from_raw(&response.summary)
        };

        AnalysisResult {
            id: Uuid::new_v4().to_string(),
            survey_id,
            kind: kind.to_string(),
            response_count: response.count,
            view,
            raw_summary: response.summary.clone(),
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

// ── Freshness cache ──

/// Remembers which response count a result was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub last_response_count: u64,
    pub last_result: AnalysisResult,
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Decides whether a stored analysis is still valid for the survey's
/// current number of responses.
pub struct FreshnessCache<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> FreshnessCache<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn cache_key(survey_id: i64, kind: &str) -> String {
        format!("analysis:{}:{}", survey_id, kind)
    }

    /// The cached result, only if it was computed for `current_response_count`.
    pub fn lookup(
        &self,
        survey_id: i64,
        kind: &str,
        current_response_count: u64,
    ) -> Result<Option<AnalysisResult>> {
        let key = Self::cache_key(survey_id, kind);
        let Some(raw) = self.store.get(&key)? else {
            debug!("Cache miss for {}", key);
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                return Ok(None);
            }
        };

        if entry.last_response_count == current_response_count {
            debug!("Cache hit for {} at {} responses", key, current_response_count);
            Ok(Some(entry.last_result))
        } else {
            debug!(
                "Cache stale for {}: cached at {} responses, now {}",
                key, entry.last_response_count, current_response_count
            );
            Ok(None)
        }
    }

    pub fn store(&self, response_count: u64, result: &AnalysisResult) -> Result<()> {
        let entry = CacheEntry {
            last_response_count: response_count,
            last_result: result.clone(),
        };
        let key = Self::cache_key(result.survey_id, &result.kind);
        self.store.put(&key, &serde_json::to_string(&entry)?)
    }

    pub fn invalidate(&self, survey_id: i64, kind: &str) -> Result<()> {
        self.store.remove(&Self::cache_key(survey_id, kind))
    }
}
