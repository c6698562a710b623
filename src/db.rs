use crate::analysis::{AnalysisResult, KeyValueStore};
use crate::error::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One stored analysis run, newest first when listed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    pub id: String,
    pub survey_id: i64,
    pub kind: String,
    pub response_count: i64,
    pub view_json: String,
    pub created_at: String,
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: &str) -> std::result::Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch("
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS analysis_history (
                id TEXT PRIMARY KEY,
                survey_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                response_count INTEGER NOT NULL,
                view_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_analysis_history_survey
                ON analysis_history (survey_id, created_at);
        ")?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Analysis history ──

    pub fn record_analysis(&self, result: &AnalysisResult) -> Result<()> {
        let view_json = serde_json::to_string(&result.view)?;
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO analysis_history (id, survey_id, kind, response_count, view_json, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                result.id,
                result.survey_id,
                result.kind,
                result.response_count as i64,
                view_json,
                result.generated_at
            ],
        )?;
        Ok(())
    }

    pub fn get_analysis_history(&self, survey_id: i64) -> Result<Vec<AnalysisRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, survey_id, kind, response_count, view_json, created_at FROM analysis_history WHERE survey_id = ?1 ORDER BY created_at DESC"
        )?;
        let rows = stmt.query_map(params![survey_id], |row| {
            Ok(AnalysisRecord {
                id: row.get(0)?,
                survey_id: row.get(1)?,
                kind: row.get(2)?,
                response_count: row.get(3)?,
                view_json: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn delete_analysis_history(&self, survey_id: i64) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM analysis_history WHERE survey_id = ?1", params![survey_id])?;
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        let value = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FreshnessCache;
    use crate::dto::SummaryResponse;

    fn new_test_db() -> Database {
        Database::new(":memory:").expect("in-memory database should initialize")
    }

    fn sample_result(survey_id: i64, summary: &str) -> AnalysisResult {
        AnalysisResult::from_summary(
            survey_id,
            "summary",
            &SummaryResponse {
                ok: true,
                summary: summary.to_string(),
                count: 5,
                error: None,
            },
        )
    }

    #[test]
    fn integration_kv_store_puts_overwrites_and_removes() {
        let db = new_test_db();

        assert_eq!(db.get("a").expect("get should succeed"), None);
        db.put("a", "1").expect("put should succeed");
        db.put("a", "2").expect("overwrite should succeed");
        assert_eq!(db.get("a").expect("get should succeed").as_deref(), Some("2"));

        db.remove("a").expect("remove should succeed");
        db.remove("a").expect("removing twice should not fail");
        assert_eq!(db.get("a").expect("get should succeed"), None);
    }

    #[test]
    fn integration_freshness_cache_over_sqlite() {
        let db = new_test_db();
        let cache = FreshnessCache::new(&db);
        let result = sample_result(42, "Tích cực: Nhanh");

        cache.store(5, &result).expect("store should succeed");

        let hit = cache.lookup(42, "summary", 5).expect("lookup should succeed");
        assert_eq!(hit, Some(result));
        assert_eq!(cache.lookup(42, "summary", 6).expect("lookup should succeed"), None);
    }

    #[test]
    fn integration_analysis_history_is_scoped_per_survey() {
        let db = new_test_db();
        let first = sample_result(1, "Tích cực: Tốt");
        let other = sample_result(2, "Tiêu cực: Chậm");

        db.record_analysis(&first).expect("first record should save");
        db.record_analysis(&other).expect("second record should save");

        let history = db.get_analysis_history(1).expect("history should load");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, first.id);
        assert_eq!(history[0].response_count, 5);
        assert!(history[0].view_json.contains("sections"));

        db.delete_analysis_history(1).expect("history should delete");
        assert!(db.get_analysis_history(1).expect("history should load").is_empty());
        assert_eq!(db.get_analysis_history(2).expect("history should load").len(), 1);
    }
}
