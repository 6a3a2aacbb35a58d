use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use txncat_core::prediction::MatchMethod;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// One logged prediction. Append-only; the id comes from the
/// AUTOINCREMENT column, never from counting rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictionRow {
    pub id: i64,
    pub raw_text: String,
    pub normalized_text: String,
    pub category: String,
    pub confidence: f64,
    pub method: MatchMethod,
    pub created_at: String,
}

pub struct PredictionRepo {
    db: Database,
}

impl PredictionRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append a prediction and return its assigned id.
    #[instrument(skip(self, raw_text, normalized_text), fields(category, confidence))]
    pub fn append(
        &self,
        raw_text: &str,
        normalized_text: &str,
        category: &str,
        confidence: f64,
        method: &MatchMethod,
    ) -> Result<i64, StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO predictions (raw_text, normalized_text, category, confidence, method, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    raw_text,
                    normalized_text,
                    category,
                    confidence,
                    method.to_string(),
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Get a logged prediction by id.
    pub fn get(&self, id: i64) -> Result<PredictionRow, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, raw_text, normalized_text, category, confidence, method, created_at
                 FROM predictions WHERE id = ?1",
            )?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => row_to_prediction(row),
                None => Err(StoreError::NotFound(format!("prediction {id}"))),
            }
        })
    }

    /// Most recent predictions, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<PredictionRow>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, raw_text, normalized_text, category, confidence, method, created_at
                 FROM predictions ORDER BY id DESC LIMIT ?1",
            )?;
            let mut rows = stmt.query([limit])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_prediction(row)?);
            }
            Ok(results)
        })
    }
}

fn row_to_prediction(row: &rusqlite::Row<'_>) -> Result<PredictionRow, StoreError> {
    let method_str: String = row_helpers::get(row, 5, "predictions", "method")?;

    Ok(PredictionRow {
        id: row_helpers::get(row, 0, "predictions", "id")?,
        raw_text: row_helpers::get(row, 1, "predictions", "raw_text")?,
        normalized_text: row_helpers::get(row, 2, "predictions", "normalized_text")?,
        category: row_helpers::get(row, 3, "predictions", "category")?,
        confidence: row_helpers::get(row, 4, "predictions", "confidence")?,
        method: row_helpers::parse_enum(&method_str, "predictions", "method")?,
        created_at: row_helpers::get(row, 6, "predictions", "created_at")?,
    })
}
