use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use txncat_core::feedback::FeedbackInput;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedbackRow {
    pub id: i64,
    pub transaction_id: i64,
    pub corrected_category: String,
    pub user_id: Option<String>,
    pub notes: Option<String>,
    pub transaction_text: Option<String>,
    pub created_at: String,
}

pub struct FeedbackRepo {
    db: Database,
}

impl FeedbackRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append one correction and return its assigned id.
    #[instrument(skip(self, input), fields(transaction_id = input.transaction_id))]
    pub fn append(&self, input: &FeedbackInput) -> Result<i64, StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO feedback (transaction_id, corrected_category, user_id, notes, transaction_text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    input.transaction_id,
                    input.corrected_category,
                    input.user_id,
                    input.notes,
                    input.transaction_text,
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Most recent corrections, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<FeedbackRow>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, transaction_id, corrected_category, user_id, notes, transaction_text, created_at
                 FROM feedback ORDER BY id DESC LIMIT ?1",
            )?;
            let mut rows = stmt.query([limit])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(FeedbackRow {
                    id: row_helpers::get(row, 0, "feedback", "id")?,
                    transaction_id: row_helpers::get(row, 1, "feedback", "transaction_id")?,
                    corrected_category: row_helpers::get(row, 2, "feedback", "corrected_category")?,
                    user_id: row_helpers::get_opt(row, 3, "feedback", "user_id")?,
                    notes: row_helpers::get_opt(row, 4, "feedback", "notes")?,
                    transaction_text: row_helpers::get_opt(row, 5, "feedback", "transaction_text")?,
                    created_at: row_helpers::get(row, 6, "feedback", "created_at")?,
                });
            }
            Ok(results)
        })
    }
}
