use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// A not-yet-promoted alias candidate and its accumulated votes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAlias {
    pub token: String,
    pub category: String,
    pub votes: i64,
}

pub struct VoteRepo {
    db: Database,
}

impl VoteRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Upsert-increment the count for `(token, category)` and return the
    /// new count. First vote creates the row with count 1.
    #[instrument(skip(self))]
    pub fn increment(&self, token: &str, category: &str) -> Result<i64, StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO alias_votes (token, category, votes, created_at)
                 VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(token, category) DO UPDATE SET votes = votes + 1",
                rusqlite::params![token, category, now],
            )?;
            let votes = conn.query_row(
                "SELECT votes FROM alias_votes WHERE token = ?1 AND category = ?2",
                [token, category],
                |row| row.get(0),
            )?;
            Ok(votes)
        })
    }

    /// Current count for a pair, if the pair is still in the ledger.
    pub fn count(&self, token: &str, category: &str) -> Result<Option<i64>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT votes FROM alias_votes WHERE token = ?1 AND category = ?2")?;
            let mut rows = stmt.query([token, category])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_helpers::get(row, 0, "alias_votes", "votes")?)),
                None => Ok(None),
            }
        })
    }

    /// Remove a pair from the ledger (promotion or admin approval).
    /// Removing an absent pair is a no-op.
    #[instrument(skip(self))]
    pub fn delete(&self, token: &str, category: &str) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM alias_votes WHERE token = ?1 AND category = ?2",
                [token, category],
            )?;
            Ok(())
        })
    }

    /// All pending pairs, most-voted first. Ties break on insertion order,
    /// then token, so the listing is deterministic for a fixed ledger.
    #[instrument(skip(self))]
    pub fn list_pending(&self) -> Result<Vec<PendingAlias>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT token, category, votes FROM alias_votes
                 ORDER BY votes DESC, created_at ASC, token ASC",
            )?;
            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(PendingAlias {
                    token: row_helpers::get(row, 0, "alias_votes", "token")?,
                    category: row_helpers::get(row, 1, "alias_votes", "category")?,
                    votes: row_helpers::get(row, 2, "alias_votes", "votes")?,
                });
            }
            Ok(results)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_vote_creates_row_at_one() {
        let db = Database::in_memory().unwrap();
        let repo = VoteRepo::new(db);
        assert_eq!(repo.increment("milkshake", "food").unwrap(), 1);
        assert_eq!(repo.count("milkshake", "food").unwrap(), Some(1));
    }

    #[test]
    fn increments_accumulate_per_pair() {
        let db = Database::in_memory().unwrap();
        let repo = VoteRepo::new(db);

        repo.increment("milkshake", "food").unwrap();
        repo.increment("milkshake", "food").unwrap();
        assert_eq!(repo.increment("milkshake", "food").unwrap(), 3);

        // Same token under another category is a separate pair
        assert_eq!(repo.increment("milkshake", "grocery").unwrap(), 1);
    }

    #[test]
    fn delete_removes_pair() {
        let db = Database::in_memory().unwrap();
        let repo = VoteRepo::new(db);

        repo.increment("chai", "food").unwrap();
        repo.delete("chai", "food").unwrap();
        assert_eq!(repo.count("chai", "food").unwrap(), None);

        // Deleting again is fine
        repo.delete("chai", "food").unwrap();
    }

    #[test]
    fn list_pending_orders_by_votes_desc() {
        let db = Database::in_memory().unwrap();
        let repo = VoteRepo::new(db);

        repo.increment("chai", "food").unwrap();
        repo.increment("petrol", "fuel").unwrap();
        repo.increment("petrol", "fuel").unwrap();

        let pending = repo.list_pending().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].token, "petrol");
        assert_eq!(pending[0].votes, 2);
        assert_eq!(pending[1].token, "chai");
    }

    #[test]
    fn list_pending_tie_break_is_insertion_order_then_token() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch(
                "INSERT INTO alias_votes (token, category, votes, created_at) VALUES
                     ('zomato', 'food', 2, '2026-01-01T10:00:00+00:00'),
                     ('amazon', 'shopping', 2, '2026-01-01T11:00:00+00:00'),
                     ('zzcafe', 'food', 2, '2026-01-01T11:00:00+00:00');",
            )?;
            Ok(())
        })
        .unwrap();

        let repo = VoteRepo::new(db);
        let tokens: Vec<String> = repo
            .list_pending()
            .unwrap()
            .into_iter()
            .map(|p| p.token)
            .collect();
        // Oldest first among equal counts; equal timestamps fall back to token order
        assert_eq!(tokens, vec!["zomato", "amazon", "zzcafe"]);
    }

    #[test]
    fn empty_ledger_lists_nothing() {
        let db = Database::in_memory().unwrap();
        let repo = VoteRepo::new(db);
        assert!(repo.list_pending().unwrap().is_empty());
    }
}
