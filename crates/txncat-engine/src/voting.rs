//! The alias vote ledger and promotion state machine.
//!
//! Per `(token, category)` pair the ledger moves through
//! `absent → counting(n) → counting(n+1) | promoted`. Promotion is
//! terminal: the pair leaves the ledger and the token lives on as a
//! taxonomy alias.

use serde::Serialize;
use tracing::{debug, info, instrument};

use txncat_core::taxonomy::Taxonomy;
use txncat_store::votes::PendingAlias;

use crate::categorizer::Categorizer;
use crate::error::EngineError;

/// What came of an alias vote attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// The vote was counted; `promoted` reports whether it crossed the
    /// threshold and merged the alias into the taxonomy.
    Counted(VoteReceipt),
    /// The token was empty or too short to be an alias; nothing recorded.
    InvalidToken,
    /// No vote was attempted (feedback without `add_alias`, or no text to
    /// derive a token from).
    Skipped,
    /// The vote was attempted but did not persist.
    Failed { error: String },
}

/// Ledger state for a pair after a counted vote.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VoteReceipt {
    pub token: String,
    pub category: String,
    pub votes: i64,
    pub promoted: bool,
}

impl Categorizer {
    /// Count one vote for `(token, category)`, promoting the token into
    /// the category's alias set once the threshold is reached.
    ///
    /// The whole increment → promote → persist cycle runs under the
    /// engine write lock. A merge that comes back false (unknown
    /// category, alias already present) leaves the vote row in place so
    /// a later matching vote retries the promotion.
    #[instrument(skip(self))]
    pub fn vote(&self, token: &str, category: &str) -> Result<VoteOutcome, EngineError> {
        let token = token.trim().to_lowercase();
        if token.chars().count() < 2 {
            return Ok(VoteOutcome::InvalidToken);
        }

        let _guard = self.write_lock.lock();
        let votes = self.votes.increment(&token, category)?;
        let mut promoted = false;
        if votes >= self.promote_threshold {
            promoted = self.promote_locked(&token, category)?;
            if promoted {
                self.votes.delete(&token, category)?;
            }
        }

        Ok(VoteOutcome::Counted(VoteReceipt {
            token,
            category: category.to_string(),
            votes,
            promoted,
        }))
    }

    /// Admin force-promotion: merge immediately regardless of vote count,
    /// then drop any ledger row for the pair. Returns whether the merge
    /// added a new alias; repeating the call is a no-op `false`.
    #[instrument(skip(self))]
    pub fn approve_alias(&self, token: &str, category: &str) -> Result<bool, EngineError> {
        let token = token.trim().to_lowercase();
        if token.chars().count() < 2 {
            return Ok(false);
        }

        let _guard = self.write_lock.lock();
        let promoted = self.promote_locked(&token, category)?;
        // The pair leaves the ledger whether or not the merge added anything.
        self.votes.delete(&token, category)?;
        Ok(promoted)
    }

    /// All pairs still counting votes, most-voted first.
    pub fn pending_aliases(&self) -> Result<Vec<PendingAlias>, EngineError> {
        Ok(self.votes.list_pending()?)
    }

    /// Merge a token into a category and make it durable. Caller must hold
    /// the write lock. The snapshot is swapped only after the save, so
    /// readers never observe an unpersisted alias.
    fn promote_locked(&self, token: &str, category: &str) -> Result<bool, EngineError> {
        let mut updated = Taxonomy::clone(&self.taxonomy());
        if !updated.merge_alias(token, category) {
            debug!(token, category, "merge declined: unknown category or alias already present");
            return Ok(false);
        }
        self.taxonomy_repo.save(&updated)?;
        self.swap_snapshot(updated);
        info!(token, category, "alias promoted into taxonomy");
        Ok(true)
    }
}
