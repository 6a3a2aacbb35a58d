use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use txncat_core::feedback::{self, FeedbackInput};
use txncat_core::prediction::MatchMethod;
use txncat_core::taxonomy::Taxonomy;
use txncat_core::text;
use txncat_store::feedback::FeedbackRepo;
use txncat_store::predictions::PredictionRepo;
use txncat_store::taxonomy_doc::TaxonomyRepo;
use txncat_store::votes::VoteRepo;
use txncat_store::Database;

use crate::error::EngineError;
use crate::fallback;
use crate::matcher;
use crate::voting::VoteOutcome;

/// Votes required before an alias is merged into the taxonomy.
pub const DEFAULT_PROMOTE_THRESHOLD: i64 = 3;

/// A logged classification of one transaction description.
#[derive(Clone, Debug, Serialize)]
pub struct Prediction {
    pub transaction_id: i64,
    pub category: String,
    pub confidence: f64,
    pub method: MatchMethod,
}

/// One ranked candidate from `suggest`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Suggestion {
    pub category: String,
    pub confidence: f64,
    pub reason: &'static str,
}

/// The categorization engine.
///
/// Owns the in-memory taxonomy snapshot and the write lock serializing
/// every ledger or taxonomy mutation. Reads (`predict`, `suggest`,
/// `taxonomy`) clone the snapshot `Arc` and never contend with writers.
pub struct Categorizer {
    /// Swapped wholesale on upload or promotion; a reader holds one
    /// consistent snapshot for the duration of its request.
    pub(crate) snapshot: RwLock<Arc<Taxonomy>>,
    /// Serializes vote counting, promotion, and taxonomy replacement.
    pub(crate) write_lock: Mutex<()>,
    pub(crate) taxonomy_repo: TaxonomyRepo,
    pub(crate) votes: VoteRepo,
    predictions: PredictionRepo,
    feedback: FeedbackRepo,
    pub(crate) promote_threshold: i64,
}

impl Categorizer {
    /// Build the engine over an open database.
    ///
    /// A missing or unreadable taxonomy document degrades to the default
    /// empty taxonomy — the service still classifies via the fallback
    /// buckets and the document heals on the next replace or promotion.
    pub fn new(db: Database, promote_threshold: i64) -> Self {
        let taxonomy_repo = TaxonomyRepo::new(db.clone());
        let taxonomy = match taxonomy_repo.load() {
            Ok(Some(doc)) => doc,
            Ok(None) => Taxonomy::default(),
            Err(e) => {
                warn!(error = %e, "failed to load taxonomy, starting from default");
                Taxonomy::default()
            }
        };
        info!(
            version = %taxonomy.version,
            categories = taxonomy.categories.len(),
            "taxonomy loaded"
        );

        Self {
            snapshot: RwLock::new(Arc::new(taxonomy)),
            write_lock: Mutex::new(()),
            taxonomy_repo,
            votes: VoteRepo::new(db.clone()),
            predictions: PredictionRepo::new(db.clone()),
            feedback: FeedbackRepo::new(db),
            promote_threshold,
        }
    }

    /// Current taxonomy snapshot.
    pub fn taxonomy(&self) -> Arc<Taxonomy> {
        Arc::clone(&self.snapshot.read())
    }

    pub(crate) fn swap_snapshot(&self, taxonomy: Taxonomy) {
        *self.snapshot.write() = Arc::new(taxonomy);
    }

    /// Replace the whole taxonomy document. Duplicate category ids are
    /// rejected before anything is written.
    #[instrument(skip(self, doc), fields(version = %doc.version))]
    pub fn replace_taxonomy(&self, doc: Taxonomy) -> Result<String, EngineError> {
        if let Some(id) = doc.duplicate_category_id() {
            return Err(EngineError::MalformedInput(format!(
                "duplicate category id: {id}"
            )));
        }

        let version = doc.version.clone();
        let _guard = self.write_lock.lock();
        self.taxonomy_repo.save(&doc)?;
        self.swap_snapshot(doc);
        info!(version = %version, "taxonomy replaced");
        Ok(version)
    }

    /// Classify one transaction description and log the prediction.
    ///
    /// The heuristic tiers run first; when they all miss, the keyword
    /// fallback supplies the answer — its floor (0.5) always beats a
    /// missed heuristic (0.0), so a valid text never goes uncategorized.
    #[instrument(skip(self, raw))]
    pub fn predict(&self, raw: &str) -> Result<Prediction, EngineError> {
        let normalized = text::normalize(raw);
        let snapshot = self.taxonomy();

        let hit = matcher::heuristic_match(&normalized, &snapshot);
        let (category, confidence, method) = match hit.category {
            Some(category) => (category, hit.confidence, hit.method),
            None => {
                let guess = fallback::classify(&normalized);
                (guess.category.to_string(), guess.confidence, MatchMethod::Model)
            }
        };

        let transaction_id =
            self.predictions
                .append(raw, &normalized, &category, confidence, &method)?;
        debug!(transaction_id, category = %category, method = %method, "prediction logged");

        Ok(Prediction {
            transaction_id,
            category,
            confidence,
            method,
        })
    }

    /// Up to three candidate categories, best first.
    ///
    /// Candidates: the heuristic match when there is one, the fallback
    /// guess always, and an amount-banded guess (≤ 100 leans `food`,
    /// ≤ 500 leans `shopping`). The sort is stable so equal confidences
    /// keep that insertion order; duplicates keep their best entry.
    /// Unlike `predict` this never writes to the prediction log.
    pub fn suggest(&self, raw: &str, amount: Option<f64>) -> Vec<Suggestion> {
        let normalized = text::normalize(raw);
        let snapshot = self.taxonomy();
        let mut candidates: Vec<Suggestion> = Vec::with_capacity(3);

        let hit = matcher::heuristic_match(&normalized, &snapshot);
        if let Some(category) = hit.category {
            candidates.push(Suggestion {
                category,
                confidence: hit.confidence,
                reason: "heuristic",
            });
        }

        let guess = fallback::classify(&normalized);
        candidates.push(Suggestion {
            category: guess.category.to_string(),
            confidence: guess.confidence,
            reason: "model",
        });

        if let Some(amount) = amount {
            if amount <= 100.0 {
                candidates.push(Suggestion {
                    category: "food".to_string(),
                    confidence: 0.45,
                    reason: "small_amount_heuristic",
                });
            } else if amount <= 500.0 {
                candidates.push(Suggestion {
                    category: "shopping".to_string(),
                    confidence: 0.35,
                    reason: "mid_amount_heuristic",
                });
            }
        }

        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(c.category.clone()));
        candidates.truncate(3);
        candidates
    }

    /// Record a category correction, then — when the user opted in — count
    /// an alias vote on a token derived from the transaction text.
    ///
    /// The correction is durable before the vote runs, so a vote-side
    /// failure is reported in the returned outcome instead of failing
    /// the call.
    #[instrument(skip(self, input), fields(transaction_id = input.transaction_id))]
    pub fn record_feedback(&self, input: &FeedbackInput) -> Result<VoteOutcome, EngineError> {
        if input.corrected_category.trim().is_empty() {
            return Err(EngineError::MalformedInput(
                "corrected_category must not be empty".to_string(),
            ));
        }

        let feedback_id = self.feedback.append(input)?;
        debug!(feedback_id, category = %input.corrected_category, "feedback recorded");

        if !input.add_alias {
            return Ok(VoteOutcome::Skipped);
        }
        let token = input
            .transaction_text
            .as_deref()
            .and_then(feedback::derive_vote_token);
        let Some(token) = token else {
            return Ok(VoteOutcome::Skipped);
        };

        match self.vote(&token, &input.corrected_category) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(error = %e, token = %token, "alias vote failed after feedback was recorded");
                Ok(VoteOutcome::Failed {
                    error: e.to_string(),
                })
            }
        }
    }
}
