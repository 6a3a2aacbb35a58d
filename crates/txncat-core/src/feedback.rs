use serde::{Deserialize, Serialize};

use crate::text;

/// A user's category correction for a past prediction.
///
/// Transport layers validate field presence and hand the engine this
/// structured record; `corrected_category` emptiness is checked again at
/// the engine seam before anything is written.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedbackInput {
    pub transaction_id: i64,
    pub corrected_category: String,
    pub user_id: Option<String>,
    pub notes: Option<String>,
    pub transaction_text: Option<String>,
    #[serde(default)]
    pub add_alias: bool,
}

/// Derive the token an alias vote should count toward.
///
/// The whole normalized phrase when it is a single token or short enough
/// to be a plausible alias (≤ 20 chars), otherwise just the first token.
/// `None` when normalization leaves nothing to vote on.
pub fn derive_vote_token(text: &str) -> Option<String> {
    let normalized = text::normalize(text);
    if normalized.is_empty() {
        return None;
    }
    if !normalized.contains(' ') || normalized.len() <= 20 {
        return Some(normalized);
    }
    normalized.split_whitespace().next().map(str::to_string)
}
