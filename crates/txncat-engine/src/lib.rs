pub mod categorizer;
pub mod error;
pub mod fallback;
pub mod matcher;
pub mod voting;

pub use categorizer::{Categorizer, Prediction, Suggestion, DEFAULT_PROMOTE_THRESHOLD};
pub use error::EngineError;
pub use voting::{VoteOutcome, VoteReceipt};
