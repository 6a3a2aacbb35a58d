pub mod feedback;
pub mod prediction;
pub mod taxonomy;
pub mod text;

pub use feedback::FeedbackInput;
pub use prediction::MatchMethod;
pub use taxonomy::{Category, Taxonomy};
