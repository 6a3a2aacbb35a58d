pub mod database;
pub mod error;
pub mod feedback;
pub mod predictions;
pub mod row_helpers;
pub mod schema;
pub mod taxonomy_doc;
pub mod votes;

pub use database::Database;
pub use error::StoreError;
