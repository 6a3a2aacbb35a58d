use chrono::Utc;
use tracing::instrument;

use txncat_core::taxonomy::Taxonomy;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Persistence for the taxonomy document.
///
/// The whole document lives in a single JSON row — there is exactly one
/// taxonomy per database, replaced wholesale or rewritten on promotion.
pub struct TaxonomyRepo {
    db: Database,
}

impl TaxonomyRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Load the stored document. `Ok(None)` when none has been saved yet;
    /// a row that no longer parses is reported as CorruptRow so the caller
    /// can decide to degrade.
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<Option<Taxonomy>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT body FROM taxonomy_doc WHERE id = 1")?;
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => {
                    let body: String = row_helpers::get(row, 0, "taxonomy_doc", "body")?;
                    let doc = serde_json::from_str(&body).map_err(|e| StoreError::CorruptRow {
                        table: "taxonomy_doc",
                        column: "body",
                        detail: format!("invalid JSON: {e}"),
                    })?;
                    Ok(Some(doc))
                }
                None => Ok(None),
            }
        })
    }

    /// Write the document, replacing any previous one.
    #[instrument(skip(self, doc), fields(version = %doc.version))]
    pub fn save(&self, doc: &Taxonomy) -> Result<(), StoreError> {
        let body = serde_json::to_string(doc)?;
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO taxonomy_doc (id, body, version, updated_at) VALUES (1, ?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                     body = excluded.body,
                     version = excluded.version,
                     updated_at = excluded.updated_at",
                rusqlite::params![body, doc.version, now],
            )?;
            Ok(())
        })
    }
}
