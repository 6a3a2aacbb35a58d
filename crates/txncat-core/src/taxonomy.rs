use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// A spending category and the alias keywords/phrases that map to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// The versioned category vocabulary.
///
/// Categories are ordered; the order is the tie-break whenever one alias
/// string could resolve to more than one category. `vpa_aliases` maps the
/// local part of a payment identifier directly to a category id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub version: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vpa_aliases: BTreeMap<String, String>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            categories: Vec::new(),
            vpa_aliases: BTreeMap::new(),
        }
    }
}

impl Taxonomy {
    /// Look up a category by id.
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Merge an alias into a category's set, keeping the list sorted.
    /// Returns false when the category id is unknown or the alias is
    /// already present; the taxonomy is untouched in both cases.
    pub fn merge_alias(&mut self, token: &str, category_id: &str) -> bool {
        let Some(category) = self.categories.iter_mut().find(|c| c.id == category_id) else {
            return false;
        };
        if category.aliases.iter().any(|a| a == token) {
            return false;
        }
        category.aliases.push(token.to_string());
        category.aliases.sort();
        true
    }

    /// First category id that appears more than once, if any. Uploads with
    /// duplicate ids are rejected before they replace anything.
    pub fn duplicate_category_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.categories
            .iter()
            .find(|c| !seen.insert(c.id.as_str()))
            .map(|c| c.id.as_str())
    }
}
