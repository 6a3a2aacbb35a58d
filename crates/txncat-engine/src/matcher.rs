//! Direct taxonomy matching: identifier lookup, alias substring scan, then
//! whole-token keyword lookup. Confidence is fixed per tier.

use std::collections::HashMap;

use txncat_core::prediction::MatchMethod;
use txncat_core::taxonomy::Taxonomy;
use txncat_core::text;

const VPA_CONFIDENCE: f64 = 0.95;
const SUBSTRING_CONFIDENCE: f64 = 0.85;
const TOKEN_CONFIDENCE: f64 = 0.80;

/// Result of a direct taxonomy match. `category` is `None` when nothing in
/// the taxonomy applied; the caller decides whether to fall back.
#[derive(Clone, Debug, PartialEq)]
pub struct HeuristicMatch {
    pub category: Option<String>,
    pub confidence: f64,
    pub method: MatchMethod,
}

impl HeuristicMatch {
    fn none() -> Self {
        Self {
            category: None,
            confidence: 0.0,
            method: MatchMethod::None,
        }
    }
}

/// Match normalized text against the taxonomy, best tier first:
///
/// 1. Payment identifier present and mapped in `vpa_aliases` (0.95).
/// 2. An alias occurs as a substring, categories checked in taxonomy
///    order (0.85).
/// 3. A whitespace token of the text equals an alias (0.80). The token
///    map is built first-registered-wins, so an alias string shared by
///    two categories resolves to the first one in taxonomy order — the
///    same tie-break as tier 2.
/// 4. Otherwise no match at confidence 0.0.
pub fn heuristic_match(normalized: &str, taxonomy: &Taxonomy) -> HeuristicMatch {
    if let Some(local) = text::extract_identifier(normalized) {
        if let Some(category) = taxonomy.vpa_aliases.get(local) {
            return HeuristicMatch {
                category: Some(category.clone()),
                confidence: VPA_CONFIDENCE,
                method: MatchMethod::VpaAlias,
            };
        }
    }

    for category in &taxonomy.categories {
        for alias in &category.aliases {
            if normalized.contains(alias.as_str()) {
                return HeuristicMatch {
                    category: Some(category.id.clone()),
                    confidence: SUBSTRING_CONFIDENCE,
                    method: MatchMethod::AliasKeyword,
                };
            }
        }
    }

    let mut keyword_map: HashMap<&str, &str> = HashMap::new();
    for category in &taxonomy.categories {
        for alias in &category.aliases {
            keyword_map.entry(alias.as_str()).or_insert(category.id.as_str());
        }
    }
    for token in normalized.split_whitespace() {
        if let Some(category) = keyword_map.get(token) {
            return HeuristicMatch {
                category: Some((*category).to_string()),
                confidence: TOKEN_CONFIDENCE,
                method: MatchMethod::Keyword,
            };
        }
    }

    HeuristicMatch::none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use txncat_core::taxonomy::Category;

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            version: "2.0".into(),
            categories: vec![
                Category {
                    id: "food".into(),
                    aliases: vec!["swiggy".into(), "zomato".into()],
                },
                Category {
                    // shares the "swiggy" alias to exercise the tie-break
                    id: "shopping".into(),
                    aliases: vec!["flipkart".into(), "swiggy".into()],
                },
            ],
            vpa_aliases: BTreeMap::from([("merchantpay".to_string(), "shopping".to_string())]),
        }
    }

    #[test]
    fn identifier_hit_is_highest_tier() {
        let hit = heuristic_match("paid merchantpay@okbank today", &taxonomy());
        assert_eq!(hit.category.as_deref(), Some("shopping"));
        assert!((hit.confidence - 0.95).abs() < f64::EPSILON);
        assert_eq!(hit.method, MatchMethod::VpaAlias);
    }

    #[test]
    fn identifier_beats_conflicting_alias() {
        // "swiggy" pulls toward food; the identifier must still win.
        let hit = heuristic_match("swiggy merchantpay@okbank", &taxonomy());
        assert_eq!(hit.category.as_deref(), Some("shopping"));
        assert_eq!(hit.method, MatchMethod::VpaAlias);
    }

    #[test]
    fn unmapped_identifier_falls_through_to_aliases() {
        let hit = heuristic_match("zomato somepay@okbank", &taxonomy());
        assert_eq!(hit.category.as_deref(), Some("food"));
        assert_eq!(hit.method, MatchMethod::AliasKeyword);
    }

    #[test]
    fn alias_substring_match() {
        let hit = heuristic_match("dinner zomato order 230", &taxonomy());
        assert_eq!(hit.category.as_deref(), Some("food"));
        assert!((hit.confidence - 0.85).abs() < f64::EPSILON);
        assert_eq!(hit.method, MatchMethod::AliasKeyword);
    }

    #[test]
    fn alias_matches_inside_a_longer_token() {
        let hit = heuristic_match("swiggyinstamart 560", &taxonomy());
        assert_eq!(hit.category.as_deref(), Some("food"));
    }

    #[test]
    fn shared_alias_resolves_to_first_category() {
        let hit = heuristic_match("swiggy 120", &taxonomy());
        assert_eq!(hit.category.as_deref(), Some("food"));
    }

    #[test]
    fn no_match_is_zero_confidence() {
        let hit = heuristic_match("mystery merchant 999", &taxonomy());
        assert_eq!(hit.category, None);
        assert_eq!(hit.confidence, 0.0);
        assert_eq!(hit.method, MatchMethod::None);
    }

    #[test]
    fn empty_taxonomy_never_matches() {
        let hit = heuristic_match("swiggy merchantpay@okbank", &Taxonomy::default());
        assert_eq!(hit.category, None);
        assert_eq!(hit.method, MatchMethod::None);
    }
}
