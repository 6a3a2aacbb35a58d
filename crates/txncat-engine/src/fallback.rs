//! Deterministic keyword-bucket classifier, used when the taxonomy has no
//! direct match for a description.

/// One keyword bucket: the category it maps to, the confidence it carries,
/// and the terms that select it.
struct Bucket {
    category: &'static str,
    confidence: f64,
    terms: &'static [&'static str],
}

// Buckets are tested in this order and the first containing term wins. The
// order is a fixed priority, not a confidence ranking (fuel scores higher
// than food but is tested later).
const BUCKETS: &[Bucket] = &[
    Bucket {
        category: "shopping",
        confidence: 0.93,
        terms: &["amz", "amazon", "flipkart", "myntra"],
    },
    Bucket {
        category: "food",
        confidence: 0.88,
        terms: &["starbucks", "swiggy", "pani", "chai", "juice", "food", "coffee", "snack", "chips"],
    },
    Bucket {
        category: "grocery",
        confidence: 0.87,
        terms: &["kirana", "store", "mart", "veg", "grocery"],
    },
    Bucket {
        category: "fuel",
        confidence: 0.90,
        terms: &["hpcl", "shell", "bpcl", "fuel", "petrol", "diesel"],
    },
    Bucket {
        category: "utilities",
        confidence: 0.86,
        terms: &["electricity", "water", "internet", "broadband", "bill", "recharge"],
    },
];

const OTHER_CATEGORY: &str = "other";
const OTHER_CONFIDENCE: f64 = 0.5;

/// A fallback classification. The category is always one of the fixed
/// bucket ids, never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct FallbackGuess {
    pub category: &'static str,
    pub confidence: f64,
}

/// Classify free text by keyword-bucket membership.
///
/// Lowercases the input, then tests each bucket for a contained term in
/// priority order. Unmatched text lands in `other` at 0.5; the classifier
/// never fails.
pub fn classify(text: &str) -> FallbackGuess {
    let text = text.to_lowercase();
    for bucket in BUCKETS {
        if bucket.terms.iter().any(|term| text.contains(term)) {
            return FallbackGuess {
                category: bucket.category,
                confidence: bucket.confidence,
            };
        }
    }
    FallbackGuess {
        category: OTHER_CATEGORY,
        confidence: OTHER_CONFIDENCE,
    }
}
