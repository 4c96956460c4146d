use serde::{Deserialize, Serialize};

/// Deterministic signals computed from an article's text and source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub word_count: usize,
    pub source_domain: String,
    pub is_satire_domain: bool,
    pub fake_trigger_hits: usize,
    pub uncertainty_hits: usize,
    pub emotion_hits: usize,
    pub has_enough_text: bool,
}
