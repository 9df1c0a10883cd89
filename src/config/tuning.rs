use serde::{Deserialize, Serialize};

/// Thresholds and point values used by the match engine.
///
/// The defaults reproduce the empirically tuned behaviour; they are kept here
/// so they can be adjusted from settings without touching matching logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    /// Word count at or below which a catalog name counts as "short".
    pub short_name_max_keywords: usize,

    /// Application path: minimum share of catalog keywords that must be shared
    /// by long names.
    pub application_overlap_ratio: f64,

    /// Application path: absolute floor for shared keywords on long names.
    pub application_overlap_min: usize,

    /// Driver path: minimum share of catalog keywords for the relevance gate.
    pub relevance_overlap_ratio: f64,

    /// Driver path: absolute floor for shared keywords in the relevance gate.
    pub relevance_overlap_min: usize,

    /// Keywords must be longer than this to trigger the driver-path prefilter.
    pub prefilter_min_keyword_len: usize,

    pub substring_bonus: f64,
    pub shared_keyword_points: f64,
    pub extra_keyword_penalty: f64,
    pub helper_word_penalty: f64,
    pub canonical_word_bonus: f64,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            short_name_max_keywords: 2,
            application_overlap_ratio: 0.6,
            application_overlap_min: 2,
            relevance_overlap_ratio: 0.4,
            relevance_overlap_min: 1,
            prefilter_min_keyword_len: 2,
            substring_bonus: 10.0,
            shared_keyword_points: 2.0,
            extra_keyword_penalty: 0.5,
            helper_word_penalty: 2.0,
            canonical_word_bonus: 1.0,
        }
    }
}

impl MatchTuning {
    /// Shared keywords needed by a long application name with `catalog_len` keywords.
    pub fn application_threshold(&self, catalog_len: usize) -> f64 {
        (self.application_overlap_min as f64).max(catalog_len as f64 * self.application_overlap_ratio)
    }

    /// Shared keywords needed by the relevance gate for `catalog_len` keywords.
    pub fn relevance_threshold(&self, catalog_len: usize) -> f64 {
        (self.relevance_overlap_min as f64).max(catalog_len as f64 * self.relevance_overlap_ratio)
    }
}
