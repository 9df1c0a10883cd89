//! Matching heuristics
//!
//! Brand-aware gate, exclusion lists and the relevance score used to rank
//! candidates. All checks are case-insensitive: they operate on the
//! lower-cased raw name and on the normalized keyword set.

use super::normalizer::{normalize, NormalizedName};
use crate::config::MatchTuning;

/// Brand keywords strong enough to accept a match on their own
pub const BRANDS: &[&str] = &[
    "java", "nvidia", "amd", "intel", "microsoft", "directx", "visual", "net",
];

/// Inventory words that mark generic system components
const GENERAL_EXCLUSIONS: &[&str] = &["basic", "standard", "generic", "pnp"];

/// Added to the general exclusions unless the catalog item is itself a
/// Microsoft runtime
const PLATFORM_EXCLUSIONS: &[&str] = &["microsoft", "windows"];

const BRAND_EXCLUSIONS: &[(&str, &[&str])] = &[
    (
        "amd",
        &[
            "processor",
            "chipset",
            "gpio",
            "pci",
            "smbus",
            "balanced",
            "dvr64",
            "wvr64",
            "crash defender",
        ],
    ),
    ("intel", &["management", "mei", "serial", "thermal", "platform"]),
    ("nvidia", &["audio", "usb", "serial"]),
];

/// Helper processes that are usually not the product itself
const HELPER_WORDS: &[&str] = &["auto", "updater", "update", "launcher", "installer", "setup"];

/// Words that usually mark the canonical listing of a runtime
const CANONICAL_WORDS: &[&str] = &["runtime", "framework", "redistributable", "sdk"];

/// A name prepared for rule checks
#[derive(Debug, Clone)]
pub struct NameView {
    /// Raw name, lower-cased
    pub lower: String,
    pub normalized: NormalizedName,
}

impl NameView {
    pub fn new(raw: &str) -> Self {
        Self {
            lower: raw.to_lowercase(),
            normalized: normalize(raw),
        }
    }

    fn contains(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    fn has_keyword(&self, keyword: &str) -> bool {
        self.normalized.keywords.contains(keyword)
    }

    fn references_dotnet(&self) -> bool {
        self.contains(".net") || self.contains("dotnet")
    }
}

/// How an inventory name satisfied the application rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationMatch {
    /// Canonical forms are equal
    Exact,
    /// Keyword subset (short names) or sufficient overlap (long names)
    Keywords,
}

/// Application path: does `installed` refer to the catalog program?
pub fn application_match(
    catalog: &NormalizedName,
    installed: &NormalizedName,
    tuning: &MatchTuning,
) -> Option<ApplicationMatch> {
    // Opera GX is a distinct product from Opera
    if catalog.canonical == "opera" && installed.canonical.contains("gx") {
        return None;
    }
    if catalog.canonical.contains("opera gx") && !installed.canonical.contains("gx") {
        return None;
    }

    if !catalog.canonical.is_empty() && catalog.canonical == installed.canonical {
        return Some(ApplicationMatch::Exact);
    }

    if catalog.keywords.is_empty() {
        return None;
    }

    if catalog.keywords.len() <= tuning.short_name_max_keywords {
        return catalog
            .keywords
            .is_subset(&installed.keywords)
            .then_some(ApplicationMatch::Keywords);
    }

    let shared = catalog.shared_count(installed) as f64;
    (shared >= tuning.application_threshold(catalog.keywords.len()))
        .then_some(ApplicationMatch::Keywords)
}

/// Driver path prefilter: a catalog keyword appears in the inventory name
pub fn has_keyword_overlap(catalog: &NameView, installed: &NameView, tuning: &MatchTuning) -> bool {
    catalog
        .normalized
        .keywords
        .iter()
        .filter(|keyword| keyword.chars().count() > tuning.prefilter_min_keyword_len)
        .any(|keyword| installed.contains(keyword))
}

/// .NET catalog items accept any `.net` listing without the relevance gate
pub fn is_dotnet_listing(catalog: &NameView, installed: &NameView) -> bool {
    catalog.references_dotnet() && installed.contains(".net")
}

/// Relevance gate for the driver/program path
pub fn is_relevant_match(catalog: &NameView, installed: &NameView, tuning: &MatchTuning) -> bool {
    if catalog.contains("amd") && catalog.contains("adrenalin") {
        return installed.contains("amd")
            && (installed.contains("settings") || installed.contains("software"));
    }

    if catalog.contains("visual") && (catalog.has_keyword("cpp") || catalog.contains("c++")) {
        return installed.contains("visual")
            && (installed.contains("c++") || installed.contains("redistributable"));
    }

    if catalog.has_keyword("dotnet") || catalog.has_keyword("framework") || catalog.contains(".net")
    {
        return installed.references_dotnet();
    }

    if catalog.has_keyword("java") {
        return installed.contains("java");
    }

    let catalog_keywords = &catalog.normalized.keywords;
    let shared = catalog.normalized.shared_count(&installed.normalized);

    if catalog_keywords.len() <= tuning.short_name_max_keywords {
        return shared >= 1;
    }

    let shares_brand = BRANDS.iter().any(|brand| {
        catalog_keywords.contains(*brand) && installed.normalized.keywords.contains(*brand)
    });
    if shares_brand {
        return true;
    }

    shared as f64 >= tuning.relevance_threshold(catalog_keywords.len())
}

/// Outright rejection of noisy or wrong-component inventory names
pub fn has_exclusions(installed: &NameView, catalog: &NameView) -> bool {
    let microsoft_runtime = catalog.contains("visual") || catalog.references_dotnet();

    let general_hit = GENERAL_EXCLUSIONS
        .iter()
        .chain(PLATFORM_EXCLUSIONS.iter().filter(|_| !microsoft_runtime))
        .any(|word| installed.contains(word));
    if general_hit {
        return true;
    }

    BRAND_EXCLUSIONS.iter().any(|(brand, words)| {
        catalog.contains(brand) && words.iter().any(|word| installed.contains(word))
    })
}

/// Score a candidate; higher is better
pub fn calculate_relevance_score(
    catalog: &NameView,
    installed: &NameView,
    tuning: &MatchTuning,
) -> f64 {
    let mut score = 0.0;

    if installed.contains(&catalog.lower) {
        score += tuning.substring_bonus;
    }

    let shared = catalog.normalized.shared_count(&installed.normalized);
    let extra = installed.normalized.keywords.len() - shared;
    score += shared as f64 * tuning.shared_keyword_points;
    score -= extra as f64 * tuning.extra_keyword_penalty;

    for word in HELPER_WORDS {
        if installed.contains(word) {
            score -= tuning.helper_word_penalty;
        }
    }

    for word in CANONICAL_WORDS {
        if installed.contains(word) {
            score += tuning.canonical_word_bonus;
        }
    }

    score
}
