//! Name normalization
//!
//! Turns a raw program or device name into a comparable canonical form and a
//! bag of significant keywords. Catalog names and inventory names go through
//! the same pipeline; the match engine only ever compares the results.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").expect("valid bracket pattern"));

static DOTTED_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)+").expect("valid version pattern"));

static ARCHITECTURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:x64|x86|32-bit|64-bit|32bit|64bit)\b").expect("valid arch pattern")
});

static VERSION_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:version|ver|v)\b").expect("valid version word pattern"));

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation pattern"));

/// Generic words that say nothing about which product a name refers to
pub const STOPWORDS: &[&str] = &[
    "driver",
    "drivers",
    "suite",
    "package",
    "tool",
    "tools",
    "utility",
    "support",
    "assistant",
    "experience",
    "control",
    "panel",
    "center",
    "manager",
    "application",
    "program",
    "system",
    "windows",
];

/// Multi-character technical tokens collapsed before punctuation is stripped
const COLLAPSED_TOKENS: &[(&str, &str)] = &[("c++", "cpp"), (".net", "dotnet")];

/// A name reduced to its comparable parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    /// Lower-cased, noise-free form used for equality checks
    pub canonical: String,
    /// Significant words, stoplist removed
    pub keywords: BTreeSet<String>,
}

impl NormalizedName {
    /// Keywords shared with `other`
    pub fn shared_keywords<'a>(&'a self, other: &'a NormalizedName) -> impl Iterator<Item = &'a String> {
        self.keywords.intersection(&other.keywords)
    }

    pub fn shared_count(&self, other: &NormalizedName) -> usize {
        self.shared_keywords(other).count()
    }
}

/// Normalize a raw name
pub fn normalize(raw: &str) -> NormalizedName {
    let mut name = raw.to_lowercase();
    for (from, to) in COLLAPSED_TOKENS {
        name = name.replace(from, to);
    }

    let name = BRACKETED.replace_all(&name, " ");
    let name = DOTTED_VERSION.replace_all(&name, " ");
    let name = ARCHITECTURE.replace_all(&name, " ");
    let name = VERSION_WORD.replace_all(&name, " ");
    let name = PUNCTUATION.replace_all(&name, " ");

    // Bare numbers left after punctuation removal are build numbers or years
    let tokens: Vec<&str> = name
        .split_whitespace()
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .collect();

    let keywords = tokens
        .iter()
        .filter(|token| token.chars().count() > 1 && !STOPWORDS.contains(token))
        .map(|token| token.to_string())
        .collect();

    NormalizedName {
        canonical: tokens.join(" "),
        keywords,
    }
}
