//! Fuzzy concept detection for open-text answers.
//!
//! A concept group is a list of synonyms. The group counts as mentioned when
//! any synonym equals a word of the answer, or is a close lexical match of
//! one (similarity ratio at or above [`CLOSE_MATCH_CUTOFF`]).
//!
//! The similarity ratio is the Ratcliff/Obershelp measure: `2·M / T`, where
//! `T` is the combined length of both strings and `M` the number of
//! characters in the matching blocks found by recursively aligning on the
//! longest common substring.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum similarity ratio for a word to count as a synonym.
pub const CLOSE_MATCH_CUTOFF: f64 = 0.85;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word pattern"));

/// Split text into lowercase words. Punctuation and whitespace are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Detect which concept groups are mentioned in `text`.
///
/// Returns one label per detected group, in group order. The label is the
/// group's first synonym, uppercased.
pub fn detect_concepts(text: &str, groups: &[Vec<String>]) -> Vec<String> {
    let words = tokenize(text);
    if words.is_empty() {
        return Vec::new();
    }

    groups
        .iter()
        .filter(|group| group.iter().any(|synonym| mentions(&words, synonym)))
        .filter_map(|group| group.first().map(|label| label.to_uppercase()))
        .collect()
}

/// Whether a synonym appears among the words, exactly or as a close match.
fn mentions(words: &[String], synonym: &str) -> bool {
    let synonym = synonym.to_lowercase();
    if words.iter().any(|w| *w == synonym) {
        return true;
    }
    let target: Vec<char> = synonym.chars().collect();
    words.iter().any(|word| {
        let candidate: Vec<char> = word.chars().collect();
        ratio(&candidate, &target) >= CLOSE_MATCH_CUTOFF
    })
}

/// Similarity of two strings in `[0.0, 1.0]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio(&a, &b)
}

fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_chars(a, b);
    2.0 * matched as f64 / total as f64
}

/// Total size of the matching blocks between `a` and `b`.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, size) = longest_common_block(a, b);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + size..], &b[j + size..])
}

/// Longest common substring as `(start in a, start in b, length)`.
///
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let k = cur[j + 1];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}
