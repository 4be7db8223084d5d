//! Fuzzy title search.
//!
//! Users type titles the way they remember them ("terminater", "star wars
//! empire"), so a query is matched against every catalog title with an
//! edit-distance based similarity and the best match wins. There is no
//! minimum score: the closest available title is always returned, even when
//! it is a poor match. Callers must not assume the match is semantically
//! related to the query.
//!
//! ## Scoring
//! Both strings are normalized (lowercase, punctuation to spaces, whitespace
//! collapsed) and compared with a weighted ratio on a 0..=100 scale:
//! - similar lengths: the best of the plain ratio and the token-sorted and
//!   token-set ratios (the latter two scaled by 0.95)
//! - very different lengths: the best of the plain ratio and the partial
//!   (best window) ratios, scaled by 0.9, or by 0.6 when one string is more
//!   than eight times longer
//!
//! Ties go to the candidate that appears first.

use data_loader::{RecsError, Result};
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

const UNBASE_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// The outcome of resolving a query against the candidate titles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    pub title: String,
    /// Position of the title in the candidate sequence
    pub position: usize,
    /// Similarity in 0..=100
    pub score: u32,
}

/// Resolves free text against a fixed list of titles
///
/// Candidate titles are normalized once at construction.
#[derive(Debug, Clone)]
pub struct TitleResolver {
    titles: Vec<String>,
    processed: Vec<String>,
}

impl TitleResolver {
    /// Fails with `EmptyCatalog` when there is nothing to match against
    pub fn new<I, S>(titles: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let titles: Vec<String> = titles.into_iter().map(Into::into).collect();
        if titles.is_empty() {
            return Err(RecsError::EmptyCatalog("no titles to search".to_string()));
        }
        let processed = titles.iter().map(|t| full_process(t)).collect();
        Ok(Self { titles, processed })
    }

    /// Best-scoring title for `query`; first occurrence wins ties
    #[instrument(skip(self), fields(candidates = self.titles.len()))]
    pub fn resolve(&self, query: &str) -> Result<TitleMatch> {
        let query_processed = full_process(query);

        let scores: Vec<u32> = self
            .processed
            .par_iter()
            .map(|candidate| weighted_ratio(&query_processed, candidate))
            .collect();

        let mut best = 0;
        for (position, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = position;
            }
        }

        let matched = TitleMatch {
            title: self.titles[best].clone(),
            position: best,
            score: scores[best],
        };
        debug!("Resolved {:?} to {:?} (score {})", query, matched.title, matched.score);
        Ok(matched)
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }
}

/// One-shot resolution without keeping a resolver around
pub fn resolve<S: AsRef<str>>(query: &str, candidates: &[S]) -> Result<TitleMatch> {
    TitleResolver::new(candidates.iter().map(|c| c.as_ref().to_string()))?.resolve(query)
}

// =============================================================================
// Scorers
// =============================================================================
// All scorers below expect already normalized input.

/// Lowercase, replace every non-alphanumeric character with a space, and
/// collapse runs of whitespace
pub fn full_process(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Weighted combination of the ratios below, rounded to an integer
pub fn weighted_ratio(a: &str, b: &str) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    let base = ratio(a, b) as f64;

    let best = if len_ratio < 1.5 {
        let token_sort = token_sort_ratio(a, b) as f64 * UNBASE_SCALE;
        let token_set = token_set_ratio(a, b) as f64 * UNBASE_SCALE;
        base.max(token_sort).max(token_set)
    } else {
        let partial_scale = if len_ratio > 8.0 {
            LONG_PARTIAL_SCALE
        } else {
            PARTIAL_SCALE
        };
        let partial = partial_ratio(a, b) as f64 * partial_scale;
        let partial_sort = partial_token_sort_ratio(a, b) as f64 * UNBASE_SCALE * partial_scale;
        let partial_set = partial_token_set_ratio(a, b) as f64 * UNBASE_SCALE * partial_scale;
        base.max(partial).max(partial_sort).max(partial_set)
    };

    round_score(best)
}

/// `100 * 2 * LCS / (len_a + len_b)`, i.e. indel-distance similarity
pub fn ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    round_score(100.0 * similarity(&a, &b))
}

/// Best ratio of the shorter string against every window of the longer one
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if shorter.is_empty() {
        return 0;
    }

    let width = shorter.len();
    let mut best: f64 = 0.0;
    for start in 0..=(longer.len() - width) {
        let score = similarity(shorter, &longer[start..start + width]);
        if score >= 1.0 {
            return 100;
        }
        best = best.max(score);
    }
    round_score(100.0 * best)
}

pub fn token_sort_ratio(a: &str, b: &str) -> u32 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

pub fn partial_token_sort_ratio(a: &str, b: &str) -> u32 {
    partial_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

pub fn token_set_ratio(a: &str, b: &str) -> u32 {
    token_set_with(a, b, ratio)
}

pub fn partial_token_set_ratio(a: &str, b: &str) -> u32 {
    token_set_with(a, b, partial_ratio)
}

/// Compare the shared tokens against each side's full token set
fn token_set_with(a: &str, b: &str, scorer: fn(&str, &str) -> u32) -> u32 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let shared = join_tokens(tokens_a.intersection(&tokens_b));
    let only_a = join_tokens(tokens_a.difference(&tokens_b));
    let only_b = join_tokens(tokens_b.difference(&tokens_a));

    let combined_a = format!("{} {}", shared, only_a).trim().to_string();
    let combined_b = format!("{} {}", shared, only_b).trim().to_string();

    scorer(&shared, &combined_a)
        .max(scorer(&shared, &combined_b))
        .max(scorer(&combined_a, &combined_b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join_tokens<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

/// `2 * LCS / (len_a + len_b)` in 0.0..=1.0; zero if either side is empty
fn similarity(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let lcs = longest_common_subsequence(a, b);
    2.0 * lcs as f64 / (a.len() + b.len()) as f64
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Round half to even, the way the scores were calibrated
fn round_score(score: f64) -> u32 {
    score.round_ties_even() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_titles() -> Vec<&'static str> {
        vec![
            "Toy Story (1995)",
            "Terminal Velocity (1994)",
            "Heat (1995)",
            "The Terminator (1984)",
            "Star Wars: Episode V - The Empire Strikes Back (1980)",
            "Sense and Sensibility (1995)",
        ]
    }

    #[test]
    fn test_full_process() {
        assert_eq!(full_process("  Star Wars: Episode V  "), "star wars episode v");
        assert_eq!(full_process("Children's"), "children s");
        assert_eq!(full_process("!!!"), "");
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio("heat", "heat"), 100);
        assert_eq!(ratio("abc", "xyz"), 0);
        assert_eq!(ratio("", "heat"), 0);
        // LCS("terminater", "the terminator") = 9 -> 18 / 24
        assert_eq!(ratio("terminater", "the terminator"), 75);
    }

    #[test]
    fn test_partial_ratio() {
        assert_eq!(partial_ratio("terminator", "the terminator 1984"), 100);
        assert_eq!(partial_ratio("terminater", "the terminator 1984"), 90);
    }

    #[test]
    fn test_token_ratios_ignore_order() {
        assert_eq!(token_sort_ratio("empire strikes back", "back strikes empire"), 100);
        assert_eq!(token_set_ratio("heat 1995", "1995 heat"), 100);
    }

    #[test]
    fn test_weighted_ratio_empty() {
        assert_eq!(weighted_ratio("", "heat"), 0);
        assert_eq!(weighted_ratio("heat", ""), 0);
    }

    #[test]
    fn test_resolve_misspelling() {
        let resolver = TitleResolver::new(test_titles()).unwrap();
        let matched = resolver.resolve("terminater").unwrap();
        assert_eq!(matched.title, "The Terminator (1984)");
        assert_eq!(matched.position, 3);
        assert_eq!(matched.score, 81);
    }

    #[test]
    fn test_resolve_exact_title() {
        let resolver = TitleResolver::new(test_titles()).unwrap();
        let matched = resolver.resolve("Heat (1995)").unwrap();
        assert_eq!(matched.title, "Heat (1995)");
        assert_eq!(matched.score, 100);
    }

    #[test]
    fn test_resolve_partial_title() {
        let resolver = TitleResolver::new(test_titles()).unwrap();
        let matched = resolver.resolve("empire strikes back").unwrap();
        assert_eq!(
            matched.title,
            "Star Wars: Episode V - The Empire Strikes Back (1980)"
        );
    }

    #[test]
    fn test_resolve_always_returns_a_match() {
        let resolver = TitleResolver::new(test_titles()).unwrap();
        let matched = resolver.resolve("zzzzqqqq").unwrap();
        assert!(test_titles().contains(&matched.title.as_str()));
    }

    #[test]
    fn test_ties_go_to_first_occurrence() {
        let resolver = TitleResolver::new(vec!["Alpha (1990)", "Alpha (1991)"]).unwrap();
        // Nothing in the query distinguishes the two
        let matched = resolver.resolve("alpha").unwrap();
        assert_eq!(matched.position, 0);

        // Empty queries score zero everywhere
        let matched = resolver.resolve("???").unwrap();
        assert_eq!(matched.position, 0);
        assert_eq!(matched.score, 0);
    }

    #[test]
    fn test_empty_candidates() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(
            TitleResolver::new(empty.clone()),
            Err(RecsError::EmptyCatalog(_))
        ));
        assert!(matches!(resolve("heat", &empty), Err(RecsError::EmptyCatalog(_))));
    }

    #[test]
    fn test_resolve_free_function() {
        let matched = resolve("toy story", &test_titles()).unwrap();
        assert_eq!(matched.title, "Toy Story (1995)");
    }
}
