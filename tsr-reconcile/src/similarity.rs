//! String similarity primitives
//!
//! Pure functions used by every resolver:
//! - [`edit_distance`]: Levenshtein distance, used as a hard gate
//! - [`similarity_ratio`]: matching-blocks ratio `2M / T`, used for ranking
//! - [`ConfusableMap`]: OCR confusable characters and single-swap variations
//! - [`is_single_substitution`] / [`is_adjacent_transposition`]: code misread checks

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};
use tsr_common::config::ConfusableSettings;

/// Default confusable table (see [`ConfusableSettings::default`])
static DEFAULT_CONFUSABLES: Lazy<ConfusableMap> =
    Lazy::new(|| ConfusableMap::from_pairs(&ConfusableSettings::default().pairs));

/// Levenshtein distance (unit-cost insert/delete/substitute) over characters
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Sequence-matching similarity in `[0, 1]`
///
/// Case-insensitive and whitespace-trimmed. Matching characters are found by
/// repeatedly taking the longest common block and recursing on both sides of
/// it; the ratio is `2 * matched / (len(a) + len(b))`. Returns 0.0 when
/// either side is empty.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let matched = matching_characters(&a, &b);
    2.0 * matched as f64 / (a.len() + b.len()) as f64
}

/// Total size of all matching blocks between `a` and `b`
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        total += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    total
}

/// Longest common block in `a[alo..ahi]` × `b[blo..bhi]`
///
/// Ties resolve to the earliest start in `a`, then the earliest start in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run[j - blo + 1] = length of the common run ending at (i - 1, j)
    let width = bhi - blo + 1;
    let mut previous = vec![0usize; width];
    let mut current = vec![0usize; width];

    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            if a[i] == b[j] {
                let run = previous[slot - 1] + 1;
                current[slot] = run;
                if run > best_size {
                    best_i = i + 1 - run;
                    best_j = j + 1 - run;
                    best_size = run;
                }
            } else {
                current[slot] = 0;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    (best_i, best_j, best_size)
}

/// True iff same length and exactly one differing position
pub fn is_single_substitution(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    a.len() == b.len() && a.iter().zip(&b).filter(|(x, y)| x != y).count() == 1
}

/// True iff same length and the only difference is one adjacent swapped pair
pub fn is_adjacent_transposition(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len() != b.len() || a.len() < 2 {
        return false;
    }

    let diffs: Vec<usize> = (0..a.len()).filter(|&i| a[i] != b[i]).collect();
    match diffs.as_slice() {
        [first, second] => *second == first + 1 && a[*first] == b[*second] && a[*second] == b[*first],
        _ => false,
    }
}

/// Symmetric table of characters OCR confuses with each other
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfusableMap {
    table: BTreeMap<char, BTreeSet<char>>,
}

impl ConfusableMap {
    /// Build from two-character pair strings such as `"09"` or `"5S"`
    ///
    /// Each pair is registered in both directions; entries not exactly two
    /// characters long are ignored.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Self {
        let mut table: BTreeMap<char, BTreeSet<char>> = BTreeMap::new();
        for pair in pairs {
            let chars: Vec<char> = pair.as_ref().chars().collect();
            if let [x, y] = chars.as_slice() {
                if x != y {
                    table.entry(*x).or_default().insert(*y);
                    table.entry(*y).or_default().insert(*x);
                }
            }
        }
        Self { table }
    }

    /// Built-in default table
    pub fn default_map() -> &'static ConfusableMap {
        &DEFAULT_CONFUSABLES
    }

    /// Characters `c` may have been misread from
    pub fn confusables_of(&self, c: char) -> impl Iterator<Item = char> + '_ {
        self.table.get(&c).into_iter().flatten().copied()
    }

    pub fn are_confusable(&self, a: char, b: char) -> bool {
        self.table.get(&a).is_some_and(|set| set.contains(&b))
    }

    /// `token` plus every string reachable by replacing exactly one character
    /// with one of its confusables
    pub fn variations(&self, token: &str) -> BTreeSet<String> {
        let chars: Vec<char> = token.chars().collect();
        let mut variations = BTreeSet::new();
        variations.insert(token.to_string());

        for (position, &original) in chars.iter().enumerate() {
            for replacement in self.confusables_of(original) {
                let mut candidate = chars.clone();
                candidate[position] = replacement;
                variations.insert(candidate.into_iter().collect());
            }
        }
        variations
    }
}

/// [`ConfusableMap::variations`] against the default table
pub fn confusable_variations(token: &str) -> BTreeSet<String> {
    DEFAULT_CONFUSABLES.variations(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("PJ023275", "PJ928275"), 2);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("PJ024483", "PJ024483"), 0);
    }

    #[test]
    fn test_similarity_ratio_basic() {
        assert_eq!(similarity_ratio("abcd", "abcd"), 1.0);
        assert_eq!(similarity_ratio("abcd", "wxyz"), 0.0);
        assert_eq!(similarity_ratio("", "abc"), 0.0);
        // "ab" + "d" match: 2*3/8
        assert_eq!(similarity_ratio("abcd", "abxd"), 0.75);
    }

    #[test]
    fn test_similarity_ratio_case_and_whitespace_insensitive() {
        assert_eq!(similarity_ratio("  Neil Pomfret ", "neil pomfret"), 1.0);
    }

    #[test]
    fn test_similarity_ratio_exact_threshold_values() {
        // 17 matched characters out of 40
        assert_eq!(similarity_ratio("abcdefghijklmnopqrst", "abcdefXhijklmYopqrsZ"), 0.85);
        // 21 matched characters out of 50
        assert_eq!(
            similarity_ratio("abcdefghijklmnopqrstuvwxy", "abcde1ghijk2mnopq3stuv4xy"),
            0.84
        );
    }

    #[test]
    fn test_similarity_ratio_uses_longest_block_first() {
        // longest block "bcd" consumed first, then nothing left on the left side
        let ratio = similarity_ratio("abcd", "bcda");
        assert_eq!(ratio, 0.75);
    }

    #[test]
    fn test_single_substitution() {
        assert!(is_single_substitution("PJ023275", "PJ023276"));
        assert!(!is_single_substitution("PJ023275", "PJ023275"));
        assert!(!is_single_substitution("PJ023275", "PJ928275"));
        assert!(!is_single_substitution("AB", "ABC"));
    }

    #[test]
    fn test_adjacent_transposition() {
        assert!(is_adjacent_transposition("PJ021391", "PJ021931"));
        assert!(is_adjacent_transposition("0193", "0913"));
        assert!(!is_adjacent_transposition("ABCD", "BADC"));
        assert!(!is_adjacent_transposition("ABCD", "ABCD"));
        assert!(!is_adjacent_transposition("ABCD", "ADCB"));
        assert!(!is_adjacent_transposition("A", "A"));
    }

    #[test]
    fn test_confusable_variations_round_trip() {
        let forward = confusable_variations("PJ024542");
        assert!(forward.contains("PJ024542"));
        assert!(forward.contains("PJ024642"));

        let backward = confusable_variations("PJ024642");
        assert!(backward.contains("PJ024542"));
    }

    #[test]
    fn test_confusable_variations_single_position_only() {
        let variations = confusable_variations("00");
        assert!(variations.contains("90"));
        assert!(variations.contains("O0"));
        assert!(!variations.contains("99"));
    }

    #[test]
    fn test_custom_confusable_map() {
        let map = ConfusableMap::from_pairs(&["47", "bad", "xx"]);
        assert!(map.are_confusable('4', '7'));
        assert!(map.are_confusable('7', '4'));
        assert!(!map.are_confusable('0', '9'));
        assert_eq!(map.variations("14").len(), 2);
    }
}
