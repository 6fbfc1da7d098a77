//! Similar project codes within one timesheet
//!
//! Two rows whose codes are a small edit apart and whose descriptions read
//! the same are usually one project split by an OCR misread
//! (e.g. PJ024542 / PJ024642 "Roaming Bar").

use crate::services::project_resolver::base_name;
use crate::similarity::{edit_distance, similarity_ratio};
use serde::{Deserialize, Serialize};
use tsr_common::config::MatchingSettings;
use tsr_common::ProjectLine;

/// A pair of rows that probably refer to the same project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarCodePair {
    pub first_code: String,
    pub second_code: String,
    pub edit_distance: usize,
    pub name_similarity: f64,
}

impl SimilarCodePair {
    pub fn describe(&self) -> String {
        format!(
            "Codes {} and {} are {} edit(s) apart with {:.0}% similar names; possible OCR duplicate",
            self.first_code,
            self.second_code,
            self.edit_distance,
            self.name_similarity * 100.0
        )
    }
}

/// Pairs of distinct codes with edit distance ≤ `max_distance` and base-name
/// similarity ≥ `name_threshold`, in row order
pub fn find_similar_code_pairs(lines: &[ProjectLine], settings: &MatchingSettings) -> Vec<SimilarCodePair> {
    let mut pairs = Vec::new();

    for (i, first) in lines.iter().enumerate() {
        for second in &lines[i + 1..] {
            if first.project_code == second.project_code {
                continue;
            }
            let distance = edit_distance(&first.project_code, &second.project_code);
            if distance > settings.similar_code_max_distance {
                continue;
            }
            let name_similarity = similarity_ratio(base_name(&first.project_name), base_name(&second.project_name));
            if name_similarity >= settings.similar_name_threshold {
                pairs.push(SimilarCodePair {
                    first_code: first.project_code.clone(),
                    second_code: second.project_code.clone(),
                    edit_distance: distance,
                    name_similarity,
                });
            }
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(code: &str, name: &str) -> ProjectLine {
        ProjectLine::new(code, name, [0.0; 7])
    }

    #[test]
    fn test_finds_ocr_split_rows() {
        let lines = vec![
            line("PJ024542", "Roaming Bar (PJ024542)"),
            line("PJ024642", "Roaming Bar (PJ024642)"),
            line("PJ023275", "Site works (PJ023275)"),
            line("PJ928275", "Site works (PJ928275)"),
        ];
        let pairs = find_similar_code_pairs(&lines, &MatchingSettings::default());
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].first_code, "PJ024542");
        assert_eq!(pairs[0].edit_distance, 1);
        assert_eq!(pairs[1].second_code, "PJ928275");
        assert_eq!(pairs[1].edit_distance, 2);
        assert!(pairs[1].describe().contains("possible OCR duplicate"));
    }

    #[test]
    fn test_ignores_close_codes_with_different_names() {
        let lines = vec![
            line("PJ024542", "Roaming Bar (PJ024542)"),
            line("PJ024642", "Data centre cooling (PJ024642)"),
        ];
        assert!(find_similar_code_pairs(&lines, &MatchingSettings::default()).is_empty());
    }
}
