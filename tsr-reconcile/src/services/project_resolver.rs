//! Project Resolver
//!
//! Maps an extracted (code, name) pair onto the project roster and reports
//! name/code quality problems.
//!
//! # Code grammar
//! A valid code is either a recognized prefix (PJ, REAG, HCST, NTC5 by
//! default) followed by only digits, at least the prefix's minimum count, or
//! a general letter prefix followed by at least one digit. Category labels
//! (DESIGN, LABOUR, ...), alternative reference codes (INFRA*, DATA*) and any
//! other token without a digit are rejected outright, whatever the roster
//! contains. Rejected roster entries are never returned as a match.
//!
//! # Resolution order
//! 1. Exact code
//! 2. Registered alias code
//! 3. Confusable-character variations (sorted, first hit)
//! 4. Single substitution or adjacent transposition against each roster code
//! 5. Similarity ratio ≥ 0.85 with the same two-letter prefix and a length
//!    difference of at most 2
//! 6. Unknown

use crate::similarity::{is_adjacent_transposition, is_single_substitution, similarity_ratio, ConfusableMap};
use crate::types::{MatchMethod, MatchResult, QualityReport};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tsr_common::config::{CodeSettings, TomlConfig};
use tsr_common::roster::{normalize_code, CanonicalProject};
use tsr_common::ProjectRoster;

static CODE_IN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([A-Z0-9]+)\)\s*$").expect("code-in-name pattern is valid"));

static TRAILING_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([A-Z0-9]+\)\s*$").expect("trailing-code pattern is valid"));

static GENERAL_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]+[0-9][A-Z0-9]*$").expect("general code pattern is valid"));

/// Grammar classification of a normalized code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeClass {
    Valid,
    /// A category label captured instead of the real code
    CategoryLabel,
    /// INFRA*/DATA* reference captured instead of the real code
    AlternativeReference,
    /// Letters only, without a recognized prefix
    NonNumeric,
    /// Empty or not matching the grammar
    Malformed,
}

impl CodeClass {
    /// Never a project code, neither as input nor as a roster target
    pub fn is_rejected(self) -> bool {
        matches!(
            self,
            CodeClass::CategoryLabel | CodeClass::AlternativeReference | CodeClass::NonNumeric
        )
    }
}

/// Project code format grammar
#[derive(Debug, Clone)]
pub struct CodeGrammar {
    /// (prefix, minimum digits), longest prefix first
    prefixes: Vec<(String, usize)>,
    category_labels: BTreeSet<String>,
    alternative_prefixes: Vec<String>,
}

impl Default for CodeGrammar {
    fn default() -> Self {
        Self::from_settings(&CodeSettings::default())
    }
}

impl CodeGrammar {
    pub fn from_settings(settings: &CodeSettings) -> Self {
        let mut prefixes: Vec<(String, usize)> = settings
            .recognized_prefixes
            .iter()
            .map(|(prefix, digits)| (normalize_code(prefix), *digits))
            .collect();
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Self {
            prefixes,
            category_labels: settings.category_labels.iter().map(|l| normalize_code(l)).collect(),
            alternative_prefixes: settings
                .alternative_reference_prefixes
                .iter()
                .map(|p| normalize_code(p))
                .collect(),
        }
    }

    /// Longest recognized prefix `code` starts with
    pub fn recognized_prefix<'a>(&'a self, code: &str) -> Option<&'a str> {
        self.prefixes
            .iter()
            .find(|(prefix, _)| code.starts_with(prefix.as_str()))
            .map(|(prefix, _)| prefix.as_str())
    }

    pub fn is_category_label(&self, code: &str) -> bool {
        self.category_labels.contains(code)
    }

    pub fn is_alternative_reference(&self, code: &str) -> bool {
        self.alternative_prefixes.iter().any(|p| code.starts_with(p.as_str()))
            && self.recognized_prefix(code).is_none()
    }

    /// Classify an already-normalized code
    pub fn classify(&self, code: &str) -> CodeClass {
        if code.is_empty() {
            return CodeClass::Malformed;
        }
        if self.is_category_label(code) {
            return CodeClass::CategoryLabel;
        }
        if self.is_alternative_reference(code) {
            return CodeClass::AlternativeReference;
        }

        if let Some((prefix, min_digits)) = self
            .prefixes
            .iter()
            .find(|(prefix, _)| code.starts_with(prefix.as_str()))
        {
            let rest = &code[prefix.len()..];
            if rest.chars().all(|c| c.is_ascii_digit()) {
                return if rest.len() >= *min_digits {
                    CodeClass::Valid
                } else {
                    CodeClass::Malformed
                };
            }
        }

        if GENERAL_CODE.is_match(code) {
            CodeClass::Valid
        } else if !code.chars().any(|c| c.is_ascii_digit()) {
            CodeClass::NonNumeric
        } else {
            CodeClass::Malformed
        }
    }

    pub fn is_valid(&self, code: &str) -> bool {
        self.classify(code) == CodeClass::Valid
    }

    pub fn is_rejected(&self, code: &str) -> bool {
        self.classify(code).is_rejected()
    }
}

/// Code found in trailing parentheses: `"Description (PJ024483)"` → `PJ024483`
pub fn extract_code_from_name(project_name: &str) -> Option<String> {
    CODE_IN_NAME
        .captures(project_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Replace any trailing `(XXX)` with `(code)`
pub fn fix_project_name_format(project_name: &str, project_code: &str) -> String {
    let cleaned = TRAILING_CODE.replace(project_name, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        format!("({})", project_code)
    } else {
        format!("{} ({})", cleaned, project_code)
    }
}

/// Text before the first `(`, trimmed
pub fn base_name(project_name: &str) -> &str {
    project_name.split('(').next().unwrap_or("").trim()
}

/// Project Resolver
pub struct ProjectResolver {
    grammar: CodeGrammar,
    confusables: ConfusableMap,
    /// Minimum ratio for the last-resort similarity match (default 0.85)
    fuzzy_threshold: f64,
    /// Maximum length difference for a similarity match (default 2)
    max_length_delta: usize,
    confusable_confidence: f64,
    edit_confidence: f64,
}

impl Default for ProjectResolver {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

impl ProjectResolver {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            grammar: CodeGrammar::from_settings(&config.codes),
            confusables: ConfusableMap::from_pairs(&config.confusables.pairs),
            fuzzy_threshold: config.matching.project_fuzzy_threshold,
            max_length_delta: config.matching.max_code_length_delta,
            confusable_confidence: config.matching.confusable_confidence,
            edit_confidence: config.matching.edit_confidence,
        }
    }

    pub fn grammar(&self) -> &CodeGrammar {
        &self.grammar
    }

    pub fn confusables(&self) -> &ConfusableMap {
        &self.confusables
    }

    /// Resolve a code and analyze the (code, name) pair
    ///
    /// Quality is judged against the resolved code when one was found,
    /// otherwise against the normalized raw code.
    pub fn resolve(&self, raw_code: &str, raw_name: &str, roster: &ProjectRoster) -> (MatchResult, QualityReport) {
        let result = self.resolve_code(raw_code, roster);
        let quality = self.analyze_quality(&result.canonical_value, raw_name);
        (result, quality)
    }

    /// Resolve a code against the roster
    pub fn resolve_code(&self, raw_code: &str, roster: &ProjectRoster) -> MatchResult {
        let code = normalize_code(raw_code);

        if code.is_empty() {
            return MatchResult::unknown(code, 0.0);
        }
        if self.grammar.is_rejected(&code) {
            tracing::debug!(code = %code, "Rejected non-project code");
            return MatchResult::unknown(code, 0.0);
        }

        // Step 1: exact
        if let Some(project) = roster.get(&code) {
            return MatchResult::exact(project.code.clone());
        }

        // Step 2: alias code
        if let Some(project) = roster
            .find_by_alias_code(&code)
            .filter(|project| !self.grammar.is_rejected(&project.code))
        {
            tracing::debug!(raw = %code, canonical = %project.code, "Project resolved via alias");
            return MatchResult::alias(project.code.clone());
        }

        // Step 3: confusable variations
        if let Some(project) = self
            .confusables
            .variations(&code)
            .iter()
            .filter(|variation| **variation != code)
            .find_map(|variation| roster.get(variation))
            .filter(|project| !self.grammar.is_rejected(&project.code))
        {
            tracing::debug!(raw = %code, canonical = %project.code, "Project resolved via confusable");
            return MatchResult::fuzzy(project.code.clone(), self.confusable_confidence, MatchMethod::Confusable);
        }

        // Step 4: single substitution / adjacent transposition
        for project in self.targets(roster) {
            if is_single_substitution(&code, &project.code) {
                tracing::debug!(raw = %code, canonical = %project.code, "Project resolved via substitution");
                return MatchResult::fuzzy(project.code.clone(), self.edit_confidence, MatchMethod::Substitution);
            }
            if is_adjacent_transposition(&code, &project.code) {
                tracing::debug!(raw = %code, canonical = %project.code, "Project resolved via transposition");
                return MatchResult::fuzzy(project.code.clone(), self.edit_confidence, MatchMethod::Transposition);
            }
        }

        // Step 5: guarded similarity
        let mut best_overall = 0.0_f64;
        let mut best_guarded: Option<(&str, f64)> = None;
        for project in self.targets(roster) {
            let score = similarity_ratio(&code, &project.code);
            best_overall = best_overall.max(score);

            if !self.similarity_guard(&code, &project.code) {
                continue;
            }
            if best_guarded.map_or(true, |(_, best)| score > best) {
                best_guarded = Some((project.code.as_str(), score));
            }
        }

        match best_guarded {
            Some((canonical, score)) if score >= self.fuzzy_threshold => {
                tracing::debug!(raw = %code, canonical = %canonical, score = score, "Project resolved via similarity");
                MatchResult::fuzzy(canonical, score, MatchMethod::Similarity)
            }
            _ => MatchResult::unknown(code, best_overall),
        }
    }

    /// Roster entries a fuzzy step may return
    fn targets<'r>(&'r self, roster: &'r ProjectRoster) -> impl Iterator<Item = &'r CanonicalProject> + 'r {
        roster.iter().filter(move |project| !self.grammar.is_rejected(&project.code))
    }

    /// Same two-letter prefix and lengths within the allowed delta
    fn similarity_guard(&self, a: &str, b: &str) -> bool {
        let prefix = |s: &str| s.chars().take(2).collect::<String>();
        let a_len = a.chars().count();
        let b_len = b.chars().count();
        a_len >= 2 && prefix(a) == prefix(b) && a_len.abs_diff(b_len) <= self.max_length_delta
    }

    /// Name-format validation and code quality checks for one pair
    ///
    /// Issues are format violations; warnings are suspicious but possibly valid.
    pub fn analyze_quality(&self, code: &str, name: &str) -> QualityReport {
        let code = normalize_code(code);
        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        let code_in_name = extract_code_from_name(name);

        // Name format
        let format_correct = match &code_in_name {
            None => {
                issues.push(format!(
                    "Project code missing from name: expected 'Description ({})'",
                    code
                ));
                false
            }
            Some(found) if *found != code => {
                issues.push(format!(
                    "Wrong code in name: '{}' doesn't match project code '{}'",
                    found, code
                ));
                false
            }
            Some(_) => true,
        };

        // The line's own code
        match self.grammar.classify(&code) {
            CodeClass::CategoryLabel => issues.push(format!(
                "Category label used as code: '{}' is not a project code",
                code
            )),
            CodeClass::AlternativeReference => issues.push(format!(
                "Alternative reference code used as code: '{}' is not a valid project code",
                code
            )),
            CodeClass::NonNumeric => issues.push(format!(
                "Non-numeric code: '{}' has no digits and is not a project code",
                code
            )),
            _ => {}
        }

        // The code embedded in the name
        if let Some(found) = &code_in_name {
            if *found != code {
                if self.confusables.variations(&code).contains(found) {
                    warnings.push(format!(
                        "Code in name '{}' might be OCR confusion of '{}'",
                        found, code
                    ));
                }
                if self.grammar.is_category_label(found) {
                    issues.push(format!(
                        "Category label used as code: '{}' in name is not a project code",
                        found
                    ));
                } else if self.grammar.is_alternative_reference(found) {
                    issues.push(format!(
                        "'{}' in name appears to be an alternative reference code, not a valid project code",
                        found
                    ));
                }
            }
        }

        if !code.is_empty() {
            match self.grammar.recognized_prefix(&code) {
                None => warnings.push(format!("Unusual project code prefix: {}", code)),
                Some(prefix) => {
                    let rest = &code[prefix.len()..];
                    if rest.starts_with('9') {
                        warnings.push(format!(
                            "'{}' has a 9 straight after the prefix, which is rare; probable 9/0 misread of '{}0{}'",
                            code,
                            prefix,
                            &rest[1..]
                        ));
                    }
                }
            }
        }

        QualityReport {
            valid: issues.is_empty(),
            issues,
            warnings,
            code_in_name,
            format_correct,
        }
    }

    /// Recover a line's code from its name when the extracted code is a
    /// category label, alternative reference or other non-numeric token
    ///
    /// Only returns a code that is grammar-valid and resolves to an accepted
    /// roster entry; nothing is invented.
    pub fn recover_code_from_name(&self, raw_code: &str, name: &str, roster: &ProjectRoster) -> Option<MatchResult> {
        let code = normalize_code(raw_code);
        if !self.grammar.is_rejected(&code) {
            return None;
        }

        let candidate = extract_code_from_name(name)?;
        if !self.grammar.is_valid(&candidate) {
            return None;
        }
        let result = self.resolve_code(&candidate, roster);
        result.is_match().then_some(result)
    }
}
