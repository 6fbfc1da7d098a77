//! Shared result types for resolvers, validators and the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a raw value was mapped onto the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Alias,
    Fuzzy,
    Unknown,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Alias => "alias",
            MatchKind::Fuzzy => "fuzzy",
            MatchKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which resolution step produced a match (finer than [`MatchKind`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Alias,
    Confusable,
    Substitution,
    Transposition,
    Similarity,
}

/// Resolver output for one person name or project code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Canonical value when matched, otherwise the raw value unchanged
    pub canonical_value: String,
    /// 0.0-1.0
    pub confidence: f64,
    pub match_kind: MatchKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<MatchMethod>,
}

impl MatchResult {
    pub fn exact(value: impl Into<String>) -> Self {
        Self {
            canonical_value: value.into(),
            confidence: 1.0,
            match_kind: MatchKind::Exact,
            method: Some(MatchMethod::Exact),
        }
    }

    pub fn alias(value: impl Into<String>) -> Self {
        Self {
            canonical_value: value.into(),
            confidence: 1.0,
            match_kind: MatchKind::Alias,
            method: Some(MatchMethod::Alias),
        }
    }

    pub fn fuzzy(value: impl Into<String>, confidence: f64, method: MatchMethod) -> Self {
        Self {
            canonical_value: value.into(),
            confidence,
            match_kind: MatchKind::Fuzzy,
            method: Some(method),
        }
    }

    /// No roster entry; `confidence` carries the best score seen, for diagnostics
    pub fn unknown(raw: impl Into<String>, confidence: f64) -> Self {
        Self {
            canonical_value: raw.into(),
            confidence,
            match_kind: MatchKind::Unknown,
            method: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.match_kind != MatchKind::Unknown
    }
}

/// Identification decision based on confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Write the canonical value (confidence >= accept threshold)
    Accept,
    /// Keep raw value, flag for manual confirmation
    Review,
    /// Keep raw value
    Reject,
}

impl Decision {
    /// Classify a confidence against accept/review thresholds
    pub fn from_confidence(confidence: f64, accept_threshold: f64, review_threshold: f64) -> Self {
        if confidence >= accept_threshold {
            Decision::Accept
        } else if confidence >= review_threshold {
            Decision::Review
        } else {
            Decision::Reject
        }
    }

    /// Decision for a resolver result; unknown matches are never accepted
    pub fn for_match(result: &MatchResult, accept_threshold: f64, review_threshold: f64) -> Self {
        if !result.is_match() {
            return if result.confidence >= review_threshold {
                Decision::Review
            } else {
                Decision::Reject
            };
        }
        Self::from_confidence(result.confidence, accept_threshold, review_threshold)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Accept => "Accept",
            Decision::Review => "Review",
            Decision::Reject => "Reject",
        }
    }
}

/// Report-level problem category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Scalar field could not be interpreted
    Parse,
    /// Scalar field parsed but impossible
    Range,
    /// Row/column totals disagree
    Consistency,
    /// Name or code did not resolve above threshold
    UnknownIdentity,
    /// Project name/code format problem
    FormatViolation,
}

/// One reported problem; never raised, always returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

/// Quality analysis of one project (code, name) pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// No issues (warnings allowed)
    pub valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    /// Code found in trailing parentheses of the name
    pub code_in_name: Option<String>,
    /// Name ends in `(CODE)` with the line's own code
    pub format_correct: bool,
}
