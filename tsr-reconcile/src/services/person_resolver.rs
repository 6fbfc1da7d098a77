//! Person Resolver
//!
//! Maps an extracted resource name onto the team roster.
//!
//! Resolution order:
//! 1. Exact canonical name → confidence 1.0, `exact`
//! 2. Curated alias table → confidence 1.0, `alias`
//! 3. Best [`similarity_ratio`] over the roster ≥ threshold → `fuzzy`
//! 4. Otherwise `unknown`, raw name kept, best ratio reported
//!
//! The resolver only reads the roster. Whether a fuzzy match is written back
//! is the caller's [`Decision`](crate::types::Decision).

use crate::similarity::similarity_ratio;
use crate::types::{MatchMethod, MatchResult};
use tsr_common::config::MatchingSettings;
use tsr_common::PersonRoster;

/// Person Resolver
pub struct PersonResolver {
    /// Minimum ratio for a fuzzy match (default 0.85)
    fuzzy_threshold: f64,
}

impl Default for PersonResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonResolver {
    pub fn new() -> Self {
        Self { fuzzy_threshold: 0.85 }
    }

    pub fn from_settings(settings: &MatchingSettings) -> Self {
        Self {
            fuzzy_threshold: settings.accept_threshold,
        }
    }

    /// Resolve one extracted name
    ///
    /// Never fails: an empty roster yields `unknown` with confidence 0.
    pub fn resolve(&self, raw_name: &str, roster: &PersonRoster) -> MatchResult {
        let name = raw_name.trim();

        if roster.contains(name) {
            return MatchResult::exact(name);
        }

        if let Some(canonical) = roster.alias_target(name) {
            tracing::debug!(raw = %name, canonical = %canonical, "Person resolved via alias");
            return MatchResult::alias(canonical);
        }

        let best = roster
            .members()
            .map(|member| (member, similarity_ratio(name, member)))
            .fold(None::<(&str, f64)>, |best, candidate| match best {
                Some((_, score)) if score >= candidate.1 => best,
                _ => Some(candidate),
            });

        match best {
            Some((member, score)) if score >= self.fuzzy_threshold => {
                tracing::debug!(
                    raw = %name,
                    canonical = %member,
                    score = score,
                    "Person resolved via similarity"
                );
                MatchResult::fuzzy(member, score, MatchMethod::Similarity)
            }
            Some((member, score)) => {
                tracing::debug!(
                    raw = %name,
                    closest = %member,
                    score = score,
                    "Person not resolved"
                );
                MatchResult::unknown(raw_name, score)
            }
            None => MatchResult::unknown(raw_name, 0.0),
        }
    }
}
