//! Configuration loading and resolution
//!
//! Every tunable heuristic (thresholds, confusable pairs, hour corrections,
//! code grammar tables, bank holidays) lives in [`TomlConfig`] so it can be
//! adjusted against real OCR error data without code changes.
//!
//! Config file resolution priority:
//! 1. Explicit path (command-line argument)
//! 2. `TSR_CONFIG` environment variable
//! 3. `<user config dir>/tsr/config.toml`
//! 4. Compiled defaults
//!
//! A missing or unreadable file is never fatal: the resolver warns and uses
//! defaults. A file that reads but does not parse is a configuration error.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TSR_CONFIG";

/// Root TOML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub reconcile: ReconcileSettings,
    pub matching: MatchingSettings,
    pub confusables: ConfusableSettings,
    pub hours: HoursSettings,
    pub codes: CodeSettings,
    pub validation: ValidationSettings,
    pub bank_holidays: Vec<BankHoliday>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Grid reconciliation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSettings {
    /// Hours difference below which a day counts as consistent
    pub tolerance: f64,
    /// Maximum distance of any day's header/body ratio from the mean ratio
    /// for proportional scaling to apply
    pub scaling_ratio_spread: f64,
    /// Upper bound on hypotheses evaluated per timesheet before giving up
    pub max_hypotheses: usize,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            scaling_ratio_spread: 0.1,
            max_hypotheses: 50_000,
        }
    }
}

/// Identity resolution thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Minimum confidence for automatic acceptance (and for fuzzy person matches)
    pub accept_threshold: f64,
    /// Minimum confidence for manual review (below this, reject)
    pub review_threshold: f64,
    /// Minimum ratio for the last-resort fuzzy project code match
    pub project_fuzzy_threshold: f64,
    /// Maximum length difference for a fuzzy project code match
    pub max_code_length_delta: usize,
    /// Confidence assigned to a confusable-character code match
    pub confusable_confidence: f64,
    /// Confidence assigned to a single-substitution or transposition code match
    pub edit_confidence: f64,
    /// Maximum edit distance for flagging two codes in one timesheet as the same project
    pub similar_code_max_distance: usize,
    /// Minimum base-name similarity for the same check
    pub similar_name_threshold: f64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            accept_threshold: 0.85,
            review_threshold: 0.60,
            project_fuzzy_threshold: 0.85,
            max_code_length_delta: 2,
            confusable_confidence: 0.95,
            edit_confidence: 0.90,
            similar_code_max_distance: 2,
            similar_name_threshold: 0.7,
        }
    }
}

/// Characters OCR is known to confuse, as symmetric two-character pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfusableSettings {
    pub pairs: Vec<String>,
}

impl Default for ConfusableSettings {
    fn default() -> Self {
        let pairs = [
            "09", "08", "0O", "98", "65", "5S", "23", "2Z", "17", "1I", "1L", "CG",
        ];
        Self {
            pairs: pairs.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Hours field heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoursSettings {
    /// Values in `[missing_decimal_min, missing_decimal_max]` that are a
    /// multiple of `missing_decimal_step` are divided by 10
    pub missing_decimal_min: f64,
    pub missing_decimal_max: f64,
    pub missing_decimal_step: f64,
    /// Exact doubled single-task values and their corrections
    pub double_entry: Vec<HourCorrection>,
    pub max_daily_hours: f64,
}

/// One exact-value hours correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourCorrection {
    pub from: f64,
    pub to: f64,
}

impl Default for HoursSettings {
    fn default() -> Self {
        Self {
            missing_decimal_min: 70.0,
            missing_decimal_max: 85.0,
            missing_decimal_step: 5.0,
            double_entry: vec![
                HourCorrection { from: 15.0, to: 7.5 },
                HourCorrection { from: 16.0, to: 8.0 },
            ],
            max_daily_hours: 24.0,
        }
    }
}

/// Project code grammar tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSettings {
    /// Recognized prefixes and the minimum digit count that must follow
    pub recognized_prefixes: BTreeMap<String, usize>,
    /// Category labels sometimes captured instead of the real code
    pub category_labels: Vec<String>,
    /// Prefixes of alternative reference codes (rejected as project codes)
    pub alternative_reference_prefixes: Vec<String>,
    /// Letter → digit replacements applied to the numeric suffix of `AA999999` codes
    pub suffix_letter_digits: BTreeMap<String, String>,
}

impl Default for CodeSettings {
    fn default() -> Self {
        let recognized_prefixes = [("PJ", 6), ("REAG", 1), ("HCST", 0), ("NTC5", 0)]
            .into_iter()
            .map(|(p, n)| (p.to_string(), n))
            .collect();
        let category_labels = ["DESIGN", "DESIGNA", "LABOUR", "TESTING", "BUILD", "DEPLOY", "BLDDPLYTEST"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let suffix_letter_digits = [("O", "0"), ("I", "1"), ("L", "1"), ("Z", "2"), ("S", "5"), ("B", "8"), ("G", "6")]
            .into_iter()
            .map(|(l, d)| (l.to_string(), d.to_string()))
            .collect();
        Self {
            recognized_prefixes,
            category_labels,
            alternative_reference_prefixes: vec!["INFRA".to_string(), "DATA".to_string()],
            suffix_letter_digits,
        }
    }
}

/// Whole-timesheet validation limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Weekly totals above this almost always mean "Posted Actuals" was extracted
    pub posted_actuals_weekly_limit: f64,
    /// Per-project weekly totals above this are flagged as a warning
    pub project_week_warning: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            posted_actuals_weekly_limit: 60.0,
            project_week_warning: 50.0,
        }
    }
}

/// A non-working public holiday; hours on it are forced to zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankHoliday {
    pub date: NaiveDate,
    pub name: String,
}

/// UK bank holidays for 2025
pub fn default_bank_holidays() -> Vec<BankHoliday> {
    [
        ((2025, 1, 1), "New Year's Day"),
        ((2025, 4, 18), "Good Friday"),
        ((2025, 4, 21), "Easter Monday"),
        ((2025, 5, 5), "Early May bank holiday"),
        ((2025, 5, 26), "Spring bank holiday"),
        ((2025, 8, 25), "Summer bank holiday"),
        ((2025, 12, 25), "Christmas Day"),
        ((2025, 12, 26), "Boxing Day"),
    ]
    .into_iter()
    .filter_map(|((y, m, d), name)| {
        NaiveDate::from_ymd_opt(y, m, d).map(|date| BankHoliday {
            date,
            name: name.to_string(),
        })
    })
    .collect()
}

impl TomlConfig {
    /// Compiled defaults, including the default bank-holiday calendar
    pub fn compiled_defaults() -> Self {
        Self {
            bank_holidays: default_bank_holidays(),
            ..Self::default()
        }
    }

    /// Parse TOML text; sections not present keep their defaults
    ///
    /// A document without a `bank_holidays` key gets the default calendar.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: toml::Value = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        let has_holidays = value.get("bank_holidays").is_some();

        let mut config: TomlConfig = value
            .try_into()
            .map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?;
        if !has_holidays {
            config.bank_holidays = default_bank_holidays();
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the heuristics meaningless
    pub fn validate(&self) -> Result<()> {
        if self.reconcile.tolerance <= 0.0 {
            return Err(Error::Config(format!(
                "reconcile.tolerance must be positive, got {}",
                self.reconcile.tolerance
            )));
        }
        if self.matching.review_threshold > self.matching.accept_threshold {
            return Err(Error::Config(format!(
                "matching.review_threshold ({}) exceeds accept_threshold ({})",
                self.matching.review_threshold, self.matching.accept_threshold
            )));
        }
        if let Some(bad) = self.confusables.pairs.iter().find(|p| p.chars().count() != 2) {
            return Err(Error::Config(format!(
                "confusables.pairs entries must be exactly two characters, got '{}'",
                bad
            )));
        }
        if self.hours.missing_decimal_step <= 0.0 {
            return Err(Error::Config("hours.missing_decimal_step must be positive".to_string()));
        }
        Ok(())
    }
}

/// Locates and loads the active configuration
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Config file path to use, if any, by priority
    pub fn config_path(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: user config directory
        dirs::config_dir()
            .map(|d| d.join("tsr").join("config.toml"))
            .filter(|p| p.exists())
    }

    /// Load the configuration, falling back to compiled defaults when no
    /// file exists or the file cannot be read
    ///
    /// # Errors
    /// `Error::Config` when the file was read but cannot be parsed or fails validation.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let Some(path) = self.config_path() else {
            info!("No config file found, using compiled defaults");
            return Ok(TomlConfig::compiled_defaults());
        };

        if !path.exists() {
            warn!(
                path = %path.display(),
                "Config file not found, using compiled defaults"
            );
            return Ok(TomlConfig::compiled_defaults());
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Config file unreadable, using compiled defaults"
                );
                return Ok(TomlConfig::compiled_defaults());
            }
        };

        let config = TomlConfig::from_toml_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled_defaults() {
        let config = TomlConfig::compiled_defaults();
        assert_eq!(config.reconcile.tolerance, 0.01);
        assert_eq!(config.matching.accept_threshold, 0.85);
        assert_eq!(config.codes.recognized_prefixes.get("PJ"), Some(&6));
        assert_eq!(config.bank_holidays.len(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [matching]
            accept_threshold = 0.9

            [hours]
            double_entry = [{ from = 14.0, to = 7.0 }]
            "#,
        )
        .unwrap();

        assert_eq!(config.matching.accept_threshold, 0.9);
        assert_eq!(config.matching.review_threshold, 0.60);
        assert_eq!(config.hours.double_entry, vec![HourCorrection { from: 14.0, to: 7.0 }]);
        assert_eq!(config.hours.max_daily_hours, 24.0);
        assert_eq!(config.bank_holidays.len(), 8);
    }

    #[test]
    fn test_explicit_empty_bank_holidays() {
        let config = TomlConfig::from_toml_str("bank_holidays = []").unwrap();
        assert!(config.bank_holidays.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = TomlConfig::from_toml_str("[confusables]\npairs = [\"012\"]").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = TomlConfig::from_toml_str("[reconcile]\ntolerance = 0.0").unwrap_err();
        assert!(err.to_string().contains("tolerance"));

        assert!(TomlConfig::from_toml_str("not = [valid").is_err());
    }
}
