//! Scalar field errors
//!
//! Raised by the field validator for a single cell. The pipeline never lets
//! these escape: each one is turned into an [`Issue`](crate::types::Issue)
//! and the cell gets a safe value.

use thiserror::Error;

/// Failure to accept one extracted field value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// Value could not be interpreted at all after normalization
    #[error("cannot parse '{raw}': {reason}")]
    Parse { raw: String, reason: String },

    /// Value parsed but is semantically impossible
    #[error("{value} is out of range: {reason}")]
    Range { value: f64, reason: String },

    /// Field was blank where a value is required
    #[error("empty value")]
    Empty,
}
