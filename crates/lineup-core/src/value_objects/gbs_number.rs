//! GBS group number
//!
//! The small-group identifier staff assign to each participant. Always a
//! positive integer; `None` at the record level means unassigned.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated GBS group number (>= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct GbsNumber(u32);

impl GbsNumber {
    /// Create from a raw value, rejecting zero
    pub fn new(value: u32) -> Result<Self, GbsNumberParseError> {
        if value == 0 {
            return Err(GbsNumberParseError::NotPositive);
        }
        Ok(Self(value))
    }

    /// Get the inner value
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Parse raw assignment-field input.
    ///
    /// This is the single validation point for the editable assignment field:
    /// trimmed empty input means "unassign" (`None`), anything else must be a
    /// positive integer. Invalid input never reaches the network.
    pub fn parse_assignment(input: &str) -> Result<Option<Self>, GbsNumberParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let value: u32 = trimmed
            .parse()
            .map_err(|_| GbsNumberParseError::NotNumeric(trimmed.to_string()))?;
        Self::new(value).map(Some)
    }
}

/// Error when parsing assignment-field input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GbsNumberParseError {
    #[error("group number must be numeric: {0:?}")]
    NotNumeric(String),

    #[error("group number must be positive")]
    NotPositive,
}

impl fmt::Display for GbsNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for GbsNumber {
    type Error = GbsNumberParseError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GbsNumber> for u32 {
    fn from(n: GbsNumber) -> Self {
        n.0
    }
}
