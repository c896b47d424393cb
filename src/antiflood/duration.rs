//! Compact duration specs ("4m", "3h", "6d", "5w").
//!
//! A spec is a positive integer immediately followed by a unit:
//! - m: minutes
//! - h: hours
//! - d: days
//! - w: weeks
//!
//! Expiry instants are always computed against the timestamp of the
//! message that triggered enforcement, never against "now".

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use super::error::{FloodError, FloodResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl DurationUnit {
    fn from_suffix(c: char) -> Option<Self> {
        match c {
            'm' => Some(Self::Minutes),
            'h' => Some(Self::Hours),
            'd' => Some(Self::Days),
            'w' => Some(Self::Weeks),
            _ => None,
        }
    }

    fn suffix(self) -> char {
        match self {
            Self::Minutes => 'm',
            Self::Hours => 'h',
            Self::Days => 'd',
            Self::Weeks => 'w',
        }
    }

    fn seconds(self) -> i64 {
        match self {
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days => 86_400,
            Self::Weeks => 604_800,
        }
    }
}

/// A parsed duration spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationSpec {
    amount: u32,
    unit: DurationUnit,
}

impl DurationSpec {
    #[cfg(test)]
    pub fn amount(&self) -> u32 {
        self.amount
    }

    #[cfg(test)]
    pub fn unit(&self) -> DurationUnit {
        self.unit
    }

    /// Length of the spec as a chrono delta.
    pub fn as_delta(&self) -> Duration {
        Duration::seconds(i64::from(self.amount) * self.unit.seconds())
    }

    /// Absolute expiry: `reference + self`.
    pub fn expires_at(&self, reference: DateTime<Utc>) -> FloodResult<DateTime<Utc>> {
        reference
            .checked_add_signed(self.as_delta())
            .ok_or_else(|| FloodError::InvalidDuration(self.to_string()))
    }
}

impl FromStr for DurationSpec {
    type Err = FloodError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || FloodError::InvalidDuration(input.to_string());

        let unit_char = input.chars().last().ok_or_else(invalid)?;
        let unit = DurationUnit::from_suffix(unit_char).ok_or_else(invalid)?;
        let digits = &input[..input.len() - unit_char.len_utf8()];

        // `u32::from_str` accepts a leading '+', the grammar does not
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let amount: u32 = digits.parse().map_err(|_| invalid())?;
        if amount == 0 {
            return Err(invalid());
        }

        Ok(Self { amount, unit })
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

/// Parse `spec` and return the instant it expires relative to `reference`.
pub fn parse_expiry(spec: &str, reference: DateTime<Utc>) -> FloodResult<DateTime<Utc>> {
    spec.parse::<DurationSpec>()?.expires_at(reference)
}

/// Check that `spec` is accepted by the grammar without computing an expiry.
pub fn validate(spec: &str) -> FloodResult<DurationSpec> {
    spec.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_units() {
        let base = reference();
        assert_eq!(parse_expiry("4m", base).unwrap(), base + Duration::minutes(4));
        assert_eq!(parse_expiry("3h", base).unwrap(), base + Duration::hours(3));
        assert_eq!(parse_expiry("6d", base).unwrap(), base + Duration::days(6));
        assert_eq!(parse_expiry("5w", base).unwrap(), base + Duration::weeks(5));
    }

    #[test]
    fn test_rejects_malformed_specs() {
        for spec in ["", "m", "10", "0m", "-5m", "+5m", "5s", "5M", "1.5h", " 5m", "5 m", "5mm", "5é"] {
            assert!(
                matches!(validate(spec), Err(FloodError::InvalidDuration(_))),
                "accepted {spec:?}"
            );
        }
    }

    #[test]
    fn test_rejects_overflowing_amount() {
        assert!(validate("99999999999w").is_err());
    }

    #[test]
    fn test_display_keeps_compact_form() {
        let spec: DurationSpec = "10m".parse().unwrap();
        assert_eq!(spec.to_string(), "10m");
        assert_eq!(spec.amount(), 10);
        assert_eq!(spec.unit(), DurationUnit::Minutes);
    }
}
