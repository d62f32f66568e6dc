//! Strongly-typed value objects used by domain entities.
//!
//! Domain structs should carry these wrappers instead of raw primitives so that
//! identifiers and unit-converted numbers are enforced at the boundary.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Number of characters in an Amazon Standard Identification Number.
pub const ASIN_LENGTH: usize = 10;

/// Errors produced when attempting to construct constrained domain types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// The value is not a 10 character uppercase alphanumeric ASIN.
    #[error("invalid ASIN `{0}`: must be 10 uppercase alphanumeric characters")]
    InvalidAsin(String),
    /// A numeric value required to be positive was zero or negative.
    #[error("{0} must be greater than zero")]
    NonPositiveNumber(&'static str),
    /// A numeric value fell outside its allowed range.
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
}

/// Returns `true` when `value` is exactly 10 characters from `[A-Z0-9]`.
///
/// No normalization is performed: lowercase input is rejected, callers
/// upper-case candidates themselves.
pub fn is_valid_asin(value: &str) -> bool {
    value.len() == ASIN_LENGTH
        && value
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Validated Amazon product identifier.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Asin(String);

impl Asin {
    /// Accepts the value only when it passes [`is_valid_asin`].
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let value = value.into();
        if is_valid_asin(&value) {
            Ok(Self(value))
        } else {
            Err(TypeConstraintError::InvalidAsin(value))
        }
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for Asin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Asin::new(value).map_err(serde::de::Error::custom)
    }
}

impl Display for Asin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for Asin {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for Asin {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for Asin {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Asin {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Asin> for String {
    fn from(value: Asin) -> Self {
        value.0
    }
}

impl PartialEq<&str> for Asin {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Price in US dollars stored as whole cents.
///
/// Serialized as a string with exactly two fraction digits (`"29.99"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(i64);

impl Price {
    /// Builds a price from a strictly positive amount of cents.
    pub fn from_cents(cents: i64) -> Result<Self, TypeConstraintError> {
        if cents > 0 {
            Ok(Self(cents))
        } else {
            Err(TypeConstraintError::NonPositiveNumber("price"))
        }
    }

    /// Returns the amount in cents.
    pub const fn cents(self) -> i64 {
        self.0
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse_fixed(&value, 2)
            .and_then(|cents| Price::from_cents(cents).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price `{value}`")))
    }
}

/// Average customer rating on a 0–5 scale stored in tenths of a star.
///
/// Serialized as a string with one fraction digit (`"4.5"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rating(i64);

impl Rating {
    /// Highest representable rating, in tenths.
    pub const MAX_TENTHS: i64 = 50;

    /// Builds a rating from tenths of a star; valid range is `1..=50`.
    pub fn from_tenths(tenths: i64) -> Result<Self, TypeConstraintError> {
        if tenths <= 0 {
            Err(TypeConstraintError::NonPositiveNumber("rating"))
        } else if tenths > Self::MAX_TENTHS {
            Err(TypeConstraintError::OutOfRange("rating"))
        } else {
            Ok(Self(tenths))
        }
    }

    /// Returns the rating in tenths of a star.
    pub const fn tenths(self) -> i64 {
        self.0
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse_fixed(&value, 1)
            .and_then(|tenths| Rating::from_tenths(tenths).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid rating `{value}`")))
    }
}

/// Parses a non-negative decimal string with at most `digits` fraction digits
/// into an integer scaled by `10^digits`.
fn parse_fixed(value: &str, digits: u32) -> Option<i64> {
    let (whole, fraction) = match value.trim().split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value.trim(), ""),
    };
    if fraction.len() > digits as usize || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let padded = format!("{fraction:0<width$}", width = digits as usize);
    let fraction: i64 = padded.parse().ok()?;
    whole
        .checked_mul(10_i64.pow(digits))
        .and_then(|scaled| scaled.checked_add(fraction))
}
