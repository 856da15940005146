//! # Exact Decimal Prices
//!
//! Listing prices arrive as decimal strings (`"0.5"`) and must reach the
//! token contract as integer base units (wei, 10^18 per coin). The value is
//! parsed digit by digit into a `u128` so no rounding ever happens between
//! the publish form and the chain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of base units (wei) in one coin (ether).
pub const BASE_UNITS_PER_COIN: u128 = 1_000_000_000_000_000_000;

/// Highest listing price accepted by the marketplace, in whole coins.
pub const MAX_PRICE_COINS: u64 = 1_000_000;

/// Fractional digits carried by one coin.
const DECIMALS: usize = 18;

/// A non-negative listing price held exactly in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Price {
    base_units: u128,
}

impl Price {
    /// Parse a decimal coin amount such as `"12"`, `"0.5"` or `".25"`.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidPrice`] for signs, exponents, empty
    ///   input, or more than 18 fractional digits.
    /// - [`ValidationError::PriceTooHigh`] above [`MAX_PRICE_COINS`].
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        let invalid = || ValidationError::InvalidPrice(input.to_string());

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac.len() > DECIMALS {
            return Err(invalid());
        }

        let whole_trimmed = whole.trim_start_matches('0');
        // Anything longer than the ceiling's digit count is over the limit.
        if whole_trimmed.len() > 7 {
            return Err(ValidationError::PriceTooHigh(s.to_string(), MAX_PRICE_COINS));
        }
        let whole_value: u128 = if whole_trimmed.is_empty() {
            0
        } else {
            whole_trimmed.parse().map_err(|_| invalid())?
        };

        let mut frac_value: u128 = 0;
        for b in frac.bytes() {
            frac_value = frac_value * 10 + u128::from(b - b'0');
        }
        frac_value *= 10u128.pow((DECIMALS - frac.len()) as u32);

        let base_units = whole_value * BASE_UNITS_PER_COIN + frac_value;
        if base_units > u128::from(MAX_PRICE_COINS) * BASE_UNITS_PER_COIN {
            return Err(ValidationError::PriceTooHigh(s.to_string(), MAX_PRICE_COINS));
        }
        Ok(Self { base_units })
    }

    /// Construct a price directly from base units.
    pub fn from_base_units(base_units: u128) -> Self {
        Self { base_units }
    }

    /// The price in chain base units (wei).
    pub fn to_base_units(&self) -> u128 {
        self.base_units
    }

    /// Whether the note is free.
    pub fn is_zero(&self) -> bool {
        self.base_units == 0
    }
}

impl fmt::Display for Price {
    /// Render the shortest exact decimal form: `0.5`, `12`, `0.000000000000000001`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.base_units / BASE_UNITS_PER_COIN;
        let frac = self.base_units % BASE_UNITS_PER_COIN;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Price {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
