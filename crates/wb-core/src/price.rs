//! Coin amounts stored as copper pieces.
//!
//! Prices are exact integers so that batch arithmetic (how many units a
//! budget covers) never suffers from binary floating-point rounding.
//! 1 gp = 10 sp = 100 cp.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

const CP_PER_SP: u64 = 10;
const CP_PER_GP: u64 = 100;

/// A non-negative coin amount in copper pieces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PriceRepr", into = "PriceRepr")]
pub struct Price {
    copper: u64,
}

impl Price {
    /// The smallest positive amount (1 cp). Used as a nominal cost basis
    /// for items listed without a price.
    pub const NOMINAL: Self = Self { copper: 1 };

    /// Create a price from copper pieces.
    pub fn from_copper(copper: u64) -> Self {
        Self { copper }
    }

    /// Create a price from gold, silver, and copper pieces, saturating at
    /// the largest representable amount.
    pub fn from_coins(gp: u64, sp: u64, cp: u64) -> Self {
        Self {
            copper: coins_to_copper(gp, sp, cp).unwrap_or(u64::MAX),
        }
    }

    /// Create a price from gold, silver, and copper pieces, failing when the
    /// total does not fit.
    pub fn try_from_coins(gp: u64, sp: u64, cp: u64) -> CoreResult<Self> {
        coins_to_copper(gp, sp, cp)
            .map(Self::from_copper)
            .ok_or_else(|| CoreError::InvalidPrice(format!("{gp} gp {sp} sp {cp} cp")))
    }

    /// Create a price from a decimal gold amount, rounded to the nearest copper.
    pub fn from_gp(gp: f64) -> CoreResult<Self> {
        let copper = (gp * CP_PER_GP as f64).round();
        // u64::MAX as f64 rounds up to 2^64, which is already out of range.
        if !copper.is_finite() || copper < 0.0 || copper >= u64::MAX as f64 {
            return Err(CoreError::InvalidPrice(gp.to_string()));
        }
        Ok(Self {
            copper: copper as u64,
        })
    }

    /// The amount in copper pieces.
    pub fn copper(self) -> u64 {
        self.copper
    }

    /// The amount as decimal gold pieces.
    pub fn as_gp(self) -> f64 {
        self.copper as f64 / CP_PER_GP as f64
    }

    /// Returns true for a zero amount.
    pub fn is_zero(self) -> bool {
        self.copper == 0
    }

    /// This price, or [`Price::NOMINAL`] if it is zero.
    pub fn at_least_nominal(self) -> Self {
        if self.is_zero() { Self::NOMINAL } else { self }
    }

    /// `self + rhs`, or `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.copper.checked_add(rhs.copper).map(Self::from_copper)
    }

    /// `self * units`, or `None` on overflow.
    pub fn checked_mul(self, units: u32) -> Option<Self> {
        self.copper
            .checked_mul(u64::from(units))
            .map(Self::from_copper)
    }

    /// Sum of `prices`, or `None` on overflow.
    pub fn checked_sum(prices: impl IntoIterator<Item = Self>) -> Option<Self> {
        prices
            .into_iter()
            .try_fold(Self::default(), Self::checked_add)
    }
}

fn coins_to_copper(gp: u64, sp: u64, cp: u64) -> Option<u64> {
    gp.checked_mul(CP_PER_GP)?
        .checked_add(sp.checked_mul(CP_PER_SP)?)?
        .checked_add(cp)
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.copper == 0 {
            return write!(f, "0 gp");
        }
        let gp = self.copper / CP_PER_GP;
        let sp = (self.copper % CP_PER_GP) / CP_PER_SP;
        let cp = self.copper % CP_PER_SP;
        let parts: Vec<String> = [(gp, "gp"), (sp, "sp"), (cp, "cp")]
            .iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, unit)| format!("{n} {unit}"))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

impl FromStr for Price {
    type Err = CoreError;

    /// Parse `"3 gp 5 sp"`, `"12cp"`, or a bare decimal gold amount like `"2.5"`.
    fn from_str(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        if let Ok(gp) = trimmed.parse::<f64>() {
            return Self::from_gp(gp);
        }

        let invalid = || CoreError::InvalidPrice(s.to_string());
        let mut copper = 0u64;
        let mut pending: Option<u64> = None;
        for token in split_amounts(trimmed) {
            match (pending, token.parse::<u64>()) {
                (None, Ok(n)) => pending = Some(n),
                (Some(n), Err(_)) => {
                    let amount = n
                        .checked_mul(unit_value(&token).ok_or_else(invalid)?)
                        .ok_or_else(invalid)?;
                    copper = copper.checked_add(amount).ok_or_else(invalid)?;
                    pending = None;
                }
                _ => return Err(invalid()),
            }
        }
        if pending.is_some() || trimmed.is_empty() {
            return Err(invalid());
        }
        Ok(Self { copper })
    }
}

/// Split `"3gp 5 sp"` into `["3", "gp", "5", "sp"]`.
fn split_amounts(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in s.chars() {
        if ch.is_whitespace() || ch == ',' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        let boundary = current
            .chars()
            .last()
            .is_some_and(|last| last.is_ascii_digit() != ch.is_ascii_digit());
        if boundary {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn unit_value(unit: &str) -> Option<u64> {
    match unit.to_lowercase().as_str() {
        "gp" => Some(CP_PER_GP),
        "sp" => Some(CP_PER_SP),
        "cp" => Some(1),
        _ => None,
    }
}

/// Accepted serialized forms: a decimal gold number, a coin string,
/// or a `{ "gp": .., "sp": .., "cp": .. }` object.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Gold(f64),
    Text(String),
    Coins {
        #[serde(default)]
        gp: u64,
        #[serde(default)]
        sp: u64,
        #[serde(default)]
        cp: u64,
    },
}

impl TryFrom<PriceRepr> for Price {
    type Error = CoreError;

    fn try_from(repr: PriceRepr) -> CoreResult<Self> {
        match repr {
            PriceRepr::Gold(gp) => Self::from_gp(gp),
            PriceRepr::Text(s) => s.parse(),
            PriceRepr::Coins { gp, sp, cp } => Self::try_from_coins(gp, sp, cp),
        }
    }
}

impl From<Price> for PriceRepr {
    fn from(price: Price) -> Self {
        let gp = price.copper / CP_PER_GP;
        let sp = (price.copper % CP_PER_GP) / CP_PER_SP;
        let cp = price.copper % CP_PER_SP;
        PriceRepr::Coins { gp, sp, cp }
    }
}
