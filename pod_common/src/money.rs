use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;

use crate::{helpers::parse_fixed_point, op, FixedPointParseError};

pub const DEFAULT_CURRENCY_CODE: &str = "INR";
pub const MICROS_PER_UNIT: i64 = 1_000_000;
pub const MICROS_PER_CENT: i64 = 10_000;

//--------------------------------------        Money        ---------------------------------------------------------
/// A monetary amount, stored as a whole number of micro-units (one millionth of the currency unit).
///
/// Catalogue prices may carry three decimals (e.g. 19.995), so cents are not fine enough. All arithmetic is integer
/// arithmetic; rounding to cents only happens where a policy calls for it.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for Money {
    fn from(micros: i64) -> Self {
        Self(micros)
    }
}

impl Money {
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn from_major(units: i64) -> Self {
        Self(units * MICROS_PER_UNIT)
    }

    /// Builds an amount from minor units (paise, cents).
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor * MICROS_PER_CENT)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The amount in minor units, rounding half away from zero. This is what payment gateways expect.
    pub fn to_minor_units(&self) -> i64 {
        let half = MICROS_PER_CENT / 2;
        if self.0 >= 0 {
            (self.0 + half) / MICROS_PER_CENT
        } else {
            (self.0 - half) / MICROS_PER_CENT
        }
    }
}

impl FromStr for Money {
    type Err = FixedPointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_point(s, 6).map(Self)
    }
}

impl Display for Money {
    /// Always shows at least two decimals, and more only when the amount has sub-cent precision.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / MICROS_PER_UNIT as u64;
        let micros = abs % MICROS_PER_UNIT as u64;
        let frac = format!("{micros:06}");
        let frac = frac.trim_end_matches('0');
        let frac = if frac.len() < 2 { format!("{frac:0<2}") } else { frac.to_string() };
        write!(f, "{sign}{units}.{frac}")
    }
}
