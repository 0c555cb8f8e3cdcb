use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;

use crate::{helpers::parse_fixed_point, FixedPointParseError};

pub const PPM_SCALE: i64 = 1_000_000;

/// The fraction of a sale credited to an artist, in parts per million (`0.30` is `300_000`).
///
/// Rates are stored as integers so that the value frozen onto an earnings record is exactly the value that was read
/// from the artist profile. In JSON a rate travels as a decimal fraction.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash)]
#[sqlx(transparent)]
pub struct CommissionRate(i64);

impl CommissionRate {
    pub const fn from_ppm(ppm: i64) -> Self {
        Self(ppm)
    }

    /// Whole percentages, e.g. `from_percent(30)` is a 30% rate.
    pub const fn from_percent(percent: i64) -> Self {
        Self(percent * PPM_SCALE / 100)
    }

    pub fn ppm(&self) -> i64 {
        self.0
    }

    pub fn as_fraction(&self) -> f64 {
        self.0 as f64 / PPM_SCALE as f64
    }

    /// A rate is valid when it lies in `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        (0..=PPM_SCALE).contains(&self.0)
    }
}

impl FromStr for CommissionRate {
    type Err = FixedPointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_point(s, 6).map(Self)
    }
}

impl Display for CommissionRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / PPM_SCALE;
        let frac = format!("{:06}", (self.0 % PPM_SCALE).abs());
        let frac = frac.trim_end_matches('0');
        let frac = if frac.len() < 2 { format!("{frac:0<2}") } else { frac.to_string() };
        write!(f, "{whole}.{frac}")
    }
}

impl Serialize for CommissionRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_fraction())
    }
}

impl<'de> Deserialize<'de> for CommissionRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fraction = f64::deserialize(deserializer)?;
        if !fraction.is_finite() {
            return Err(serde::de::Error::custom("commission rate must be a finite number"));
        }
        #[allow(clippy::cast_possible_truncation)]
        let ppm = (fraction * PPM_SCALE as f64).round() as i64;
        Ok(Self(ppm))
    }
}
