mod helpers;
mod money;
mod rate;

pub mod op;
mod secret;

pub use helpers::{parse_boolean_flag, parse_fixed_point, FixedPointParseError};
pub use money::{Money, DEFAULT_CURRENCY_CODE, MICROS_PER_CENT, MICROS_PER_UNIT};
pub use rate::{CommissionRate, PPM_SCALE};
pub use secret::Secret;
