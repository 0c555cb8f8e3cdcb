use thiserror::Error;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot parse '{value}' as a decimal with at most {decimals} decimal places")]
pub struct FixedPointParseError {
    pub value: String,
    pub decimals: u32,
}

/// Parses a plain decimal string (e.g. `"19.995"`, `"-3"`, `"0.3"`) into an integer scaled by `10^decimals`.
///
/// No floating point is involved, so `"19.995"` with 6 decimals is exactly `19_995_000`. Strings with more
/// fractional digits than `decimals`, exponents, or stray characters are rejected.
pub fn parse_fixed_point(s: &str, decimals: u32) -> Result<i64, FixedPointParseError> {
    let err = || FixedPointParseError { value: s.to_string(), decimals };
    let trimmed = s.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (whole, frac) = match unsigned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (unsigned, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(err());
    }
    if frac.len() > decimals as usize || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(err());
    }
    let scale = 10i64.checked_pow(decimals).ok_or_else(err)?;
    let whole = if whole.is_empty() { 0 } else { whole.parse::<i64>().map_err(|_| err())? };
    let padded = format!("{frac:0<width$}", width = decimals as usize);
    let frac = if padded.is_empty() { 0 } else { padded.parse::<i64>().map_err(|_| err())? };
    let value = whole.checked_mul(scale).and_then(|w| w.checked_add(frac)).ok_or_else(err)?;
    Ok(if negative { -value } else { value })
}
