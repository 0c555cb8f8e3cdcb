use pod_common::Money;

use crate::RazorpayApiError;

/// Razorpay takes amounts as integers in the currency's minor unit (paise for INR), so ₹500.00 is sent as 50000.
///
/// Amounts must be positive and a whole number of minor units.
pub fn amount_in_minor_units(amount: Money) -> Result<i64, RazorpayApiError> {
    if amount.value() <= 0 {
        return Err(RazorpayApiError::InvalidCurrencyAmount(format!("{amount} is not a payable amount")));
    }
    let minor = amount.to_minor_units();
    if Money::from_minor(minor) != amount {
        return Err(RazorpayApiError::InvalidCurrencyAmount(format!("{amount} has fractional minor units")));
    }
    Ok(minor)
}
