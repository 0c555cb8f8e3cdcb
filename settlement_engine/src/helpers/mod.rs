mod payment_signature;

pub use payment_signature::{
    calculate_hmac,
    sign_payment,
    verify_hmac,
    verify_payment_signature,
    ConfigurationError,
    PaymentVerification,
};
