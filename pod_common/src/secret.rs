use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A wrapper that keeps configuration secrets (API keys, signing secrets) out of logs and debug output.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    /// True when no secret has been configured. An all-whitespace value counts as missing.
    pub fn is_missing(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::Secret;

    #[test]
    fn secrets_are_masked() {
        let s = Secret::new("rzp_secret".to_string());
        assert_eq!(format!("{s} {s:?}"), "**** ****");
        assert_eq!(s.reveal(), "rzp_secret");
        assert!(!s.is_missing());
        assert!(Secret::new("  ".to_string()).is_missing());
        assert!(Secret::<String>::default().is_missing());
    }
}
