use crate::EngineError;

/// ISO-4217-style currency code carried by a topic and copied onto its
/// expenses at creation time.
///
/// The engine never converts between currencies; the code is an opaque,
/// validated 3-letter tag. Amounts are stored as integer minor units (see
/// `MoneyCents`), and every currency handled here uses 2 fraction digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Canonical currency code (always 3 uppercase ASCII letters).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(EngineError::InvalidInput(format!(
                "invalid currency code: {value}"
            )));
        }
        Ok(CurrencyCode(trimmed.to_ascii_uppercase()))
    }
}
