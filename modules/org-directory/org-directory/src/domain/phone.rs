use phonenumber::{Mode, country};

use super::error::DomainError;

/// Normalizes phone numbers to the national format of one region.
#[derive(Debug, Clone)]
pub struct PhoneNormalizer {
    region: country::Id,
}

impl PhoneNormalizer {
    /// # Errors
    /// Returns `DomainError::Validation` for an unknown ISO 3166 region code.
    pub fn new(region: &str) -> Result<Self, DomainError> {
        let region = region
            .trim()
            .to_uppercase()
            .parse::<country::Id>()
            .map_err(|_| {
                DomainError::validation("phone_region", format!("unknown region code '{region}'"))
            })?;
        Ok(Self { region })
    }

    /// National format of `raw`, or the trimmed input if it does not parse.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match phonenumber::parse(Some(self.region.clone()), trimmed) {
            Ok(number) => number.format().mode(Mode::National).to_string(),
            Err(_) => trimmed.to_owned(),
        }
    }
}
