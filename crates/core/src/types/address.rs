//! Postal address as consumed for billing and shipping blocks.

use serde::{Deserialize, Serialize};

/// A postal address from a billing or shipping profile.
///
/// Owned by the host commerce system; read-only here. Optional fields may
/// legitimately be empty (e.g., no company, no state for some countries) and
/// must then be *omitted* from gateway payloads rather than sent as blank
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Given (first) name.
    pub given_name: String,
    /// Family (last) name.
    pub family_name: String,
    /// Company / organization, if any.
    pub organization: Option<String>,
    /// First address line.
    pub address_line1: String,
    /// Second address line, if any.
    pub address_line2: Option<String>,
    /// City / locality, if any.
    pub locality: Option<String>,
    /// State / province / administrative area, if any.
    pub administrative_area: Option<String>,
    /// Postal code, if any.
    pub postal_code: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,
}

impl Address {
    /// The combined address line (line 1 + line 2), uncapped.
    ///
    /// Gateway payloads cap this at 60 characters; the cap is applied at
    /// request-building time, not here.
    #[must_use]
    pub fn combined_line(&self) -> String {
        match &self.address_line2 {
            Some(line2) if !line2.is_empty() => format!("{} {line2}", self.address_line1),
            _ => self.address_line1.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_line_with_second_line() {
        let address = Address {
            address_line1: "123 Main St".to_string(),
            address_line2: Some("Apt 4".to_string()),
            ..Address::default()
        };
        assert_eq!(address.combined_line(), "123 Main St Apt 4");
    }

    #[test]
    fn test_combined_line_without_second_line() {
        let address = Address {
            address_line1: "123 Main St".to_string(),
            ..Address::default()
        };
        assert_eq!(address.combined_line(), "123 Main St");
    }

    #[test]
    fn test_combined_line_empty_second_line() {
        let address = Address {
            address_line1: "123 Main St".to_string(),
            address_line2: Some(String::new()),
            ..Address::default()
        };
        assert_eq!(address.combined_line(), "123 Main St");
    }
}
