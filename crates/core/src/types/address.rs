//! Shipping address snapshot.

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`ShippingAddress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is blank.
    #[error("shipping address field `{0}` is required")]
    MissingField(&'static str),
}

/// Address an order ships to, copied onto the order at checkout.
///
/// Later edits to the customer's saved addresses do not touch orders that
/// were already placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone_number: String,
}

impl ShippingAddress {
    /// Trim every field and check that none is blank.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingField` naming the first blank field.
    pub fn validated(self) -> Result<Self, AddressError> {
        let address = Self {
            full_name: self.full_name.trim().to_owned(),
            street_address: self.street_address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip_code: self.zip_code.trim().to_owned(),
            phone_number: self.phone_number.trim().to_owned(),
        };

        let fields = [
            ("fullName", &address.full_name),
            ("streetAddress", &address.street_address),
            ("city", &address.city),
            ("state", &address.state),
            ("zipCode", &address.zip_code),
            ("phoneNumber", &address.phone_number),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(AddressError::MissingField(*name));
        }

        Ok(address)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: " Ada Lovelace ".to_owned(),
            street_address: "12 Analytical Row".to_owned(),
            city: "London".to_owned(),
            state: "Greater London".to_owned(),
            zip_code: "N1 9GU".to_owned(),
            phone_number: "+44 20 7946 0000".to_owned(),
        }
    }

    #[test]
    fn test_validated_trims() {
        let address = address().validated().unwrap();
        assert_eq!(address.full_name, "Ada Lovelace");
    }

    #[test]
    fn test_validated_names_blank_field() {
        let mut blank = address();
        blank.zip_code = "   ".to_owned();
        assert_eq!(
            blank.validated(),
            Err(AddressError::MissingField("zipCode"))
        );
    }

    #[test]
    fn test_missing_json_field_fails_to_deserialize() {
        let json = serde_json::json!({
            "fullName": "Ada",
            "streetAddress": "12 Analytical Row",
            "city": "London",
            "state": "LDN",
            "zipCode": "N1"
        });
        assert!(serde_json::from_value::<ShippingAddress>(json).is_err());
    }
}
