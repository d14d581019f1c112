//! Customer, saved address and profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{AddressId, CustomerId, Email};

use super::product::ProductSummary;

/// A customer bound to an external identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    /// Subject of the identity provider's token.
    pub external_id: String,
    pub email: Email,
    pub name: String,
    pub phone_number: String,
    pub image_url: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[must_use]
    pub fn summary(&self) -> CustomerSummary {
        CustomerSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Customer data resolved onto orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub name: String,
    pub email: Email,
}

/// A customer as listed in the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListing {
    #[serde(flatten)]
    pub customer: Customer,
    pub wish_list: Vec<ProductSummary>,
}

/// Identity claims used to create or refresh a customer row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerIdentity {
    pub external_id: String,
    pub email: Email,
    pub name: String,
    pub image_url: Option<String>,
    pub is_admin: bool,
}

/// Body of `PUT /api/users/profile`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    #[serde(alias = "imageURL")]
    pub image_url: Option<String>,
}

/// A validated profile change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub image_url: Option<String>,
}

impl UpdateProfileRequest {
    /// Reject a blank name; the phone number may be cleared, a blank image is ignored.
    ///
    /// # Errors
    ///
    /// Returns `CustomerInputError::MissingField("name")` for a blank name.
    pub fn validate(self) -> Result<ProfileChanges, CustomerInputError> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(CustomerInputError::MissingField("name"));
            }
            other => other.map(|n| n.trim().to_owned()),
        };
        Ok(ProfileChanges {
            name,
            phone_number: self.phone_number.map(|p| p.trim().to_owned()),
            image_url: self
                .image_url
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty()),
        })
    }
}

/// A saved customer address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub label: String,
    pub full_name: String,
    pub phone_number: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_default: bool,
}

/// Validation failure for profile and address input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomerInputError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Body of `POST /api/users/addresses` and `PUT /api/users/addresses/{id}`.
///
/// On update, absent or blank fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub label: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub is_default: Option<bool>,
}

/// A complete address ready to insert or write back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFields {
    pub label: String,
    pub full_name: String,
    pub phone_number: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_default: bool,
}

impl AddressRequest {
    /// Build a new address, requiring every field.
    ///
    /// # Errors
    ///
    /// Returns `CustomerInputError::MissingField` naming the first blank field.
    pub fn into_new(self) -> Result<AddressFields, CustomerInputError> {
        Ok(AddressFields {
            label: required(self.label, "label")?,
            full_name: required(self.full_name, "fullName")?,
            phone_number: required(self.phone_number, "phoneNumber")?,
            street_address: required(self.street_address, "streetAddress")?,
            city: required(self.city, "city")?,
            state: required(self.state, "state")?,
            zip_code: required(self.zip_code, "zipCode")?,
            is_default: self.is_default.unwrap_or(false),
        })
    }

    /// Merge onto an existing address.
    #[must_use]
    pub fn apply_to(self, current: &Address) -> AddressFields {
        AddressFields {
            label: keep_or(self.label, &current.label),
            full_name: keep_or(self.full_name, &current.full_name),
            phone_number: keep_or(self.phone_number, &current.phone_number),
            street_address: keep_or(self.street_address, &current.street_address),
            city: keep_or(self.city, &current.city),
            state: keep_or(self.state, &current.state),
            zip_code: keep_or(self.zip_code, &current.zip_code),
            is_default: self.is_default.unwrap_or(current.is_default),
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, CustomerInputError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(CustomerInputError::MissingField(field))
}

fn keep_or(value: Option<String>, current: &str) -> String {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| current.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_request() -> AddressRequest {
        AddressRequest {
            label: Some("Home".to_owned()),
            full_name: Some("Grace Hopper".to_owned()),
            phone_number: Some("555-0100".to_owned()),
            street_address: Some("1 Navy Way".to_owned()),
            city: Some("Arlington".to_owned()),
            state: Some("VA".to_owned()),
            zip_code: Some("22201".to_owned()),
            is_default: None,
        }
    }

    #[test]
    fn test_new_address_requires_every_field() {
        let fields = full_request().into_new().unwrap();
        assert!(!fields.is_default);

        let mut request = full_request();
        request.city = Some("   ".to_owned());
        assert_eq!(
            request.into_new(),
            Err(CustomerInputError::MissingField("city"))
        );
    }

    #[test]
    fn test_update_keeps_blank_fields() {
        let current = Address {
            id: AddressId::new(7),
            label: "Work".to_owned(),
            full_name: "Grace Hopper".to_owned(),
            phone_number: "555-0100".to_owned(),
            street_address: "1 Navy Way".to_owned(),
            city: "Arlington".to_owned(),
            state: "VA".to_owned(),
            zip_code: "22201".to_owned(),
            is_default: true,
        };
        let merged = AddressRequest {
            city: Some("Norfolk".to_owned()),
            label: Some(String::new()),
            ..Default::default()
        }
        .apply_to(&current);

        assert_eq!(merged.city, "Norfolk");
        assert_eq!(merged.label, "Work");
        assert!(merged.is_default);
    }

    #[test]
    fn test_profile_rejects_blank_name() {
        let err = UpdateProfileRequest {
            name: Some(" ".to_owned()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, CustomerInputError::MissingField("name"));

        let changes = UpdateProfileRequest {
            phone_number: Some(String::new()),
            image_url: Some(String::new()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.phone_number, Some(String::new()));
        assert_eq!(changes.image_url, None);
    }

    #[test]
    fn test_profile_accepts_legacy_image_key() {
        let request: UpdateProfileRequest =
            serde_json::from_str(r#"{"imageURL":"https://cdn.example.test/a.png"}"#).unwrap();
        assert_eq!(
            request.image_url.as_deref(),
            Some("https://cdn.example.test/a.png")
        );
    }
}
