//! Customer-profile request/response payloads.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::transaction::{AddressData, PaymentData};
use super::{MerchantAuthentication, OneOrMany};

/// Validation mode requesting a live verification transaction, which is what
/// produces the `validationDirectResponse` the card-brand extraction needs.
pub const VALIDATION_MODE_LIVE: &str = "liveMode";

/// Top-level wrapper for creating a customer profile with one embedded
/// payment profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerProfileEnvelope {
    pub create_customer_profile_request: CreateCustomerProfileRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerProfileRequest {
    pub merchant_authentication: MerchantAuthentication,
    pub profile: CustomerProfileData,
    pub validation_mode: String,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfileData {
    /// Merchant-side customer key; disposable ids get a timestamp suffix.
    pub merchant_customer_id: String,
    pub email: Option<String>,
    pub payment_profiles: PaymentProfileData,
}

/// A payment profile to store under a customer profile.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProfileData {
    pub customer_type: CustomerType,
    pub bill_to: Option<AddressData>,
    pub payment: PaymentData,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    Individual,
}

/// Top-level wrapper for attaching a payment profile to an existing
/// customer profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPaymentProfileEnvelope {
    pub create_customer_payment_profile_request: CreateCustomerPaymentProfileRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPaymentProfileRequest {
    pub merchant_authentication: MerchantAuthentication,
    pub customer_profile_id: String,
    pub payment_profile: PaymentProfileData,
    pub validation_mode: String,
}

/// Success payload of `createCustomerProfile`.
///
/// The list wrappers (`numericString`, `string`) are XML leftovers the JSON
/// endpoint preserves; they hold one entry per embedded payment profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfilePayload {
    pub customer_profile_id: Option<String>,
    pub customer_payment_profile_id_list: Option<NumericStringList>,
    pub validation_direct_response_list: Option<StringList>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericStringList {
    pub numeric_string: OneOrMany<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringList {
    pub string: OneOrMany<String>,
}

/// Success payload of `createCustomerPaymentProfile`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentProfilePayload {
    pub customer_payment_profile_id: Option<String>,
    pub validation_direct_response: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_customer_type_wire_name() {
        assert_eq!(
            serde_json::to_value(CustomerType::Individual).unwrap(),
            json!("individual")
        );
    }

    #[test]
    fn test_create_profile_payload_scalar_list_wrappers() {
        let payload: CreateProfilePayload = serde_json::from_value(json!({
            "customerProfileId": "39998916",
            "customerPaymentProfileIdList": {"numericString": "812354079"},
            "validationDirectResponseList": {"string": "1,1,1,This transaction has been approved."}
        }))
        .unwrap();
        assert_eq!(payload.customer_profile_id.as_deref(), Some("39998916"));
        assert_eq!(
            payload
                .customer_payment_profile_id_list
                .unwrap()
                .numeric_string
                .into_first()
                .as_deref(),
            Some("812354079")
        );
    }

    #[test]
    fn test_create_profile_payload_list_shapes() {
        let payload: CreateProfilePayload = serde_json::from_value(json!({
            "customerProfileId": "39998916",
            "customerPaymentProfileIdList": {"numericString": ["812354079", "812354080"]},
            "validationDirectResponseList": {"string": ["a", "b"]}
        }))
        .unwrap();
        assert_eq!(
            payload
                .customer_payment_profile_id_list
                .unwrap()
                .numeric_string
                .into_vec()
                .len(),
            2
        );
    }

    #[test]
    fn test_create_payment_profile_payload() {
        let payload: CreatePaymentProfilePayload = serde_json::from_value(json!({
            "customerPaymentProfileId": "812354079",
            "validationDirectResponse": "1,1,1,Approved"
        }))
        .unwrap();
        assert_eq!(
            payload.customer_payment_profile_id.as_deref(),
            Some("812354079")
        );
    }
}
