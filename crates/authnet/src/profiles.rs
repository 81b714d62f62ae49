//! Remote customer/payment profile management.
//!
//! Resolves a chargeable (customer profile, payment profile) pair for a
//! payment method, creating remote records as needed. Two vendor error
//! codes get special handling:
//!
//! - `E00039` (duplicate record) is a *recovery path*, not a failure:
//!   concurrent signups may race profile creation, and the retry attaches a
//!   payment profile to the id embedded in the error text.
//! - `E00040` (stale reference) self-heals: the stored remote customer id
//!   is cleared so the next attempt creates a fresh profile.

use chrono::{Duration, Utc};
use tracing::{instrument, warn};

use pineapple_core::{
    CardBrand, CardMetadata, Customer, Email, PaymentMethod, PaymentMethodKind, RemoteId,
};

use crate::api::{
    self, codes, CreateCustomerPaymentProfileEnvelope, CreateCustomerPaymentProfileRequest,
    CreateCustomerProfileEnvelope, CreateCustomerProfileRequest, CreatePaymentProfilePayload,
    CreateProfilePayload, CustomerProfileData, CustomerType, OpaqueData, PaymentData,
    PaymentProfileData, RemoteResponse, VALIDATION_MODE_LIVE,
};
use crate::client::{GatewayClient, RequestKind};
use crate::error::GatewayError;
use crate::transactions::address_block;

/// Position of the card type in the comma-split validation response.
///
/// This offset is a contract with the vendor's legacy direct-response
/// format and must be preserved exactly. A response with fewer fields fails
/// loudly instead of silently returning the wrong brand.
const CARD_TYPE_FIELD_INDEX: usize = 51;

/// Single-use eCheck tokens expire after 15 minutes; reduced by 5 seconds
/// to account for the server round-trip after client-side tokenization.
const ECHECK_TOKEN_TTL_SECS: i64 = 15 * 60 - 5;

/// Tokenized payment details from the client-side capture form.
#[derive(Debug, Clone, Default)]
pub struct PaymentDetails {
    /// Token descriptor (e.g. `COMMON.ACCEPT.INAPP.PAYMENT`).
    pub data_descriptor: String,
    /// Token value.
    pub data_value: String,
    /// Last four digits of the card (card methods only).
    pub last4: Option<String>,
    /// Card expiration month, 1-12 (card methods only).
    pub expiration_month: Option<u32>,
    /// Card expiration year, four digits (card methods only).
    pub expiration_year: Option<i32>,
    /// Email for anonymous checkouts (no owner account to read it from).
    pub customer_email: Option<Email>,
}

/// The resolved pair a transaction charges against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeableProfile {
    pub customer_profile_id: String,
    pub payment_profile_id: String,
}

/// Creates and reuses remote customer and payment-method profiles.
#[derive(Debug, Clone)]
pub struct ProfileManager {
    client: GatewayClient,
}

impl ProfileManager {
    /// Create a new profile manager.
    #[must_use]
    pub const fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    /// Establish the gateway side of a freshly captured payment method.
    ///
    /// Card methods create (or reuse) remote profiles and record card
    /// metadata; eCheck methods are single-use and never touch the gateway
    /// here - the token pair itself becomes the remote id.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Validation`] when required token fields are absent.
    /// - [`GatewayError::ProfileNotFound`] when the stored customer
    ///   reference was stale (it has been cleared; retry the flow once).
    /// - [`GatewayError::UnsupportedCardType`] for brands outside the
    ///   accepted set.
    #[instrument(skip_all, fields(method_id = %method.id, owner_id = %owner.id))]
    pub async fn create_payment_method(
        &self,
        method: &mut PaymentMethod,
        owner: &mut Customer,
        details: &PaymentDetails,
    ) -> Result<(), GatewayError> {
        if details.data_descriptor.is_empty() {
            return Err(GatewayError::Validation(
                "payment details must contain the data_descriptor key".to_string(),
            ));
        }
        if details.data_value.is_empty() {
            return Err(GatewayError::Validation(
                "payment details must contain the data_value key".to_string(),
            ));
        }

        match method.kind {
            PaymentMethodKind::Echeck => {
                // Reusing eChecks is not supported by the vendor; the token
                // pair is the whole remote identity.
                method.reusable = false;
                method.remote_id = Some(RemoteId::composite(
                    details.data_descriptor.clone(),
                    details.data_value.clone(),
                ));
                method.expires_at = Some(Utc::now() + Duration::seconds(ECHECK_TOKEN_TTL_SECS));
                Ok(())
            }
            PaymentMethodKind::CreditCard => self.create_card_method(method, owner, details).await,
        }
    }

    /// Resolve the (customer profile, payment profile) pair to charge.
    ///
    /// Authenticated owners combine their stored customer id with the
    /// method's payment-profile token; anonymous methods carry both halves
    /// in their composite remote id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] when the method has no remote id
    /// or its shape does not match the owner's profile situation.
    pub fn chargeable_profile(
        &self,
        owner: &Customer,
        method: &PaymentMethod,
    ) -> Result<ChargeableProfile, GatewayError> {
        let remote_id = method.remote_id.as_ref().ok_or_else(|| {
            GatewayError::Validation("payment method has no remote id".to_string())
        })?;

        if let Some(customer_profile_id) = owner.remote_customer_id.clone() {
            let payment_profile_id = remote_id.as_payment_profile().ok_or_else(|| {
                GatewayError::Validation(
                    "expected a payment-profile token for an owner with a customer profile"
                        .to_string(),
                )
            })?;
            return Ok(ChargeableProfile {
                customer_profile_id,
                payment_profile_id: payment_profile_id.to_string(),
            });
        }

        let (customer_profile_id, payment_profile_id) =
            remote_id.as_composite().ok_or_else(|| {
                GatewayError::Validation(
                    "expected a composite remote id for an owner without a customer profile"
                        .to_string(),
                )
            })?;
        Ok(ChargeableProfile {
            customer_profile_id: customer_profile_id.to_string(),
            payment_profile_id: payment_profile_id.to_string(),
        })
    }

    async fn create_card_method(
        &self,
        method: &mut PaymentMethod,
        owner: &mut Customer,
        details: &PaymentDetails,
    ) -> Result<(), GatewayError> {
        let last4 = details.last4.clone().ok_or_else(|| {
            GatewayError::Validation("payment details must contain the last4 key".to_string())
        })?;
        let expiration_month = details.expiration_month.ok_or_else(|| {
            GatewayError::Validation(
                "payment details must contain the expiration_month key".to_string(),
            )
        })?;
        let expiration_year = details.expiration_year.ok_or_else(|| {
            GatewayError::Validation(
                "payment details must contain the expiration_year key".to_string(),
            )
        })?;

        let established = if let Some(customer_profile_id) = owner.remote_customer_id.clone() {
            self.attach_to_existing_profile(method, owner, details, customer_profile_id)
                .await?
        } else {
            self.create_customer_profile(method, owner, details).await?
        };

        let brand = parse_card_brand(&established.validation_response)?;
        let card = CardMetadata {
            brand,
            last4,
            expiration_month,
            expiration_year,
        };
        method.expires_at = card.expiration_timestamp();
        method.card = Some(card);
        method.remote_id = Some(established.remote_id);
        Ok(())
    }

    /// Attach a payment profile to the owner's existing customer profile.
    async fn attach_to_existing_profile(
        &self,
        method: &PaymentMethod,
        owner: &mut Customer,
        details: &PaymentDetails,
        customer_profile_id: String,
    ) -> Result<EstablishedProfile, GatewayError> {
        let response = self
            .attach_payment_profile(&customer_profile_id, method, details)
            .await?;

        if !response.is_ok() {
            let message = response.first_message().cloned().unwrap_or_default();
            warn!(code = %message.code, text = %message.text, "payment profile attach failed");
            match message.code.as_str() {
                // Duplicate payment profile: reuse the id the gateway
                // reports alongside the error.
                codes::DUPLICATE_RECORD => {
                    if response.string_at("/customerPaymentProfileId").is_none() {
                        return Err(GatewayError::InvalidResponse(
                            "duplicate payment profile, but no existing id returned".to_string(),
                        ));
                    }
                }
                codes::INVALID_REFERENCE => {
                    // The stored customer record is stale; clear it so the
                    // next attempt creates a fresh profile.
                    owner.remote_customer_id = None;
                    return Err(GatewayError::ProfileNotFound);
                }
                _ => {
                    return Err(GatewayError::Declined {
                        code: message.code,
                        message: message.text,
                    });
                }
            }
        }

        let payload: CreatePaymentProfilePayload = response.decode()?;
        let payment_profile_id = payload.customer_payment_profile_id.ok_or_else(|| {
            GatewayError::InvalidResponse("response is missing customerPaymentProfileId".to_string())
        })?;
        let validation_response = validation_direct_response(&response)?;

        Ok(EstablishedProfile {
            remote_id: RemoteId::PaymentProfile(payment_profile_id),
            validation_response,
        })
    }

    /// Create a customer profile with one embedded payment profile,
    /// recovering from a duplicate-record race when the gateway reports
    /// one.
    async fn create_customer_profile(
        &self,
        method: &PaymentMethod,
        owner: &mut Customer,
        details: &PaymentDetails,
    ) -> Result<EstablishedProfile, GatewayError> {
        let merchant_customer_id = if owner.is_authenticated() {
            owner.id.to_string()
        } else {
            // Disposable profile for a guest checkout; the suffix keeps
            // repeated checkouts from colliding on the merchant key.
            format!("{}_{}", owner.id, Utc::now().timestamp())
        };
        let email = if owner.is_authenticated() {
            owner.email.as_ref().map(|e| e.as_str().to_string())
        } else {
            details.customer_email.as_ref().map(|e| e.as_str().to_string())
        };

        let envelope = CreateCustomerProfileEnvelope {
            create_customer_profile_request: CreateCustomerProfileRequest {
                merchant_authentication: self.client.merchant_authentication(),
                profile: CustomerProfileData {
                    merchant_customer_id,
                    email,
                    payment_profiles: build_payment_profile(method, details),
                },
                validation_mode: VALIDATION_MODE_LIVE.to_string(),
            },
        };
        let response = self
            .client
            .execute(RequestKind::CreateCustomerProfile, &envelope)
            .await?;

        let (customer_profile_id, payment_profile_id, validation_response) = if response.is_ok() {
            let payload: CreateProfilePayload = response.decode()?;
            let customer_profile_id = payload.customer_profile_id.ok_or_else(|| {
                GatewayError::InvalidResponse("response is missing customerProfileId".to_string())
            })?;
            let payment_profile_id = payload
                .customer_payment_profile_id_list
                .and_then(|list| list.numeric_string.into_first())
                .ok_or_else(|| {
                    GatewayError::InvalidResponse(
                        "response is missing customerPaymentProfileIdList".to_string(),
                    )
                })?;
            let validation = validation_direct_response(&response)?;
            (customer_profile_id, payment_profile_id, validation)
        } else {
            let message = response.first_message().cloned().unwrap_or_default();
            if message.code != codes::DUPLICATE_RECORD {
                warn!(code = %message.code, text = %message.text, "customer profile creation failed");
                return Err(GatewayError::Declined {
                    code: message.code,
                    message: message.text,
                });
            }

            // Duplicate customer profile: another checkout won the race.
            // Pull the existing profile id out of the error text and attach
            // a payment profile to it instead of creating a new customer.
            let customer_profile_id =
                extract_duplicate_profile_id(&message.text).ok_or_else(|| {
                    GatewayError::InvalidResponse(
                        "duplicate customer profile, but no id found in error text".to_string(),
                    )
                })?;
            warn!(customer_profile_id = %customer_profile_id, "recovering from duplicate customer profile");

            let retry = self
                .attach_payment_profile(&customer_profile_id, method, details)
                .await?;
            if !retry.is_ok() {
                let retry_message = retry.first_message().cloned().unwrap_or_default();
                warn!(code = %retry_message.code, "unable to create payment profile for existing customer");
                return Err(GatewayError::Declined {
                    code: retry_message.code,
                    message: retry_message.text,
                });
            }
            let payload: CreatePaymentProfilePayload = retry.decode()?;
            let payment_profile_id = payload.customer_payment_profile_id.ok_or_else(|| {
                GatewayError::InvalidResponse(
                    "response is missing customerPaymentProfileId".to_string(),
                )
            })?;
            let validation = validation_direct_response(&retry)?;
            (customer_profile_id, payment_profile_id, validation)
        };

        let remote_id = if owner.is_authenticated() {
            // The customer profile becomes the owner's durable key; the
            // method only needs the payment-profile token.
            owner.remote_customer_id = Some(customer_profile_id);
            RemoteId::PaymentProfile(payment_profile_id)
        } else {
            // Anonymous owners never get a durable profile; the pair lives
            // on the method itself.
            RemoteId::composite(customer_profile_id, payment_profile_id)
        };

        Ok(EstablishedProfile {
            remote_id,
            validation_response,
        })
    }

    async fn attach_payment_profile(
        &self,
        customer_profile_id: &str,
        method: &PaymentMethod,
        details: &PaymentDetails,
    ) -> Result<RemoteResponse, GatewayError> {
        let envelope = CreateCustomerPaymentProfileEnvelope {
            create_customer_payment_profile_request: CreateCustomerPaymentProfileRequest {
                merchant_authentication: self.client.merchant_authentication(),
                customer_profile_id: customer_profile_id.to_string(),
                payment_profile: build_payment_profile(method, details),
                validation_mode: VALIDATION_MODE_LIVE.to_string(),
            },
        };
        self.client
            .execute(RequestKind::CreateCustomerPaymentProfile, &envelope)
            .await
    }
}

/// A gateway-side profile freshly established for a payment method.
struct EstablishedProfile {
    remote_id: RemoteId,
    validation_response: String,
}

fn build_payment_profile(method: &PaymentMethod, details: &PaymentDetails) -> PaymentProfileData {
    PaymentProfileData {
        customer_type: CustomerType::Individual,
        bill_to: method.billing_address.as_ref().map(address_block),
        payment: PaymentData::Opaque {
            opaque_data: OpaqueData {
                data_descriptor: details.data_descriptor.clone(),
                data_value: details.data_value.clone(),
            },
        },
    }
}

/// The comma-delimited validation string, wherever the response put it.
///
/// Attach responses carry `validationDirectResponse`; create-profile
/// responses wrap it in `validationDirectResponseList.string` (scalar or
/// list).
fn validation_direct_response(response: &RemoteResponse) -> Result<String, GatewayError> {
    if let Some(direct) = response.string_at("/validationDirectResponse") {
        return Ok(direct);
    }
    response
        .contents()
        .pointer("/validationDirectResponseList/string")
        .and_then(|v| {
            serde_json::from_value::<api::OneOrMany<String>>(v.clone())
                .ok()
                .and_then(api::OneOrMany::into_first)
        })
        .ok_or_else(|| {
            GatewayError::InvalidResponse(
                "response is missing validationDirectResponse".to_string(),
            )
        })
}

/// First whitespace-delimited numeric token in a duplicate-record message.
fn extract_duplicate_profile_id(text: &str) -> Option<String> {
    text.split_whitespace()
        .find(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
        .map(String::from)
}

/// Card brand from the comma-delimited validation response string.
fn parse_card_brand(validation_response: &str) -> Result<CardBrand, GatewayError> {
    let vendor_brand = validation_response
        .split(',')
        .nth(CARD_TYPE_FIELD_INDEX)
        .ok_or_else(|| {
            GatewayError::Validation(format!(
                "validation response has fewer than {} fields",
                CARD_TYPE_FIELD_INDEX + 1
            ))
        })?;
    map_card_brand(vendor_brand)
}

/// Map the vendor's card-type string onto the local brand enum.
fn map_card_brand(vendor_brand: &str) -> Result<CardBrand, GatewayError> {
    match vendor_brand {
        "American Express" => Ok(CardBrand::Amex),
        "Diners Club" => Ok(CardBrand::DinersClub),
        "Discover" => Ok(CardBrand::Discover),
        "JCB" => Ok(CardBrand::Jcb),
        "MasterCard" => Ok(CardBrand::Mastercard),
        "Visa" => Ok(CardBrand::Visa),
        other => Err(GatewayError::UnsupportedCardType(other.to_string())),
    }
}
