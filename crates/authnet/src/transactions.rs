//! Transaction orchestration: authorize, capture, void, refund.
//!
//! Drives the payment state machine:
//!
//! ```text
//! card:   new -[authorize+capture]-> completed
//!         new -[authorize only]---> authorization
//! echeck: new -[submit]-----------> pending -[capture]-> completed
//!                                   pending -[void]----> voided
//! refund: completed ----------------> partially_refunded | refunded
//!         partially_refunded -------> partially_refunded | refunded
//! ```
//!
//! Every mutating operation asserts the payment is in an allowed source
//! state first, and local state only changes after the gateway confirms the
//! remote side - there are no optimistic writes.

use pineapple_core::{Address, Customer, Order, Payment, PaymentMethod, PaymentState, Price};
use tracing::{instrument, warn};

use crate::api::{
    codes, AddressData, CreateTransactionEnvelope, CreateTransactionRequest, CreditCardRef,
    ExtendedAmount, LineItemData, LineItems, OpaqueData, OrderData, PaymentData, PaymentProfileRef,
    ProfileToCharge, RemoteResponse, TransactionPayload, TransactionRequest, TransactionType,
};
use crate::client::{GatewayClient, RequestKind};
use crate::error::GatewayError;
use crate::profiles::ProfileManager;
use crate::repository::PaymentMethodRepository;

/// Vendor limit on line-item names.
const LINE_ITEM_NAME_LIMIT: usize = 31;
/// Length labels are cut to before the ellipsis is appended.
const LINE_ITEM_TRUNCATED_LEN: usize = 28;
/// Vendor limit on the combined address line.
const ADDRESS_LINE_LIMIT: usize = 60;

/// Builds and submits gateway transactions and applies the resulting local
/// state transitions.
#[derive(Debug)]
pub struct TransactionOrchestrator<M: PaymentMethodRepository> {
    client: GatewayClient,
    profiles: ProfileManager,
    methods: M,
}

impl<M: PaymentMethodRepository> TransactionOrchestrator<M> {
    /// Create a new orchestrator.
    #[must_use]
    pub fn new(client: GatewayClient, methods: M) -> Self {
        Self {
            profiles: ProfileManager::new(client.clone()),
            client,
            methods,
        }
    }

    /// Authorize a card payment, optionally capturing in the same step.
    ///
    /// On success the payment moves to `Completed` (capture) or
    /// `Authorization` (auth only) and stores the gateway transaction id.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidState`] unless the payment is `New`.
    /// - [`GatewayError::PaymentMethodInvalid`] when the vendor reports the
    ///   stored token permanently invalid; the method is deleted first.
    /// - [`GatewayError::HardDecline`] for declines marked non-retryable -
    ///   do not resubmit the same request.
    /// - [`GatewayError::Declined`] for any other business decline.
    #[instrument(skip_all, fields(payment_id = %payment.id, order_id = %order.id, capture))]
    pub async fn authorize(
        &self,
        payment: &mut Payment,
        method: &PaymentMethod,
        owner: &Customer,
        order: &Order,
        capture: bool,
    ) -> Result<(), GatewayError> {
        assert_payment_state(payment, &[PaymentState::New])?;

        let profile = self.profiles.chargeable_profile(owner, method)?;
        let transaction_type = if capture {
            TransactionType::AuthCapture
        } else {
            TransactionType::AuthOnly
        };

        let mut request = base_transaction_request(transaction_type, payment.amount, order);
        request.profile = Some(ProfileToCharge {
            customer_profile_id: profile.customer_profile_id,
            payment_profile: PaymentProfileRef {
                payment_profile_id: profile.payment_profile_id,
            },
        });

        let response = self.submit(request).await?;
        self.ensure_transaction_success(&response, method).await?;

        let payload: TransactionPayload = response.decode()?;
        payment.state = if capture {
            PaymentState::Completed
        } else {
            PaymentState::Authorization
        };
        payment.remote_id = Some(payload.transaction_response.transaction_id);
        Ok(())
    }

    /// Submit an eCheck payment.
    ///
    /// The gateway settles eChecks asynchronously, so a successful
    /// submission parks the payment in `Pending`; settlement reconciliation
    /// (or a trusting merchant) promotes it later.
    ///
    /// # Errors
    ///
    /// Same decline mapping as [`authorize`](Self::authorize);
    /// [`GatewayError::Validation`] when the method's remote id is not the
    /// eCheck `descriptor|value` pair.
    #[instrument(skip_all, fields(payment_id = %payment.id, order_id = %order.id))]
    pub async fn submit_echeck(
        &self,
        payment: &mut Payment,
        method: &PaymentMethod,
        order: &Order,
    ) -> Result<(), GatewayError> {
        assert_payment_state(payment, &[PaymentState::New])?;

        let remote_id = method.remote_id.as_ref().ok_or_else(|| {
            GatewayError::Validation("payment method has no remote id".to_string())
        })?;
        let (data_descriptor, data_value) = remote_id.as_composite().ok_or_else(|| {
            GatewayError::Validation(
                "echeck methods store a descriptor|value token pair".to_string(),
            )
        })?;

        // eChecks have a pseudo "authorized" state at the vendor, so this is
        // always a combined auth + capture.
        let mut request =
            base_transaction_request(TransactionType::AuthCapture, payment.amount, order);
        request.payment = Some(PaymentData::Opaque {
            opaque_data: OpaqueData {
                data_descriptor: data_descriptor.to_string(),
                data_value: data_value.to_string(),
            },
        });
        request.bill_to = method.billing_address.as_ref().map(address_block);

        let response = self.submit(request).await?;
        self.ensure_transaction_success(&response, method).await?;

        let payload: TransactionPayload = response.decode()?;
        payment.state = PaymentState::Pending;
        payment.remote_id = Some(payload.transaction_response.transaction_id);
        Ok(())
    }

    /// Capture a pending eCheck payment.
    ///
    /// Local-only: the vendor already captured at submission and settles on
    /// its own schedule, so this simply records that the merchant trusts
    /// settlement. Reconciliation is the authoritative confirmation path.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] unless the payment is
    /// `Pending`.
    pub fn capture_echeck(
        &self,
        payment: &mut Payment,
        amount: Option<Price>,
    ) -> Result<(), GatewayError> {
        assert_payment_state(payment, &[PaymentState::Pending])?;
        if let Some(amount) = amount {
            if amount.currency_code != payment.amount.currency_code {
                return Err(GatewayError::Validation(
                    "capture amount currency does not match the payment".to_string(),
                ));
            }
            payment.amount = amount;
        }
        payment.state = PaymentState::Completed;
        Ok(())
    }

    /// Void a pending eCheck payment. Local-only, like capture.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] unless the payment is
    /// `Pending`.
    pub fn void_echeck(&self, payment: &mut Payment) -> Result<(), GatewayError> {
        assert_payment_state(payment, &[PaymentState::Pending])?;
        payment.state = PaymentState::Voided;
        Ok(())
    }

    /// Refund a completed payment, fully or partially.
    ///
    /// Defaults to the full remaining amount. The vendor verifies refunds
    /// against a masked card (last4 + MMYY) and the original transaction
    /// id. On success the refunded amount accumulates and the state becomes
    /// `PartiallyRefunded` or `Refunded`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidState`] unless the payment has been
    ///   captured (`Completed`, `PartiallyRefunded`, or `Refunded` - the
    ///   last so an over-refund surfaces as the amount error below).
    /// - [`GatewayError::RefundExceedsAmount`] when the requested amount
    ///   exceeds what remains refundable.
    /// - [`GatewayError::Declined`] on a gateway decline.
    #[instrument(skip_all, fields(payment_id = %payment.id, order_id = %order.id))]
    pub async fn refund(
        &self,
        payment: &mut Payment,
        method: &PaymentMethod,
        order: &Order,
        amount: Option<Price>,
    ) -> Result<(), GatewayError> {
        assert_payment_state(
            payment,
            &[
                PaymentState::Completed,
                PaymentState::PartiallyRefunded,
                PaymentState::Refunded,
            ],
        )?;

        let remaining = payment.remaining_refundable();
        let amount = amount.unwrap_or(remaining);
        if amount.currency_code != payment.amount.currency_code {
            return Err(GatewayError::Validation(
                "refund amount currency does not match the payment".to_string(),
            ));
        }
        if amount.amount.is_zero() || amount.amount.is_sign_negative() {
            return Err(GatewayError::Validation(
                "refund amount must be positive".to_string(),
            ));
        }
        if amount.amount > remaining.amount {
            return Err(GatewayError::RefundExceedsAmount {
                requested: amount,
                remaining,
            });
        }

        let remote_id = payment.remote_id.clone().ok_or_else(|| {
            GatewayError::Validation("payment has no remote transaction id".to_string())
        })?;
        let card = method.card.as_ref().ok_or_else(|| {
            GatewayError::Validation("refunds require stored card metadata".to_string())
        })?;

        let mut request = TransactionRequest::new(TransactionType::Refund, amount.to_wire_string());
        request.ref_trans_id = Some(remote_id);
        request.order = Some(OrderData {
            invoice_number: order.invoice_number(),
        });
        request.payment = Some(PaymentData::CreditCard {
            credit_card: CreditCardRef {
                card_number: card.last4.clone(),
                expiration_date: format_card_expiry(card.expiration_month, card.expiration_year),
            },
        });

        let response = self.submit(request).await?;
        if !response.is_ok() {
            let message = response.first_message().cloned().unwrap_or_default();
            warn!(code = %message.code, text = %message.text, "gateway declined refund");
            return Err(GatewayError::Declined {
                code: message.code,
                message: message.text,
            });
        }

        let new_refunded_amount = payment.refunded_amount.checked_add(&amount)?;
        payment.state = if new_refunded_amount.amount < payment.amount.amount {
            PaymentState::PartiallyRefunded
        } else {
            PaymentState::Refunded
        };
        payment.refunded_amount = new_refunded_amount;
        Ok(())
    }

    async fn submit(&self, request: TransactionRequest) -> Result<RemoteResponse, GatewayError> {
        let envelope = CreateTransactionEnvelope {
            create_transaction_request: CreateTransactionRequest {
                merchant_authentication: self.client.merchant_authentication(),
                transaction_request: request,
            },
        };
        self.client
            .execute(RequestKind::CreateTransaction, &envelope)
            .await
    }

    /// Interpret a charge response, mapping declines onto the error
    /// taxonomy. Deletes the stored payment method when the vendor reports
    /// its token permanently invalid.
    async fn ensure_transaction_success(
        &self,
        response: &RemoteResponse,
        method: &PaymentMethod,
    ) -> Result<(), GatewayError> {
        if !response.is_ok() {
            let message = response.first_message().cloned().unwrap_or_default();
            warn!(code = %message.code, text = %message.text, "gateway declined transaction");

            if message.code == codes::INVALID_REFERENCE {
                self.methods.delete(method.id).await?;
                return Err(GatewayError::PaymentMethodInvalid);
            }
            if let Some(error) = response.transaction_errors().first() {
                return Err(GatewayError::HardDecline(error.error_text.clone()));
            }
            return Err(GatewayError::Declined {
                code: message.code,
                message: message.text,
            });
        }

        // The result code can be Ok while the transaction itself carries
        // hard errors; those are non-retryable declines.
        if let Some(error) = response.transaction_errors().first() {
            warn!(code = %error.error_code, text = %error.error_text, "gateway returned hard errors");
            return Err(GatewayError::HardDecline(error.error_text.clone()));
        }
        Ok(())
    }
}

/// The request skeleton shared by card and eCheck charges: amount, invoice
/// number, customer IP, line items, tax/shipping totals, and a shipping
/// address when the order has one.
fn base_transaction_request(
    transaction_type: TransactionType,
    amount: Price,
    order: &Order,
) -> TransactionRequest {
    let mut request = TransactionRequest::new(transaction_type, amount.to_wire_string());
    request.order = Some(OrderData {
        invoice_number: order.invoice_number(),
    });
    request.customer_ip = order.ip_address.clone();
    request.line_items = line_items(order);
    request.tax = Some(ExtendedAmount {
        amount: order.tax_total.to_wire_string(),
    });
    if !order.shipping_total.is_zero() {
        request.shipping = Some(ExtendedAmount {
            amount: order.shipping_total.to_wire_string(),
        });
    }
    request.ship_to = order
        .shipment
        .as_ref()
        .map(|shipment| address_block(&shipment.shipping_address));
    request
}

/// Guard an operation against its allowed source states.
fn assert_payment_state(
    payment: &Payment,
    allowed: &[PaymentState],
) -> Result<(), GatewayError> {
    if allowed.contains(&payment.state) {
        Ok(())
    } else {
        Err(GatewayError::InvalidState {
            actual: payment.state,
            expected: allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Order items as gateway line items; absent when the order has none.
fn line_items(order: &Order) -> Option<LineItems> {
    if order.items.is_empty() {
        return None;
    }
    Some(LineItems {
        line_item: order
            .items
            .iter()
            .map(|item| LineItemData {
                item_id: item.id.to_string(),
                name: line_item_name(&item.label),
                quantity: item.quantity.to_string(),
                unit_price: item.unit_price.to_wire_string(),
            })
            .collect(),
    })
}

/// Labels longer than the vendor limit are truncated with an ellipsis.
fn line_item_name(label: &str) -> String {
    if label.chars().count() > LINE_ITEM_NAME_LIMIT {
        let truncated: String = label.chars().take(LINE_ITEM_TRUNCATED_LEN).collect();
        format!("{truncated}...")
    } else {
        label.to_string()
    }
}

/// A `billTo`/`shipTo` block from a local address.
///
/// Name, address line (capped at 60 chars) and country are always present;
/// company, city, state and zip are included only when non-empty, because
/// the vendor rejects blank optional fields.
pub(crate) fn address_block(address: &Address) -> AddressData {
    AddressData {
        first_name: Some(address.given_name.clone()),
        last_name: Some(address.family_name.clone()),
        company: non_empty(address.organization.as_deref()),
        address: Some(address.combined_line().chars().take(ADDRESS_LINE_LIMIT).collect()),
        city: non_empty(address.locality.as_deref()),
        state: non_empty(address.administrative_area.as_deref()),
        zip: non_empty(address.postal_code.as_deref()),
        country: Some(address.country_code.clone()),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(String::from)
}

/// Zero-padded `MMYY` as the vendor's refund verification expects.
fn format_card_expiry(month: u32, year: i32) -> String {
    format!("{month:02}{:02}", year.rem_euclid(100))
}
