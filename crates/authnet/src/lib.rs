//! Authorize.Net gateway integration for Pineapple Payments.
//!
//! This crate maps local payment workflow state onto the gateway's remote
//! transaction semantics: tokenized card/eCheck capture, authorization,
//! capture, void and refund, plus reconciliation of asynchronously settled
//! eCheck batches.
//!
//! # Architecture
//!
//! - [`client::GatewayClient`] - low-level transport: one JSON endpoint,
//!   typed request envelopes, uniform response parsing
//! - [`profiles::ProfileManager`] - creates/reuses remote customer and
//!   payment profiles, including duplicate-profile recovery
//! - [`transactions::TransactionOrchestrator`] - builds and submits
//!   transaction requests and drives the payment state machine
//! - [`settlement::SettlementReconciler`] - maps settled eCheck batches back
//!   to locally pending payments
//!
//! Entities (orders, payments, payment methods, customers) come from
//! [`pineapple_core`] and are mutated through `&mut` borrows only after the
//! gateway confirms an operation; persistence stays with the caller.
//!
//! # Security
//!
//! The transaction key is HIGH PRIVILEGE: it can charge and refund against
//! the merchant account. It is held as a [`secrecy::SecretString`] and never
//! appears in `Debug` output or logs.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod profiles;
pub mod repository;
pub mod settlement;
pub mod transactions;

pub use client::{GatewayClient, RequestKind};
pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use profiles::{ChargeableProfile, PaymentDetails, ProfileManager};
pub use repository::{PaymentMethodRepository, PaymentRepository, RepositoryError};
pub use settlement::SettlementReconciler;
pub use transactions::TransactionOrchestrator;
