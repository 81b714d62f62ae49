//! Pineapple Payments Core - Shared payment domain types.
//!
//! This crate provides the types shared across the Pineapple Payments
//! components:
//! - `authnet` - Authorize.Net gateway integration
//! - `integration-tests` - End-to-end tests against a mock gateway
//!
//! # Architecture
//!
//! The core crate contains only types and helpers - no I/O, no database
//! access, no HTTP clients. Entities owned by the host commerce system
//! (orders, payments, payment methods, customers) are modeled here as plain
//! data; the gateway crate mutates them through explicit borrows and leaves
//! persistence to the caller.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, payment state, and entities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
