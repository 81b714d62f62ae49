//! Core types for Pineapple Payments.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod customer;
pub mod email;
pub mod id;
pub mod order;
pub mod payment;
pub mod price;
pub mod status;

pub use address::Address;
pub use customer::Customer;
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderItem, Shipment};
pub use payment::{
    CardBrand, CardMetadata, Payment, PaymentMethod, PaymentMethodKind, RemoteId, RemoteIdError,
};
pub use price::{CurrencyCode, Price, PriceError};
pub use status::PaymentState;
