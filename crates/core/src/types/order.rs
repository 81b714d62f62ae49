//! Order entities owned by the host commerce system.

use serde::{Deserialize, Serialize};

use super::address::Address;
use super::id::{OrderId, OrderItemId};
use super::price::Price;

/// An order, as read from the host order-management system.
///
/// Read-only to the gateway integration: it is a data source for building
/// transaction requests (invoice number, line items, totals, shipping),
/// never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Internal order ID.
    pub id: OrderId,
    /// Human-facing order number, if one has been assigned.
    pub order_number: Option<String>,
    /// Customer IP address captured at checkout.
    pub ip_address: Option<String>,
    /// Purchased line items.
    pub items: Vec<OrderItem>,
    /// Computed tax total.
    pub tax_total: Price,
    /// Computed shipping total.
    pub shipping_total: Price,
    /// Shipment, when the order has physical goods.
    pub shipment: Option<Shipment>,
}

impl Order {
    /// The invoice number sent to the gateway: the human order number when
    /// assigned, otherwise the internal order id.
    #[must_use]
    pub fn invoice_number(&self) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// A single purchased line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Line item ID.
    pub id: OrderItemId,
    /// Display label.
    pub label: String,
    /// Quantity purchased.
    pub quantity: u32,
    /// Price per unit.
    pub unit_price: Price,
}

/// A shipment attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    /// Destination address from the shipping profile.
    pub shipping_address: Address,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::price::CurrencyCode;

    fn order(order_number: Option<&str>) -> Order {
        Order {
            id: OrderId::new(17),
            order_number: order_number.map(String::from),
            ip_address: None,
            items: vec![],
            tax_total: Price::zero(CurrencyCode::USD),
            shipping_total: Price::zero(CurrencyCode::USD),
            shipment: None,
        }
    }

    #[test]
    fn test_invoice_number_prefers_order_number() {
        assert_eq!(order(Some("2024-0042")).invoice_number(), "2024-0042");
    }

    #[test]
    fn test_invoice_number_falls_back_to_id() {
        assert_eq!(order(None).invoice_number(), "17");
    }
}
