use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::product::Product;

/// Lifecycle of an order. Orders are only ever placed, so `Pending` is the one state.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(OrderStatus::Pending),
            _ => None,
        }
    }
}

/// One requested line in an order placement.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    /// Between 1 and 100 units per line.
    #[validate(range(min = 1, max = 100))]
    pub quantity: u32,
}

/// Payload for placing an order.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderInput {
    #[validate(length(min = 1, max = 50))]
    pub items: Vec<OrderItemInput>,
    #[validate(length(min = 5, max = 500))]
    pub shipping_address: String,
}

/// A priced order line. The unit price is captured at placement time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl OrderItem {
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            quantity,
            unit_price_cents: product.price_cents,
        }
    }

    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub shipping_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(input: NewOrder) -> Self {
        let total_cents = input.items.iter().map(OrderItem::line_total_cents).sum();
        Self {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            items: input.items,
            total_cents,
            status: OrderStatus::Pending,
            shipping_address: input.shipping_address,
            created_at: Utc::now(),
        }
    }
}
