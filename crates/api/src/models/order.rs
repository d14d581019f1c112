//! Order models: stored orders, resolved views and request bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{
    CustomerId, OrderId, OrderStatus, Price, ProductId, ShippingAddress, StatusTimeline,
};

use super::customer::CustomerSummary;
use super::product::ProductSummary;

/// A line as captured at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price at the instant the order was placed.
    pub price: Price,
}

impl OrderLine {
    #[must_use]
    pub fn total(&self) -> Price {
        self.price.line_total(self.quantity)
    }
}

/// An order about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub items: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub total_price: Price,
    pub placed_at: DateTime<Utc>,
}

/// The mutable part of an order: who owns it and where it is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderState {
    pub id: OrderId,
    /// `None` once the owning customer has been deleted.
    pub customer_id: Option<CustomerId>,
    pub status: OrderStatus,
    pub timeline: StatusTimeline,
}

/// A line item with its product resolved.
///
/// `product` is `None` once the product has been deleted from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: ProductId,
    pub product: Option<ProductSummary>,
    pub quantity: u32,
    pub price: Price,
}

/// A fully populated order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub id: OrderId,
    pub customer: Option<CustomerSummary>,
    pub order_items: Vec<OrderItemView>,
    pub shipping_address: ShippingAddress,
    pub total_price: Price,
    pub status: OrderStatus,
    pub status_timeline: StatusTimeline,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing tracking projection of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTracking {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub total_price: Price,
    pub order_date: DateTime<Utc>,
    /// Every status, `null` where the order has not reached it.
    pub timeline: BTreeMap<OrderStatus, Option<DateTime<Utc>>>,
    pub items: Vec<TrackedItem>,
}

/// A line on the tracking view: product name and images, captured price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItem {
    pub product_id: ProductId,
    pub name: Option<String>,
    pub images: Vec<String>,
    pub quantity: u32,
    pub price: Price,
}

impl From<OrderDetails> for OrderTracking {
    fn from(order: OrderDetails) -> Self {
        let items = order
            .order_items
            .into_iter()
            .map(|item| {
                let (name, images) = item
                    .product
                    .map_or((None, Vec::new()), |p| (Some(p.name), p.images));
                TrackedItem {
                    product_id: item.product_id,
                    name,
                    images,
                    quantity: item.quantity,
                    price: item.price,
                }
            })
            .collect();

        Self {
            order_id: order.id,
            status: order.status,
            total_price: order.total_price,
            order_date: order.created_at,
            timeline: order.status_timeline.complete(),
            items,
        }
    }
}

/// One requested line of `POST /api/orders`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub order_items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddress,
}

/// Body of `PUT /api/admin/orders/{id}`.
///
/// The status stays a string here so unknown values surface as a
/// validation error instead of a body rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// Body of `POST /api/admin/orders/bulk-update`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    #[serde(default)]
    pub order_ids: Vec<OrderId>,
    #[serde(default)]
    pub status: String,
}
