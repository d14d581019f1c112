//! In-memory [`OrderStore`] for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bazaar_core::{
    CustomerId, Email, OrderId, OrderStatus, Price, ProductId, StatusTimeline,
};

use super::{OrderStore, StockTake};
use crate::db::RepositoryError;
use crate::models::{
    CustomerSummary, NewOrder, OrderDetails, OrderItemView, OrderState, ProductSummary,
};

struct StoredProduct {
    name: String,
    price: Price,
    stock: i32,
    is_active: bool,
}

struct StoredOrder {
    order: NewOrder,
    status: OrderStatus,
    timeline: StatusTimeline,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    products: BTreeMap<ProductId, StoredProduct>,
    customers: BTreeMap<CustomerId, CustomerSummary>,
    orders: BTreeMap<OrderId, StoredOrder>,
    next_order: i32,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn add_customer(&self, id: CustomerId, name: &str, email: &str) {
        self.lock().customers.insert(
            id,
            CustomerSummary {
                id,
                name: name.to_owned(),
                email: Email::parse(email).unwrap(),
            },
        );
    }

    pub fn add_product(&self, id: ProductId, name: &str, price: Price, stock: i32, is_active: bool) {
        self.lock().products.insert(
            id,
            StoredProduct {
                name: name.to_owned(),
                price,
                stock,
                is_active,
            },
        );
    }

    pub fn set_price(&self, id: ProductId, price: Price) {
        self.lock().products.get_mut(&id).unwrap().price = price;
    }

    pub fn stock(&self, id: ProductId) -> i32 {
        self.lock().products[&id].stock
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    pub fn state(&self, id: OrderId) -> OrderState {
        let tables = self.lock();
        let stored = &tables.orders[&id];
        OrderState {
            id,
            customer_id: Some(stored.order.customer_id),
            status: stored.status,
            timeline: stored.timeline.clone(),
        }
    }

    pub fn status(&self, id: OrderId) -> OrderStatus {
        self.state(id).status
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn unit_prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Price>, RepositoryError> {
        let tables = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| {
                tables
                    .products
                    .get(id)
                    .filter(|p| p.is_active)
                    .map(|p| (*id, p.price))
            })
            .collect())
    }

    async fn take_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
        budget: Price,
    ) -> Result<StockTake, RepositoryError> {
        let mut tables = self.lock();
        let Some(product) = tables
            .products
            .get_mut(&product_id)
            .filter(|p| p.is_active)
        else {
            return Ok(StockTake::Unavailable);
        };

        let units = i32::try_from(quantity).unwrap();
        if product.stock < units {
            return Ok(StockTake::Insufficient {
                name: product.name.clone(),
                available: product.stock,
            });
        }
        if product.price.line_total(quantity) > budget {
            return Ok(StockTake::OverBudget);
        }
        product.stock -= units;
        Ok(StockTake::Taken {
            unit_price: product.price,
        })
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let mut tables = self.lock();
        tables.next_order += 1;
        let id = OrderId::new(tables.next_order);
        tables.orders.insert(
            id,
            StoredOrder {
                order: order.clone(),
                status: OrderStatus::Placed,
                timeline: StatusTimeline::placed(order.placed_at),
                updated_at: order.placed_at,
            },
        );
        Ok(id)
    }

    async fn order_state(&self, id: OrderId) -> Result<Option<OrderState>, RepositoryError> {
        let tables = self.lock();
        Ok(tables.orders.get(&id).map(|stored| OrderState {
            id,
            customer_id: Some(stored.order.customer_id),
            status: stored.status,
            timeline: stored.timeline.clone(),
        }))
    }

    async fn order_details(&self, id: OrderId) -> Result<Option<OrderDetails>, RepositoryError> {
        let tables = self.lock();
        let Some(stored) = tables.orders.get(&id) else {
            return Ok(None);
        };

        let order_items = stored
            .order
            .items
            .iter()
            .map(|line| OrderItemView {
                product_id: line.product_id,
                product: tables.products.get(&line.product_id).map(|p| ProductSummary {
                    id: line.product_id,
                    name: p.name.clone(),
                    price: p.price,
                    images: vec![format!("https://cdn.example.test/{}.jpg", line.product_id)],
                }),
                quantity: line.quantity,
                price: line.price,
            })
            .collect();

        Ok(Some(OrderDetails {
            id,
            customer: tables.customers.get(&stored.order.customer_id).cloned(),
            order_items,
            shipping_address: stored.order.shipping_address.clone(),
            total_price: stored.order.total_price,
            status: stored.status,
            status_timeline: stored.timeline.clone(),
            created_at: stored.order.placed_at,
            updated_at: stored.updated_at,
        }))
    }

    async fn save_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        timeline: &StatusTimeline,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let stored = tables.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        stored.status = status;
        stored.timeline = timeline.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn bulk_set_status(
        &self,
        ids: &[OrderId],
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.lock();
        let mut updated = 0;
        for stored in tables
            .orders
            .iter_mut()
            .filter(|(id, _)| ids.contains(*id))
            .map(|(_, stored)| stored)
        {
            stored.status = status;
            stored.timeline.record_latest(status, at);
            stored.updated_at = at;
            updated += 1;
        }
        Ok(updated)
    }
}
