//! Order repository.
//!
//! Orders are read back fully populated: the owning customer's name and
//! email, and for each line the current product summary next to the price
//! captured at checkout.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use bazaar_core::{
    CustomerId, Email, OrderId, OrderStatus, Price, ProductId, ShippingAddress, StatusTimeline,
};

use super::RepositoryError;
use crate::models::{
    CustomerSummary, NewOrder, OrderDetails, OrderItemView, OrderState, ProductSummary,
};
use crate::services::orders::{OrderStore, StockTake};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer_id: Option<CustomerId>,
    customer_name: Option<String>,
    customer_email: Option<Email>,
    shipping_address: Json<ShippingAddress>,
    total_price: Price,
    status: OrderStatus,
    status_timeline: Json<StatusTimeline>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_details(self, order_items: Vec<OrderItemView>) -> OrderDetails {
        let customer = match (self.customer_id, self.customer_name, self.customer_email) {
            (Some(id), Some(name), Some(email)) => Some(CustomerSummary { id, name, email }),
            _ => None,
        };

        OrderDetails {
            id: self.id,
            customer,
            order_items,
            shipping_address: self.shipping_address.0,
            total_price: self.total_price,
            status: self.status,
            status_timeline: self.status_timeline.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    price: Price,
    product_name: Option<String>,
    product_price: Option<Price>,
    product_images: Option<Vec<String>>,
}

impl TryFrom<OrderItemRow> for OrderItemView {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "order {} has quantity {} for product {}",
                row.order_id, row.quantity, row.product_id
            ))
        })?;
        let product = match (row.product_name, row.product_price) {
            (Some(name), Some(price)) => Some(ProductSummary {
                id: row.product_id,
                name,
                price,
                images: row.product_images.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Self {
            product_id: row.product_id,
            product,
            quantity,
            price: row.price,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    name: String,
    stock: i32,
    is_active: bool,
}

const ORDER_SELECT: &str = r"
    SELECT o.id, o.customer_id, c.name AS customer_name, c.email AS customer_email,
           o.shipping_address, o.total_price, o.status, o.status_timeline,
           o.created_at, o.updated_at
    FROM orders o
    LEFT JOIN customers c ON c.id = o.customer_id
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.customer_id = $1 ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(customer_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        self.populate(rows).await
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderDetails>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} ORDER BY o.created_at DESC, o.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.populate(rows).await
    }

    /// Attach line items to orders with one query for all of them.
    async fn populate(&self, rows: Vec<OrderRow>) -> Result<Vec<OrderDetails>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_details(order_items)
            })
            .collect())
    }

    async fn items_for(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<OrderId, Vec<OrderItemView>>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT i.order_id, i.product_id, i.quantity, i.price,
                   p.name AS product_name, p.price AS product_price, p.images AS product_images
            FROM order_items i
            LEFT JOIN products p ON p.id = i.product_id
            WHERE i.order_id = ANY($1)
            ORDER BY i.order_id, i.position
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItemView>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped.entry(order_id).or_default().push(row.try_into()?);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl OrderStore for OrderRepository<'_> {
    async fn unit_prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Price>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, (ProductId, Price)>(
            "SELECT id, price FROM products WHERE id = ANY($1) AND is_active",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn take_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
        budget: Price,
    ) -> Result<StockTake, RepositoryError> {
        // No product can hold more than i32::MAX units, so saturating still fails the check.
        let quantity = i32::try_from(quantity).unwrap_or(i32::MAX);

        // Single conditional decrement: concurrent checkouts cannot oversell.
        let taken: Option<Price> = sqlx::query_scalar(
            r"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND is_active AND stock >= $2 AND price * $2 <= $3
            RETURNING price
            ",
        )
        .bind(product_id.as_i32())
        .bind(quantity)
        .bind(budget)
        .fetch_optional(self.pool)
        .await?;

        if let Some(unit_price) = taken {
            return Ok(StockTake::Taken { unit_price });
        }

        let current = sqlx::query_as::<_, StockRow>(
            "SELECT name, stock, is_active FROM products WHERE id = $1",
        )
        .bind(product_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(match current {
            Some(row) if row.is_active && row.stock < quantity => StockTake::Insufficient {
                name: row.name,
                available: row.stock,
            },
            Some(row) if row.is_active => StockTake::OverBudget,
            _ => StockTake::Unavailable,
        })
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO orders (customer_id, shipping_address, total_price, status,
                                status_timeline, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id
            ",
        )
        .bind(order.customer_id.as_i32())
        .bind(Json(&order.shipping_address))
        .bind(order.total_price)
        .bind(OrderStatus::Placed)
        .bind(Json(StatusTimeline::placed(order.placed_at)))
        .bind(order.placed_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut positions = Vec::with_capacity(order.items.len());
        let mut product_ids = Vec::with_capacity(order.items.len());
        let mut quantities = Vec::with_capacity(order.items.len());
        let mut prices = Vec::with_capacity(order.items.len());
        for (position, line) in (1_i32..).zip(&order.items) {
            positions.push(position);
            product_ids.push(line.product_id.as_i32());
            quantities.push(i32::try_from(line.quantity).map_err(|_| {
                RepositoryError::Conflict(format!("quantity {} out of range", line.quantity))
            })?);
            prices.push(line.price.amount());
        }

        sqlx::query(
            r"
            INSERT INTO order_items (order_id, position, product_id, quantity, price)
            SELECT $1, * FROM UNNEST($2::int4[], $3::int4[], $4::int4[], $5::numeric[])
            ",
        )
        .bind(order_id.as_i32())
        .bind(&positions)
        .bind(&product_ids)
        .bind(&quantities)
        .bind(&prices)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order_id)
    }

    async fn order_state(&self, id: OrderId) -> Result<Option<OrderState>, RepositoryError> {
        let row: Option<(Option<CustomerId>, OrderStatus, Json<StatusTimeline>)> = sqlx::query_as(
            "SELECT customer_id, status, status_timeline FROM orders WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(customer_id, status, timeline)| OrderState {
            id,
            customer_id,
            status,
            timeline: timeline.0,
        }))
    }

    async fn order_details(&self, id: OrderId) -> Result<Option<OrderDetails>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order_items = self
            .items_for(&[id.as_i32()])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(Some(row.into_details(order_items)))
    }

    async fn save_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        timeline: &StatusTimeline,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2, status_timeline = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(status)
        .bind(Json(timeline))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn bulk_set_status(
        &self,
        ids: &[OrderId],
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut stamp = StatusTimeline::new();
        stamp.record_latest(status, at);
        let ids: Vec<i32> = ids.iter().map(OrderId::as_i32).collect();

        // JSONB concatenation replaces the key, so the stamp always moves to `at`.
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2, status_timeline = status_timeline || $3, updated_at = $4
            WHERE id = ANY($1)
            ",
        )
        .bind(&ids)
        .bind(status)
        .bind(Json(&stamp))
        .bind(at)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
