//! Dashboard aggregate queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_core::{CustomerId, OrderId, OrderStatus, Price, ProductId};

use super::RepositoryError;
use crate::models::stats::{
    LOW_STOCK_THRESHOLD, MonthlyRevenue, RECENT_ORDERS, RECENT_PRODUCTS, RecentOrder,
    RecentProduct, TOP_PRODUCTS, TopProduct,
};
use crate::models::{DashboardWindows, StatsSnapshot};

#[derive(Debug, sqlx::FromRow)]
struct CountsRow {
    total_orders: i64,
    total_revenue: Decimal,
    previous_orders: i64,
    previous_revenue: Decimal,
    today_orders: i64,
    today_revenue: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct PopulationRow {
    total_customers: i64,
    previous_customers: i64,
    total_products: i64,
    previous_products: i64,
    low_stock: i64,
    out_of_stock: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct MonthlyRow {
    year: i32,
    month: i32,
    revenue: Decimal,
    orders: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct TopProductRow {
    product_id: ProductId,
    name: String,
    total_revenue: Decimal,
    total_sales: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct RecentOrderRow {
    id: OrderId,
    customer_id: Option<CustomerId>,
    customer_name: Option<String>,
    customer_email: Option<String>,
    status: OrderStatus,
    total_price: Price,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct RecentProductRow {
    id: ProductId,
    name: String,
    created_at: DateTime<Utc>,
}

fn price(amount: Decimal, what: &str) -> Result<Price, RepositoryError> {
    Price::new(amount)
        .map_err(|e| RepositoryError::DataCorruption(format!("negative {what}: {e}")))
}

/// Repository for dashboard statistics.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Gather every aggregate the dashboard shows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[tracing::instrument(skip(self))]
    pub async fn snapshot(
        &self,
        windows: &DashboardWindows,
    ) -> Result<StatsSnapshot, RepositoryError> {
        let counts = sqlx::query_as::<_, CountsRow>(
            r"
            SELECT
                COUNT(*) AS total_orders,
                COALESCE(SUM(total_price), 0) AS total_revenue,
                COUNT(*) FILTER (WHERE created_at >= $1 AND created_at < $2) AS previous_orders,
                COALESCE(SUM(total_price) FILTER (WHERE created_at >= $1 AND created_at < $2), 0)
                    AS previous_revenue,
                COUNT(*) FILTER (WHERE created_at >= $3) AS today_orders,
                COALESCE(SUM(total_price) FILTER (WHERE created_at >= $3), 0) AS today_revenue
            FROM orders
            ",
        )
        .bind(windows.start_of_previous_month)
        .bind(windows.start_of_month)
        .bind(windows.start_of_today)
        .fetch_one(self.pool)
        .await?;

        let population = sqlx::query_as::<_, PopulationRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM customers WHERE NOT is_admin) AS total_customers,
                (SELECT COUNT(*) FROM customers
                  WHERE NOT is_admin AND created_at >= $1 AND created_at < $2)
                    AS previous_customers,
                (SELECT COUNT(*) FROM products) AS total_products,
                (SELECT COUNT(*) FROM products WHERE created_at >= $1 AND created_at < $2)
                    AS previous_products,
                (SELECT COUNT(*) FROM products WHERE stock > 0 AND stock <= $3) AS low_stock,
                (SELECT COUNT(*) FROM products WHERE stock = 0) AS out_of_stock
            ",
        )
        .bind(windows.start_of_previous_month)
        .bind(windows.start_of_month)
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(self.pool)
        .await?;

        let status_counts: Vec<(OrderStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(self.pool)
                .await?;

        let monthly = sqlx::query_as::<_, MonthlyRow>(
            r"
            SELECT
                EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::int4 AS year,
                EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::int4 AS month,
                COALESCE(SUM(total_price), 0) AS revenue,
                COUNT(*) AS orders
            FROM orders
            WHERE created_at >= $1
            GROUP BY 1, 2
            ORDER BY 1, 2
            ",
        )
        .bind(windows.series_start)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|row| {
            Ok(MonthlyRevenue {
                year: row.year,
                month: u32::try_from(row.month).map_err(|_| {
                    RepositoryError::DataCorruption(format!("month {} out of range", row.month))
                })?,
                revenue: price(row.revenue, "monthly revenue")?,
                orders: row.orders,
            })
        })
        .collect::<Result<Vec<_>, RepositoryError>>()?;

        // Deleted products drop out of the ranking.
        let top_products = sqlx::query_as::<_, TopProductRow>(
            r"
            SELECT i.product_id, p.name,
                   SUM(i.price * i.quantity) AS total_revenue,
                   SUM(i.quantity)::int8 AS total_sales
            FROM order_items i
            JOIN products p ON p.id = i.product_id
            GROUP BY i.product_id, p.name
            ORDER BY total_revenue DESC, i.product_id
            LIMIT $1
            ",
        )
        .bind(TOP_PRODUCTS)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|row| {
            Ok(TopProduct {
                product_id: row.product_id,
                name: row.name,
                total_revenue: price(row.total_revenue, "product revenue")?,
                total_sales: row.total_sales,
            })
        })
        .collect::<Result<Vec<_>, RepositoryError>>()?;

        let recent_orders = sqlx::query_as::<_, RecentOrderRow>(
            r"
            SELECT o.id, o.customer_id, c.name AS customer_name, c.email AS customer_email,
                   o.status, o.total_price, o.created_at
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $1
            ",
        )
        .bind(RECENT_ORDERS)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|row| RecentOrder {
            id: row.id,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            status: row.status,
            total_price: row.total_price,
            created_at: row.created_at,
        })
        .collect();

        let recent_products = sqlx::query_as::<_, RecentProductRow>(
            "SELECT id, name, created_at FROM products ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(RECENT_PRODUCTS)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|row| RecentProduct {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        })
        .collect();

        Ok(StatsSnapshot {
            total_orders: counts.total_orders,
            total_customers: population.total_customers,
            total_products: population.total_products,
            previous_orders: counts.previous_orders,
            previous_customers: population.previous_customers,
            previous_products: population.previous_products,
            total_revenue: price(counts.total_revenue, "total revenue")?,
            previous_revenue: price(counts.previous_revenue, "previous revenue")?,
            status_counts,
            today_orders: counts.today_orders,
            today_revenue: price(counts.today_revenue, "today revenue")?,
            low_stock: population.low_stock,
            out_of_stock: population.out_of_stock,
            monthly,
            top_products,
            recent_orders,
            recent_products,
        })
    }
}
