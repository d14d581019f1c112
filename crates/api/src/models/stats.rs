//! Admin dashboard statistics.
//!
//! The repository gathers a [`StatsSnapshot`] of raw aggregates; this module
//! turns it into the response shape, filling in every status bucket and every
//! month of the revenue series so empty periods read as zero.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::Serialize;

use bazaar_core::{CustomerId, OrderId, OrderStatus, Price, ProductId};

/// Number of calendar months in the revenue series, current month included.
pub const REVENUE_SERIES_MONTHS: u32 = 6;

/// Products at or below this stock level (and above zero) count as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Number of products in the top-sellers list.
pub const TOP_PRODUCTS: i64 = 5;

/// Number of recent orders shown.
pub const RECENT_ORDERS: i64 = 5;

/// Number of recent products shown.
pub const RECENT_PRODUCTS: i64 = 3;

/// Time boundaries for one dashboard computation, all in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardWindows {
    pub now: DateTime<Utc>,
    pub start_of_today: DateTime<Utc>,
    pub start_of_month: DateTime<Utc>,
    pub start_of_previous_month: DateTime<Utc>,
    /// First instant of the oldest month in the revenue series.
    pub series_start: DateTime<Utc>,
}

impl DashboardWindows {
    /// Windows relative to `now`. `None` only at the edge of chrono's range.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Option<Self> {
        let today = now.date_naive();
        let month = today.with_day(1)?;
        let previous = month.checked_sub_months(Months::new(1))?;
        let series = month.checked_sub_months(Months::new(REVENUE_SERIES_MONTHS - 1))?;

        Some(Self {
            now,
            start_of_today: midnight(today)?,
            start_of_month: midnight(month)?,
            start_of_previous_month: midnight(previous)?,
            series_start: midnight(series)?,
        })
    }

    /// `(year, month)` of each series bucket, oldest first.
    #[must_use]
    pub fn series_months(&self) -> Vec<(i32, u32)> {
        let start = self.series_start.date_naive();
        (0..REVENUE_SERIES_MONTHS)
            .filter_map(|offset| start.checked_add_months(Months::new(offset)))
            .map(|d| (d.year(), d.month()))
            .collect()
    }
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

/// Raw aggregates read from the database.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub total_orders: i64,
    pub total_customers: i64,
    pub total_products: i64,
    pub previous_orders: i64,
    pub previous_customers: i64,
    pub previous_products: i64,
    pub total_revenue: Price,
    pub previous_revenue: Price,
    pub status_counts: Vec<(OrderStatus, i64)>,
    pub today_orders: i64,
    pub today_revenue: Price,
    pub low_stock: i64,
    pub out_of_stock: i64,
    pub monthly: Vec<MonthlyRevenue>,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<RecentOrder>,
    pub recent_products: Vec<RecentProduct>,
}

/// Revenue and order count for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub revenue: Price,
    pub orders: i64,
}

/// A product ranked by revenue across all order lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub total_revenue: Price,
    pub total_sales: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub status: OrderStatus,
    pub total_price: Price,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProduct {
    pub id: ProductId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub orders: i64,
    pub revenue: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAlerts {
    pub low_stock: i64,
    pub out_of_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub orders: Vec<RecentOrder>,
    pub products: Vec<RecentProduct>,
}

/// Response of `GET /api/admin/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: Price,
    pub total_orders: i64,
    pub total_customers: i64,
    pub total_products: i64,
    pub previous_revenue: Price,
    pub previous_orders: i64,
    pub previous_customers: i64,
    pub previous_products: i64,
    pub order_stats: BTreeMap<OrderStatus, i64>,
    pub today_stats: TodayStats,
    pub stock_alerts: StockAlerts,
    pub avg_order_value: Price,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub top_products: Vec<TopProduct>,
    pub recent_activity: RecentActivity,
    pub last_updated: DateTime<Utc>,
}

impl DashboardStats {
    /// Assemble the response from raw aggregates.
    #[must_use]
    pub fn build(snapshot: StatsSnapshot, windows: &DashboardWindows) -> Self {
        let mut order_stats: BTreeMap<OrderStatus, i64> =
            OrderStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        for (status, count) in snapshot.status_counts {
            order_stats.insert(status, count);
        }

        let monthly_revenue = windows
            .series_months()
            .into_iter()
            .map(|(year, month)| {
                snapshot
                    .monthly
                    .iter()
                    .find(|m| m.year == year && m.month == month)
                    .cloned()
                    .unwrap_or(MonthlyRevenue {
                        year,
                        month,
                        revenue: Price::ZERO,
                        orders: 0,
                    })
            })
            .collect();

        let avg_order_value = snapshot
            .total_revenue
            .average_over(u64::try_from(snapshot.total_orders).unwrap_or(0));

        Self {
            total_revenue: snapshot.total_revenue,
            total_orders: snapshot.total_orders,
            total_customers: snapshot.total_customers,
            total_products: snapshot.total_products,
            previous_revenue: snapshot.previous_revenue,
            previous_orders: snapshot.previous_orders,
            previous_customers: snapshot.previous_customers,
            previous_products: snapshot.previous_products,
            order_stats,
            today_stats: TodayStats {
                orders: snapshot.today_orders,
                revenue: snapshot.today_revenue,
            },
            stock_alerts: StockAlerts {
                low_stock: snapshot.low_stock,
                out_of_stock: snapshot.out_of_stock,
            },
            avg_order_value,
            monthly_revenue,
            top_products: snapshot.top_products,
            recent_activity: RecentActivity {
                orders: snapshot.recent_orders,
                products: snapshot.recent_products,
            },
            last_updated: windows.now,
        }
    }
}
