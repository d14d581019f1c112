//! Order lifecycle: checkout, status transitions and tracking.
//!
//! The operations here are generic over [`OrderStore`] so they run the same
//! against `PostgreSQL` ([`crate::db::OrderRepository`]) and the in-memory
//! store used by the unit tests.
//!
//! # Checkout
//!
//! Lines are processed in request order. Each line takes its stock with one
//! conditional decrement (`stock >= quantity` on an active product), so two
//! concurrent checkouts can never oversell. Lines are *not* wrapped in a
//! shared transaction: when line 2 fails, line 1's decrement stays applied.
//!
//! The order total must fit a stored price. It is quoted from current prices
//! before any stock moves, and each decrement is also capped by the budget
//! left, in case a price changed in between.
//!
//! # Status timestamps
//!
//! A single-order transition stamps the target status only the first time
//! the order reaches it. A bulk transition overwrites the stamp with the
//! current time on every selected order.

#[cfg(test)]
mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{
    AddressError, CustomerId, InvalidStatus, OrderId, OrderStatus, Price, ProductId,
    StatusTimeline,
};

use crate::db::RepositoryError;
use crate::models::{
    CreateOrderRequest, NewOrder, OrderDetails, OrderLine, OrderState, OrderTracking,
};

/// Errors from the order lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The product does not exist or is not active.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// The product cannot cover the requested quantity.
    #[error("Insufficient stock for {name}")]
    InsufficientStock {
        name: String,
        requested: u32,
        available: i32,
    },

    /// No such order, or it belongs to someone else.
    #[error("Order not found")]
    OrderNotFound(OrderId),

    #[error("Invalid status")]
    InvalidStatus(#[from] InvalidStatus),

    /// Rejected by the declared transition table (strict mode only).
    #[error("Cannot move an order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("No order items provided")]
    EmptyOrder,

    #[error("Order IDs are required")]
    NoOrdersSelected,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    #[error("Invalid shipping address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("Order total cannot exceed {}", Price::MAX_STORED)]
    TotalTooLarge,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Whether single-order transitions consult the declared transition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any status may follow any other.
    #[default]
    Permissive,
    /// Only moves allowed by [`OrderStatus::can_transition_to`].
    Strict,
}

impl TransitionPolicy {
    fn check(self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if self == Self::Strict && !from.can_transition_to(to) {
            return Err(OrderError::IllegalTransition { from, to });
        }
        Ok(())
    }
}

/// Outcome of trying to take stock for one order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockTake {
    /// Stock was decremented; the line is charged `unit_price` per unit.
    Taken { unit_price: Price },
    /// The product is missing or inactive. Nothing changed.
    Unavailable,
    /// Not enough stock. Nothing changed.
    Insufficient { name: String, available: i32 },
    /// The line would cost more than the budget left. Nothing changed.
    OverBudget,
}

/// Persistence needed by the order lifecycle.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Current unit prices of the listed products that are active.
    async fn unit_prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Price>, RepositoryError>;

    /// Atomically decrement an active product's stock by `quantity` if it
    /// has at least that much and the line costs at most `budget`.
    async fn take_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
        budget: Price,
    ) -> Result<StockTake, RepositoryError>;

    async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError>;

    async fn order_state(&self, id: OrderId) -> Result<Option<OrderState>, RepositoryError>;

    async fn order_details(&self, id: OrderId) -> Result<Option<OrderDetails>, RepositoryError>;

    /// Persist a single order's status and its full timeline.
    async fn save_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        timeline: &StatusTimeline,
    ) -> Result<(), RepositoryError>;

    /// Set `status` on every listed order and overwrite its timestamp with
    /// `at`, in one statement. Returns the number of orders changed.
    async fn bulk_set_status(
        &self,
        ids: &[OrderId],
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
}

/// Place an order for `customer_id`.
///
/// # Errors
///
/// Input problems (`EmptyOrder`, `InvalidQuantity`, `InvalidAddress`) and a
/// quoted total above [`Price::MAX_STORED`] (`TotalTooLarge`) are reported
/// before any stock is touched. `ProductNotFound` and `InsufficientStock`
/// stop processing at the failing line; earlier lines keep their decrement.
#[instrument(skip(store, request), fields(lines = request.order_items.len()))]
pub async fn create_order<S: OrderStore + ?Sized>(
    store: &S,
    customer_id: CustomerId,
    request: CreateOrderRequest,
    now: DateTime<Utc>,
) -> Result<OrderDetails, OrderError> {
    if request.order_items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let requested = request
        .order_items
        .iter()
        .map(|item| {
            u32::try_from(item.quantity)
                .ok()
                .filter(|q| *q >= 1 && i32::try_from(*q).is_ok())
                .map(|q| (item.product_id, q))
                .ok_or(OrderError::InvalidQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let shipping_address = request.shipping_address.validated()?;

    // Unavailable products are left for take_stock to report in line order.
    let product_ids: Vec<ProductId> = requested.iter().map(|(id, _)| *id).collect();
    let quotes = store.unit_prices(&product_ids).await?;
    let quoted: Price = requested
        .iter()
        .filter_map(|(id, quantity)| quotes.get(id).map(|p| p.line_total(*quantity)))
        .sum();
    if quoted.storable().is_err() {
        tracing::warn!(quoted = %quoted, "Order total too large");
        return Err(OrderError::TotalTooLarge);
    }

    let mut items = Vec::with_capacity(requested.len());
    let mut running = Price::ZERO;
    for (product_id, quantity) in requested {
        let budget = Price::MAX_STORED.saturating_sub(running);
        match store.take_stock(product_id, quantity, budget).await? {
            StockTake::Taken { unit_price } => {
                let line = OrderLine {
                    product_id,
                    quantity,
                    price: unit_price,
                };
                running += line.total();
                items.push(line);
            }
            StockTake::Unavailable => {
                tracing::warn!(product_id = %product_id, "Order line references unavailable product");
                return Err(OrderError::ProductNotFound(product_id));
            }
            StockTake::Insufficient { name, available } => {
                tracing::warn!(
                    product_id = %product_id,
                    requested = quantity,
                    available,
                    "Insufficient stock"
                );
                return Err(OrderError::InsufficientStock {
                    name,
                    requested: quantity,
                    available,
                });
            }
            StockTake::OverBudget => {
                tracing::warn!(product_id = %product_id, "Price rose past the order total limit");
                return Err(OrderError::TotalTooLarge);
            }
        }
    }

    let total_price = running;
    let order = NewOrder {
        customer_id,
        items,
        shipping_address,
        total_price,
        placed_at: now,
    };
    let order_id = store.insert_order(&order).await?;
    tracing::info!(order_id = %order_id, total = %total_price, "Order placed");

    store
        .order_details(order_id)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))
}

/// Move one order to `status`, stamping it only if the order never reached it.
///
/// # Errors
///
/// `InvalidStatus` for an unknown value (checked first, nothing changes),
/// `OrderNotFound`, and `IllegalTransition` under [`TransitionPolicy::Strict`].
#[instrument(skip(store))]
pub async fn update_status<S: OrderStore + ?Sized>(
    store: &S,
    order_id: OrderId,
    status: &str,
    policy: TransitionPolicy,
    now: DateTime<Utc>,
) -> Result<OrderDetails, OrderError> {
    let target: OrderStatus = status.parse()?;

    let OrderState {
        status: current,
        mut timeline,
        ..
    } = store
        .order_state(order_id)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))?;

    policy.check(current, target)?;

    let stamped = timeline.record_first(target, now);
    store.save_status(order_id, target, &timeline).await?;
    tracing::info!(order_id = %order_id, from = %current, to = %target, stamped, "Order status updated");

    store
        .order_details(order_id)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))
}

/// Move every listed order to `status`, overwriting that status's timestamp.
///
/// Ids that match no order are ignored. Returns the number of orders changed.
///
/// # Errors
///
/// `NoOrdersSelected` for an empty list and `InvalidStatus` for an unknown
/// value; in both cases nothing changes.
#[instrument(skip(store, order_ids), fields(count = order_ids.len()))]
pub async fn bulk_update_status<S: OrderStore + ?Sized>(
    store: &S,
    order_ids: &[OrderId],
    status: &str,
    now: DateTime<Utc>,
) -> Result<u64, OrderError> {
    if order_ids.is_empty() {
        return Err(OrderError::NoOrdersSelected);
    }
    let target: OrderStatus = status.parse()?;

    let updated = store.bulk_set_status(order_ids, target, now).await?;
    tracing::info!(status = %target, updated, "Bulk order status update");
    Ok(updated)
}

/// Fetch an order that belongs to `customer_id`.
///
/// # Errors
///
/// `OrderNotFound` when the order is missing or owned by someone else.
pub async fn customer_order<S: OrderStore + ?Sized>(
    store: &S,
    order_id: OrderId,
    customer_id: CustomerId,
) -> Result<OrderDetails, OrderError> {
    store
        .order_details(order_id)
        .await?
        .filter(|order| {
            order
                .customer
                .as_ref()
                .is_some_and(|owner| owner.id == customer_id)
        })
        .ok_or(OrderError::OrderNotFound(order_id))
}

/// Tracking projection of a customer's own order.
///
/// # Errors
///
/// `OrderNotFound` when the order is missing or owned by someone else.
#[instrument(skip(store))]
pub async fn track_order<S: OrderStore + ?Sized>(
    store: &S,
    order_id: OrderId,
    customer_id: CustomerId,
) -> Result<OrderTracking, OrderError> {
    customer_order(store, order_id, customer_id)
        .await
        .map(OrderTracking::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    use bazaar_core::ShippingAddress;

    use super::memory::MemoryStore;
    use super::*;
    use crate::models::OrderItemRequest;

    const ALICE: CustomerId = CustomerId::new(1);
    const BOB: CustomerId = CustomerId::new(2);
    const MUG: ProductId = ProductId::new(10);
    const LAMP: ProductId = ProductId::new(20);
    const HIDDEN: ProductId = ProductId::new(30);
    const YACHT: ProductId = ProductId::new(40);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap()
    }

    fn price(units: i64) -> Price {
        Price::new(Decimal::new(units, 0)).unwrap()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::default();
        store.add_customer(ALICE, "Alice", "alice@example.test");
        store.add_customer(BOB, "Bob", "bob@example.test");
        store.add_product(MUG, "Mug", price(12), 10, true);
        store.add_product(LAMP, "Lamp", price(40), 2, true);
        store.add_product(HIDDEN, "Prototype", price(99), 50, false);
        store.add_product(YACHT, "Yacht", price(6_000_000_000), 5, true);
        store
    }

    /// Hands out quotes taken before a catalog price change landed.
    struct StaleQuotes {
        store: MemoryStore,
        quotes: HashMap<ProductId, Price>,
    }

    #[async_trait]
    impl OrderStore for StaleQuotes {
        async fn unit_prices(
            &self,
            _ids: &[ProductId],
        ) -> Result<HashMap<ProductId, Price>, RepositoryError> {
            Ok(self.quotes.clone())
        }

        async fn take_stock(
            &self,
            product_id: ProductId,
            quantity: u32,
            budget: Price,
        ) -> Result<StockTake, RepositoryError> {
            self.store.take_stock(product_id, quantity, budget).await
        }

        async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
            self.store.insert_order(order).await
        }

        async fn order_state(&self, id: OrderId) -> Result<Option<OrderState>, RepositoryError> {
            self.store.order_state(id).await
        }

        async fn order_details(
            &self,
            id: OrderId,
        ) -> Result<Option<OrderDetails>, RepositoryError> {
            self.store.order_details(id).await
        }

        async fn save_status(
            &self,
            id: OrderId,
            status: OrderStatus,
            timeline: &StatusTimeline,
        ) -> Result<(), RepositoryError> {
            self.store.save_status(id, status, timeline).await
        }

        async fn bulk_set_status(
            &self,
            ids: &[OrderId],
            status: OrderStatus,
            at: DateTime<Utc>,
        ) -> Result<u64, RepositoryError> {
            self.store.bulk_set_status(ids, status, at).await
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Alice Liddell".to_owned(),
            street_address: "7 Rabbit Hole".to_owned(),
            city: "Oxford".to_owned(),
            state: "OXF".to_owned(),
            zip_code: "OX1".to_owned(),
            phone_number: "555-0199".to_owned(),
        }
    }

    fn request(lines: &[(ProductId, i64)]) -> CreateOrderRequest {
        CreateOrderRequest {
            order_items: lines
                .iter()
                .map(|&(product_id, quantity)| OrderItemRequest {
                    product_id,
                    quantity,
                })
                .collect(),
            shipping_address: address(),
        }
    }

    #[tokio::test]
    async fn test_create_order_totals_and_decrements() {
        let store = store();

        let order = create_order(&store, ALICE, request(&[(MUG, 3), (LAMP, 2)]), t0())
            .await
            .unwrap();

        assert_eq!(order.total_price, price(3 * 12 + 2 * 40));
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.status_timeline.get(OrderStatus::Placed), Some(t0()));
        assert_eq!(order.status_timeline.len(), 1);
        assert_eq!(order.customer.unwrap().name, "Alice");
        assert_eq!(store.stock(MUG), 7);
        assert_eq!(store.stock(LAMP), 0);
    }

    #[tokio::test]
    async fn test_captured_price_survives_catalog_change() {
        let store = store();
        let order = create_order(&store, ALICE, request(&[(MUG, 1)]), t0())
            .await
            .unwrap();

        store.set_price(MUG, price(15));

        let order = customer_order(&store, order.id, ALICE).await.unwrap();
        assert_eq!(order.order_items[0].price, price(12));
        assert_eq!(order.total_price, price(12));
    }

    #[tokio::test]
    async fn test_insufficient_stock_keeps_earlier_decrements() {
        let store = store();

        let err = create_order(&store, ALICE, request(&[(MUG, 4), (LAMP, 3)]), t0())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::InsufficientStock { ref name, requested: 3, available: 2 } if name == "Lamp"
        ));
        assert_eq!(err.to_string(), "Insufficient stock for Lamp");
        assert_eq!(store.stock(MUG), 6);
        assert_eq!(store.stock(LAMP), 2);
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_or_inactive_product_is_not_found() {
        let store = store();

        let err = create_order(&store, ALICE, request(&[(HIDDEN, 1)]), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ProductNotFound(id) if id == HIDDEN));
        assert_eq!(store.stock(HIDDEN), 50);

        let err = create_order(&store, ALICE, request(&[(ProductId::new(999), 1)]), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_total_too_large_touches_no_stock() {
        let store = store();

        let err = create_order(&store, ALICE, request(&[(MUG, 1), (YACHT, 2)]), t0())
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::TotalTooLarge));
        assert_eq!(err.to_string(), "Order total cannot exceed 9999999999.99");
        assert_eq!(store.stock(MUG), 10);
        assert_eq!(store.stock(YACHT), 5);
        assert_eq!(store.order_count(), 0);

        let order = create_order(&store, ALICE, request(&[(MUG, 1), (YACHT, 1)]), t0())
            .await
            .unwrap();
        assert_eq!(order.total_price, price(6_000_000_012));
    }

    #[tokio::test]
    async fn test_price_raised_after_quote_is_capped_at_take() {
        let quotes = HashMap::from([(MUG, price(12)), (YACHT, price(1))]);
        let store = StaleQuotes {
            store: store(),
            quotes,
        };

        let err = create_order(&store, ALICE, request(&[(MUG, 1), (YACHT, 2)]), t0())
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::TotalTooLarge));
        assert_eq!(store.store.stock(MUG), 9);
        assert_eq!(store.store.stock(YACHT), 5);
        assert_eq!(store.store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_input_touches_no_stock() {
        let store = store();

        let err = create_order(&store, ALICE, request(&[]), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::EmptyOrder));

        let err = create_order(&store, ALICE, request(&[(MUG, 2), (LAMP, 0)]), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity { quantity: 0, .. }));

        let mut blank_address = request(&[(MUG, 2)]);
        blank_address.shipping_address.phone_number = " ".to_owned();
        let err = create_order(&store, ALICE, blank_address, t0())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidAddress(_)));

        assert_eq!(store.stock(MUG), 10);
    }

    #[tokio::test]
    async fn test_single_transition_stamps_once() {
        let store = store();
        let order = create_order(&store, ALICE, request(&[(MUG, 1)]), t0())
            .await
            .unwrap();
        let first = t0() + Duration::hours(1);
        let second = t0() + Duration::hours(5);

        let updated = update_status(&store, order.id, "shipped", TransitionPolicy::Permissive, first)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);
        assert_eq!(updated.status_timeline.get(OrderStatus::Shipped), Some(first));

        let updated =
            update_status(&store, order.id, "shipped", TransitionPolicy::Permissive, second)
                .await
                .unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);
        assert_eq!(updated.status_timeline.get(OrderStatus::Shipped), Some(first));
        assert_eq!(updated.status_timeline.get(OrderStatus::Placed), Some(t0()));
    }

    #[tokio::test]
    async fn test_permissive_allows_backward_moves() {
        let store = store();
        let order = create_order(&store, ALICE, request(&[(MUG, 1)]), t0())
            .await
            .unwrap();

        update_status(&store, order.id, "delivered", TransitionPolicy::Permissive, t0())
            .await
            .unwrap();
        let back = update_status(&store, order.id, "pending", TransitionPolicy::Permissive, t0())
            .await
            .unwrap();

        assert_eq!(back.status, OrderStatus::Pending);
        assert_eq!(back.status_timeline.get(OrderStatus::Delivered), Some(t0()));
    }

    #[tokio::test]
    async fn test_strict_policy_enforces_table() {
        let store = store();
        let order = create_order(&store, ALICE, request(&[(MUG, 1)]), t0())
            .await
            .unwrap();

        update_status(&store, order.id, "delivered", TransitionPolicy::Strict, t0())
            .await
            .unwrap();
        let err = update_status(&store, order.id, "pending", TransitionPolicy::Strict, t0())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::IllegalTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending
            }
        ));

        update_status(&store, order.id, "delivered", TransitionPolicy::Strict, t0())
            .await
            .unwrap();
        assert_eq!(store.status(order.id), OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn test_invalid_status_mutates_nothing() {
        let store = store();
        let order = create_order(&store, ALICE, request(&[(MUG, 1)]), t0())
            .await
            .unwrap();

        let err = update_status(&store, order.id, "lost", TransitionPolicy::Permissive, t0())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidStatus(_)));
        assert!(matches!(err, OrderError::InvalidStatus(InvalidStatus(ref value)) if value == "lost"));

        let err = bulk_update_status(&store, &[order.id], "Shipped", t0())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidStatus(_)));

        let unchanged = store.state(order.id);
        assert_eq!(unchanged.status, OrderStatus::Placed);
        assert_eq!(unchanged.timeline.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_status_checked_before_existence() {
        let store = store();
        let err = update_status(
            &store,
            OrderId::new(404),
            "teleported",
            TransitionPolicy::Permissive,
            t0(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OrderError::InvalidStatus(_)));

        let err = update_status(
            &store,
            OrderId::new(404),
            "shipped",
            TransitionPolicy::Permissive,
            t0(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_bulk_transition_overwrites_timestamps() {
        let store = store();
        let a = create_order(&store, ALICE, request(&[(MUG, 1)]), t0())
            .await
            .unwrap();
        let b = create_order(&store, BOB, request(&[(MUG, 1)]), t0())
            .await
            .unwrap();
        let early = t0() + Duration::hours(1);
        let late = t0() + Duration::days(2);

        update_status(&store, a.id, "shipped", TransitionPolicy::Permissive, early)
            .await
            .unwrap();

        let updated = bulk_update_status(&store, &[a.id, b.id, OrderId::new(777)], "shipped", late)
            .await
            .unwrap();

        assert_eq!(updated, 2);
        for id in [a.id, b.id] {
            let state = store.state(id);
            assert_eq!(state.status, OrderStatus::Shipped);
            assert_eq!(state.timeline.get(OrderStatus::Shipped), Some(late));
        }
    }

    #[tokio::test]
    async fn test_bulk_requires_ids() {
        let store = store();
        let err = bulk_update_status(&store, &[], "shipped", t0())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NoOrdersSelected));
    }

    #[tokio::test]
    async fn test_tracking_only_for_owner_and_only_reached_statuses() {
        let store = store();
        let order = create_order(&store, ALICE, request(&[(LAMP, 1)]), t0())
            .await
            .unwrap();
        update_status(
            &store,
            order.id,
            "processing",
            TransitionPolicy::Permissive,
            t0() + Duration::minutes(30),
        )
        .await
        .unwrap();

        let err = track_order(&store, order.id, BOB).await.unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));

        let tracking = track_order(&store, order.id, ALICE).await.unwrap();
        assert_eq!(tracking.status, OrderStatus::Processing);
        assert_eq!(tracking.order_date, t0());
        assert!(tracking.timeline[&OrderStatus::Placed].is_some());
        assert!(tracking.timeline[&OrderStatus::Processing].is_some());
        for status in [
            OrderStatus::Pending,
            OrderStatus::Shipped,
            OrderStatus::InTransit,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(tracking.timeline[&status], None);
        }
        assert_eq!(tracking.items[0].name.as_deref(), Some("Lamp"));
    }

    #[tokio::test]
    async fn test_checkout_ship_then_oversell_scenario() {
        let store = MemoryStore::default();
        store.add_customer(ALICE, "Alice", "alice@example.test");
        let widget = ProductId::new(1);
        store.add_product(widget, "Widget", price(1000), 5, true);

        let order = create_order(&store, ALICE, request(&[(widget, 3)]), t0())
            .await
            .unwrap();
        assert_eq!(order.total_price, price(3000));
        assert_eq!(store.stock(widget), 2);

        let shipped_at = t0() + Duration::hours(3);
        let shipped = update_status(
            &store,
            order.id,
            "shipped",
            TransitionPolicy::Permissive,
            shipped_at,
        )
        .await
        .unwrap();
        assert_eq!(shipped.status_timeline.get(OrderStatus::Shipped), Some(shipped_at));
        assert_eq!(shipped.status_timeline.get(OrderStatus::Placed), Some(t0()));

        let err = create_order(&store, ALICE, request(&[(widget, 3)]), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { .. }));
        assert_eq!(store.stock(widget), 2);
    }
}
