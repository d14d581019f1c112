//! Domain models for the API.
//!
//! Request bodies validate themselves into the types the repositories
//! accept; response types serialize with camelCase keys.

pub mod customer;
pub mod order;
pub mod product;
pub mod stats;

pub use customer::{
    Address, AddressFields, AddressRequest, Customer, CustomerIdentity, CustomerInputError,
    CustomerListing, CustomerSummary, ProfileChanges, UpdateProfileRequest,
};
pub use order::{
    BulkStatusRequest, CreateOrderRequest, NewOrder, OrderDetails, OrderItemRequest,
    OrderItemView, OrderLine, OrderState, OrderTracking, TrackedItem, UpdateStatusRequest,
};
pub use product::{
    CatalogFilter, CatalogQuery, CreateProductRequest, NewProduct, Product, ProductChanges,
    ProductInputError, ProductPage, ProductSummary, UpdateProductRequest,
};
pub use stats::{DashboardStats, DashboardWindows, StatsSnapshot};
