//! Customer self-service routes: profile, saved addresses and wishlist.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bazaar_core::{AddressId, CustomerId, Email, ProductId};

use crate::db::{CustomerRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, ApiPath, RequireCustomer};
use crate::models::{Address, AddressRequest, Customer, ProductSummary, UpdateProfileRequest};
use crate::state::AppState;

// =============================================================================
// Profile
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: CustomerId,
    pub name: String,
    pub email: Email,
    pub phone_number: String,
    pub image_url: String,
    pub external_id: String,
}

impl From<Customer> for ProfileResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            phone_number: customer.phone_number,
            image_url: customer.image_url,
            external_id: customer.external_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: &'static str,
    pub user: Customer,
}

/// The caller's profile.
///
/// GET /api/users/profile
pub async fn profile(RequireCustomer(customer): RequireCustomer) -> Json<ProfileResponse> {
    Json(customer.into())
}

/// Update name, phone number or avatar.
///
/// PUT /api/users/profile
///
/// # Errors
///
/// 400 for a blank name.
#[instrument(skip(state, customer, request), fields(customer_id = %customer.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ProfileUpdatedResponse>> {
    let changes = request.validate()?;
    let user = CustomerRepository::new(state.pool())
        .update_profile(customer.id, &changes)
        .await?;

    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated successfully",
        user,
    }))
}

// =============================================================================
// Addresses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct AddressListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub addresses: Vec<Address>,
}

impl AddressListResponse {
    const fn with_message(message: &'static str, addresses: Vec<Address>) -> Self {
        Self {
            message: Some(message),
            addresses,
        }
    }
}

/// The caller's saved addresses.
///
/// GET /api/users/addresses
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Json<AddressListResponse>> {
    let addresses = CustomerRepository::new(state.pool())
        .addresses(customer.id)
        .await?;
    Ok(Json(AddressListResponse {
        message: None,
        addresses,
    }))
}

/// Save a new address.
///
/// POST /api/users/addresses
///
/// # Errors
///
/// 400 when any field is blank.
#[instrument(skip(state, customer, request), fields(customer_id = %customer.id))]
pub async fn add_address(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiJson(request): ApiJson<AddressRequest>,
) -> Result<(StatusCode, Json<AddressListResponse>)> {
    let fields = request.into_new()?;
    let addresses = CustomerRepository::new(state.pool())
        .add_address(customer.id, &fields)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AddressListResponse::with_message(
            "Address added successfully",
            addresses,
        )),
    ))
}

/// Update a saved address. Blank fields keep their stored value.
///
/// PUT /api/users/addresses/{address_id}
///
/// # Errors
///
/// 404 when the address is not the caller's.
#[instrument(skip(state, customer, request), fields(customer_id = %customer.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiPath(address_id): ApiPath<AddressId>,
    ApiJson(request): ApiJson<AddressRequest>,
) -> Result<Json<AddressListResponse>> {
    let repo = CustomerRepository::new(state.pool());
    let current = repo
        .address(customer.id, address_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Address not found".to_string()))?;

    let addresses = repo
        .update_address(customer.id, address_id, &request.apply_to(&current))
        .await?;

    Ok(Json(AddressListResponse::with_message(
        "Address updated successfully",
        addresses,
    )))
}

/// Remove a saved address.
///
/// DELETE /api/users/addresses/{address_id}
///
/// # Errors
///
/// Returns `AppError::Database` if the delete fails.
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiPath(address_id): ApiPath<AddressId>,
) -> Result<Json<AddressListResponse>> {
    let addresses = CustomerRepository::new(state.pool())
        .delete_address(customer.id, address_id)
        .await?;

    Ok(Json(AddressListResponse::with_message(
        "Address deleted successfully",
        addresses,
    )))
}

// =============================================================================
// Wishlist
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub wish_list: Vec<ProductSummary>,
}

/// The caller's wishlist.
///
/// GET /api/users/wishlist
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn wishlist(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Json<WishlistResponse>> {
    let wish_list = CustomerRepository::new(state.pool())
        .wishlist(customer.id)
        .await?;
    Ok(Json(WishlistResponse {
        message: None,
        wish_list,
    }))
}

/// Add a product to the wishlist.
///
/// POST /api/users/wishlist
///
/// # Errors
///
/// 404 for an unknown product, 400 if it is already on the wishlist.
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiJson(request): ApiJson<WishlistRequest>,
) -> Result<Json<WishlistResponse>> {
    if !ProductRepository::new(state.pool())
        .exists(request.product_id)
        .await?
    {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    let repo = CustomerRepository::new(state.pool());
    if !repo.add_to_wishlist(customer.id, request.product_id).await? {
        return Err(AppError::Validation(
            "Product already in wishlist".to_string(),
        ));
    }

    Ok(Json(WishlistResponse {
        message: Some("Product added to wishlist"),
        wish_list: repo.wishlist(customer.id).await?,
    }))
}

/// Remove a product from the wishlist.
///
/// DELETE /api/users/wishlist/{product_id}
///
/// # Errors
///
/// Returns `AppError::Database` if the delete fails.
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<WishlistResponse>> {
    let repo = CustomerRepository::new(state.pool());
    repo.remove_from_wishlist(customer.id, product_id).await?;

    Ok(Json(WishlistResponse {
        message: Some("Product removed from wishlist"),
        wish_list: repo.wishlist(customer.id).await?,
    }))
}
