//! Customer repository: identities, profiles, saved addresses and wishlists.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{AddressId, CustomerId, Email, Price, ProductId};

use super::RepositoryError;
use crate::models::{
    Address, AddressFields, Customer, CustomerIdentity, CustomerListing, ProductSummary,
    ProfileChanges,
};

// =============================================================================
// Internal Row Types
// =============================================================================

const CUSTOMER_COLUMNS: &str =
    "id, external_id, email, name, phone_number, image_url, is_admin, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, label, full_name, phone_number, street_address, city, \
                               state, zip_code, is_default";

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    external_id: String,
    email: String,
    name: String,
    phone_number: String,
    image_url: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            external_id: row.external_id,
            email,
            name: row.name,
            phone_number: row.phone_number,
            image_url: row.image_url,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    label: String,
    full_name: String,
    phone_number: String,
    street_address: String,
    city: String,
    state: String,
    zip_code: String,
    is_default: bool,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            label: row.label,
            full_name: row.full_name,
            phone_number: row.phone_number,
            street_address: row.street_address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            is_default: row.is_default,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    customer_id: CustomerId,
    product_id: ProductId,
    name: String,
    price: Price,
    images: Vec<String>,
}

impl From<WishlistRow> for ProductSummary {
    fn from(row: WishlistRow) -> Self {
        Self {
            id: row.product_id,
            name: row.name,
            price: row.price,
            images: row.images,
        }
    }
}

/// Outcome of deleting a single customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerRemoval {
    Deleted,
    NotFound,
    /// Admin accounts are never deleted through the API.
    IsAdmin,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Identity & profile
    // =========================================================================

    /// Resolve the customer bound to an identity, creating it on first access.
    ///
    /// Later accesses refresh the email and admin flag from the token. Name
    /// and avatar are only filled in while blank so profile edits stick.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another identity already owns
    /// the email, or `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_identity(
        &self,
        identity: &CustomerIdentity,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            INSERT INTO customers (external_id, email, name, image_url, is_admin)
            VALUES ($1, $2, $3, COALESCE($4, ''), $5)
            ON CONFLICT (external_id) DO UPDATE SET
                email      = EXCLUDED.email,
                is_admin   = EXCLUDED.is_admin,
                name       = CASE WHEN customers.name = '' THEN EXCLUDED.name
                                  ELSE customers.name END,
                image_url  = CASE WHEN customers.image_url = '' THEN EXCLUDED.image_url
                                  ELSE customers.image_url END,
                updated_at = CASE
                    WHEN customers.email IS DISTINCT FROM EXCLUDED.email
                      OR customers.is_admin IS DISTINCT FROM EXCLUDED.is_admin
                    THEN NOW() ELSE customers.updated_at END
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(&identity.external_id)
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(identity.image_url.as_deref())
        .bind(identity.is_admin)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::on_unique_violation(
                e,
                "Email is already registered to another account",
            )
        })?;

        row.try_into()
    }

    /// Apply a profile change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer no longer exists.
    pub async fn update_profile(
        &self,
        id: CustomerId,
        changes: &ProfileChanges,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            UPDATE customers SET
                name         = COALESCE($2, name),
                phone_number = COALESCE($3, phone_number),
                image_url    = COALESCE($4, image_url),
                updated_at   = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(changes.name.as_deref())
        .bind(changes.phone_number.as_deref())
        .bind(changes.image_url.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Every non-admin customer, newest first, with their wishlist resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_customers(&self) -> Result<Vec<CustomerListing>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE NOT is_admin
            ORDER BY created_at DESC, id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut wishlists = self.wishlists_for(&ids).await?;

        rows.into_iter()
            .map(|row| -> Result<CustomerListing, RepositoryError> {
                let customer = Customer::try_from(row)?;
                let wish_list = wishlists.remove(&customer.id).unwrap_or_default();
                Ok(CustomerListing {
                    customer,
                    wish_list,
                })
            })
            .collect()
    }

    /// Delete a customer unless it is an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete(&self, id: CustomerId) -> Result<CustomerRemoval, RepositoryError> {
        let is_admin: Option<bool> =
            sqlx::query_scalar("SELECT is_admin FROM customers WHERE id = $1")
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        match is_admin {
            None => Ok(CustomerRemoval::NotFound),
            Some(true) => Ok(CustomerRemoval::IsAdmin),
            Some(false) => {
                let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND NOT is_admin")
                    .bind(id.as_i32())
                    .execute(self.pool)
                    .await?;
                Ok(if result.rows_affected() > 0 {
                    CustomerRemoval::Deleted
                } else {
                    CustomerRemoval::NotFound
                })
            }
        }
    }

    /// Delete every listed non-admin customer. Admins and unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn bulk_delete(&self, ids: &[CustomerId]) -> Result<u64, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(CustomerId::as_i32).collect();
        let result = sqlx::query("DELETE FROM customers WHERE id = ANY($1) AND NOT is_admin")
            .bind(&ids)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// A customer's saved addresses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn addresses(&self, customer_id: CustomerId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM customer_addresses WHERE customer_id = $1 ORDER BY id"
        ))
        .bind(customer_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One of the customer's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn address(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM customer_addresses WHERE customer_id = $1 AND id = $2"
        ))
        .bind(customer_id.as_i32())
        .bind(address_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Save a new address and return the full list.
    ///
    /// A default address clears the flag on the others in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add_address(
        &self,
        customer_id: CustomerId,
        fields: &AddressFields,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if fields.is_default {
            clear_default(&mut tx, customer_id).await?;
        }
        sqlx::query(
            r"
            INSERT INTO customer_addresses (customer_id, label, full_name, phone_number,
                                            street_address, city, state, zip_code, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(customer_id.as_i32())
        .bind(&fields.label)
        .bind(&fields.full_name)
        .bind(&fields.phone_number)
        .bind(&fields.street_address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip_code)
        .bind(fields.is_default)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.addresses(customer_id).await
    }

    /// Overwrite an address and return the full list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the customer's.
    pub async fn update_address(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
        fields: &AddressFields,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if fields.is_default {
            clear_default(&mut tx, customer_id).await?;
        }
        let result = sqlx::query(
            r"
            UPDATE customer_addresses SET
                label = $3, full_name = $4, phone_number = $5, street_address = $6,
                city = $7, state = $8, zip_code = $9, is_default = $10
            WHERE customer_id = $1 AND id = $2
            ",
        )
        .bind(customer_id.as_i32())
        .bind(address_id.as_i32())
        .bind(&fields.label)
        .bind(&fields.full_name)
        .bind(&fields.phone_number)
        .bind(&fields.street_address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip_code)
        .bind(fields.is_default)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the cleared default.
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        self.addresses(customer_id).await
    }

    /// Remove an address (a no-op if it does not exist) and return the full list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete_address(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> Result<Vec<Address>, RepositoryError> {
        sqlx::query("DELETE FROM customer_addresses WHERE customer_id = $1 AND id = $2")
            .bind(customer_id.as_i32())
            .bind(address_id.as_i32())
            .execute(self.pool)
            .await?;

        self.addresses(customer_id).await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// The customer's wishlist with products resolved, oldest addition first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn wishlist(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        Ok(self
            .wishlists_for(&[customer_id.as_i32()])
            .await?
            .remove(&customer_id)
            .unwrap_or_default())
    }

    /// Add a product. Returns `false` if it was already on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn add_to_wishlist(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO wishlist_items (customer_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (customer_id, product_id) DO NOTHING
            ",
        )
        .bind(customer_id.as_i32())
        .bind(product_id.as_i32())
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a product (a no-op if absent).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove_from_wishlist(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM wishlist_items WHERE customer_id = $1 AND product_id = $2")
            .bind(customer_id.as_i32())
            .bind(product_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }

    async fn wishlists_for(
        &self,
        customer_ids: &[i32],
    ) -> Result<HashMap<CustomerId, Vec<ProductSummary>>, RepositoryError> {
        if customer_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, WishlistRow>(
            r"
            SELECT w.customer_id, w.product_id, p.name, p.price, p.images
            FROM wishlist_items w
            JOIN products p ON p.id = w.product_id
            WHERE w.customer_id = ANY($1)
            ORDER BY w.customer_id, w.added_at, w.product_id
            ",
        )
        .bind(customer_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<CustomerId, Vec<ProductSummary>> = HashMap::new();
        for row in rows {
            grouped.entry(row.customer_id).or_default().push(row.into());
        }
        Ok(grouped)
    }
}

async fn clear_default(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    customer_id: CustomerId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE customer_addresses SET is_default = FALSE WHERE customer_id = $1 AND is_default",
    )
    .bind(customer_id.as_i32())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(external_id: &str, email: &str) -> CustomerIdentity {
        CustomerIdentity {
            external_id: external_id.to_owned(),
            email: Email::parse(email).unwrap(),
            name: external_id.trim_start_matches("idp|").to_owned(),
            image_url: None,
            is_admin: false,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_email_belongs_to_one_identity(pool: PgPool) {
        let repo = CustomerRepository::new(&pool);
        let alice = repo
            .upsert_identity(&identity("idp|alice", "alice@example.test"))
            .await
            .unwrap();
        let again = repo
            .upsert_identity(&identity("idp|alice", "alice@example.test"))
            .await
            .unwrap();
        assert_eq!(alice.id, again.id);

        let err = repo
            .upsert_identity(&identity("idp|mallory", "Alice@Example.test"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Conflict(ref msg) if msg == "Email is already registered to another account"
        ));

        repo.upsert_identity(&identity("idp|bob", "bob@example.test"))
            .await
            .unwrap();
        assert!(matches!(
            repo.upsert_identity(&identity("idp|bob", "alice@example.test"))
                .await,
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(repo.list_customers().await.unwrap().len(), 2);
    }
}
