//! Demo catalog seeding.
//!
//! Products are read from `seed/products.json` (embedded at build time) and
//! checked with the same validation the admin API applies.

use bazaar_api::db::{self, ProductRepository};
use bazaar_api::models::{CreateProductRequest, NewProduct};

use super::{CommandError, database_url};

const DEMO_PRODUCTS: &str = include_str!("../../seed/products.json");

fn demo_catalog() -> Result<Vec<NewProduct>, CommandError> {
    let requests: Vec<CreateProductRequest> =
        serde_json::from_str(DEMO_PRODUCTS).map_err(|e| CommandError::Seed(e.to_string()))?;

    requests
        .into_iter()
        .map(|request| {
            let name = request.name.clone();
            request
                .validate()
                .map_err(|e| CommandError::Seed(format!("{name}: {e}")))
        })
        .collect()
}

/// Insert the demo catalog.
///
/// Does nothing when the catalog already has products, unless `force` is set.
///
/// # Errors
///
/// Returns an error if the seed data is invalid or an insert fails.
pub async fn products(force: bool) -> Result<usize, CommandError> {
    let catalog = demo_catalog()?;
    let pool = db::create_pool(&database_url()?).await?;
    let repo = ProductRepository::new(&pool);

    if !force && !repo.list_all().await?.is_empty() {
        tracing::warn!("Catalog is not empty, skipping seed (use --force to insert anyway)");
        return Ok(0);
    }

    for product in &catalog {
        let created = repo.create(product).await?;
        tracing::info!(product_id = %created.id, name = %created.name, "Seeded product");
    }

    tracing::info!(count = catalog.len(), "Seeding complete!");
    Ok(catalog.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalog_is_valid() {
        let catalog = demo_catalog().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.iter().all(|p| (1..=3).contains(&p.images.len())));
    }
}
