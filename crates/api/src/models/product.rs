//! Catalog product models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{Price, PriceError, ProductId};

/// Maximum number of images a product may carry.
pub const MAX_PRODUCT_IMAGES: usize = 3;

/// Default page size for the public catalog.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub category: String,
    pub images: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The short form embedded in orders and wishlists.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            images: self.images.clone(),
        }
    }
}

/// Product data resolved onto order lines and wishlists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    /// Current catalog price. Order lines carry their own captured price.
    pub price: Price,
    pub images: Vec<String>,
}

/// Validation failure for product input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductInputError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("price cannot exceed {}", Price::MAX_STORED)]
    PriceTooLarge,
    #[error("price can have at most 2 decimal places")]
    PriceTooPrecise,
    #[error("stock cannot be negative")]
    NegativeStock,
    #[error("stock is too large")]
    StockOutOfRange,
    #[error("at least one image is required")]
    NoImages,
    #[error("a product can have at most {MAX_PRODUCT_IMAGES} images")]
    TooManyImages,
    #[error("image URL cannot be blank")]
    BlankImage,
}

/// Body of `POST /api/admin/products`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub is_active: Option<bool>,
}

/// A validated product ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub category: String,
    pub images: Vec<String>,
    pub is_active: bool,
}

impl CreateProductRequest {
    /// Check the request and build a [`NewProduct`].
    ///
    /// # Errors
    ///
    /// Returns the first problem found with the input.
    pub fn validate(self) -> Result<NewProduct, ProductInputError> {
        let name = required(self.name, "name")?;
        let description = required(self.description, "description")?;
        let price = self
            .price
            .ok_or(ProductInputError::MissingField("price"))
            .and_then(validate_price)?;
        let stock = self
            .stock
            .ok_or(ProductInputError::MissingField("stock"))
            .and_then(validate_stock)?;
        let category = required(self.category, "category")?;
        let images = validate_images(self.images)?;

        Ok(NewProduct {
            name,
            description,
            price,
            stock,
            category,
            images,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// Body of `PUT /api/admin/products/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// A validated partial product update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl UpdateProductRequest {
    /// Check every present field with the same rules as creation.
    ///
    /// # Errors
    ///
    /// Returns the first problem found with the input.
    pub fn validate(self) -> Result<ProductChanges, ProductInputError> {
        Ok(ProductChanges {
            name: self.name.map(|v| required(v, "name")).transpose()?,
            description: self
                .description
                .map(|v| required(v, "description"))
                .transpose()?,
            price: self.price.map(validate_price).transpose()?,
            stock: self.stock.map(validate_stock).transpose()?,
            category: self.category.map(|v| required(v, "category")).transpose()?,
            images: self.images.map(validate_images).transpose()?,
            is_active: self.is_active,
        })
    }
}

fn required(value: String, field: &'static str) -> Result<String, ProductInputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProductInputError::MissingField(field));
    }
    Ok(trimmed.to_owned())
}

fn validate_price(amount: Decimal) -> Result<Price, ProductInputError> {
    Price::stored(amount).map_err(|e| match e {
        PriceError::Negative(_) => ProductInputError::NegativePrice,
        PriceError::TooLarge(_) => ProductInputError::PriceTooLarge,
        PriceError::TooPrecise(_) => ProductInputError::PriceTooPrecise,
    })
}

fn validate_stock(stock: i64) -> Result<i32, ProductInputError> {
    if stock < 0 {
        return Err(ProductInputError::NegativeStock);
    }
    i32::try_from(stock).map_err(|_| ProductInputError::StockOutOfRange)
}

fn validate_images(images: Vec<String>) -> Result<Vec<String>, ProductInputError> {
    if images.is_empty() {
        return Err(ProductInputError::NoImages);
    }
    if images.len() > MAX_PRODUCT_IMAGES {
        return Err(ProductInputError::TooManyImages);
    }
    images
        .into_iter()
        .map(|url| {
            let url = url.trim().to_owned();
            if url.is_empty() {
                Err(ProductInputError::BlankImage)
            } else {
                Ok(url)
            }
        })
        .collect()
}

/// Query string of `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A catalog query with defaults applied and bounds enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl CatalogFilter {
    /// Rows to skip before this page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Number of pages needed for `total` matching products.
    #[must_use]
    pub const fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

impl From<CatalogQuery> for CatalogFilter {
    fn from(query: CatalogQuery) -> Self {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        Self {
            category: non_blank(query.category),
            search: non_blank(query.search),
            page: query.page.unwrap_or(1).max(1),
            limit: query
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// A page of the public catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total_pages: i64,
    pub current_page: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn create_request() -> CreateProductRequest {
        CreateProductRequest {
            name: " Enamel Mug ".to_owned(),
            description: "Holds coffee".to_owned(),
            price: Some(Decimal::new(1250, 2)),
            stock: Some(40),
            category: "Kitchen".to_owned(),
            images: vec!["https://cdn.example.test/mug.jpg".to_owned()],
            is_active: None,
        }
    }

    #[test]
    fn test_create_defaults_to_active_and_trims() {
        let product = create_request().validate().unwrap();
        assert_eq!(product.name, "Enamel Mug");
        assert!(product.is_active);
        assert_eq!(product.stock, 40);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let mut request = create_request();
        request.price = Some(Decimal::new(-1, 0));
        assert_eq!(request.validate(), Err(ProductInputError::NegativePrice));

        let mut request = create_request();
        request.stock = Some(-3);
        assert_eq!(request.validate(), Err(ProductInputError::NegativeStock));

        let mut request = create_request();
        request.images = Vec::new();
        assert_eq!(request.validate(), Err(ProductInputError::NoImages));

        let mut request = create_request();
        request.images = vec!["a".to_owned(), "b".to_owned(), "c".to_owned(), "d".to_owned()];
        assert_eq!(request.validate(), Err(ProductInputError::TooManyImages));

        let mut request = create_request();
        request.category = "  ".to_owned();
        assert_eq!(
            request.validate(),
            Err(ProductInputError::MissingField("category"))
        );
    }

    #[test]
    fn test_update_validates_only_present_fields() {
        let changes = UpdateProductRequest {
            stock: Some(0),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.stock, Some(0));
        assert_eq!(changes.name, None);

        let err = UpdateProductRequest {
            name: Some(String::new()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ProductInputError::MissingField("name"));
    }

    #[test]
    fn test_price_must_fit_the_price_column() {
        let mut request = create_request();
        request.price = Some(Decimal::new(10_000_000_000, 0));
        assert_eq!(request.validate(), Err(ProductInputError::PriceTooLarge));

        let mut request = create_request();
        request.price = Some(Decimal::new(999_999_999_999, 2));
        assert_eq!(request.validate().unwrap().price, Price::MAX_STORED);

        let err = UpdateProductRequest {
            price: Some(Decimal::new(19_999, 3)),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ProductInputError::PriceTooPrecise);
        assert_eq!(err.to_string(), "price can have at most 2 decimal places");
    }

    #[test]
    fn test_catalog_filter_bounds() {
        let filter = CatalogFilter::from(CatalogQuery {
            category: Some("  ".to_owned()),
            search: Some("mug".to_owned()),
            page: Some(0),
            limit: Some(1000),
        });
        assert_eq!(filter.category, None);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_PAGE_SIZE);
        assert_eq!(filter.offset(), 0);

        let filter = CatalogFilter::from(CatalogQuery::default());
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(filter.total_pages(0), 0);
        assert_eq!(filter.total_pages(10), 1);
        assert_eq!(filter.total_pages(11), 2);
    }
}
