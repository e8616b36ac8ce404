use crate::{
    db_types::{Product, ProductId},
    traits::StoreError,
};

/// Read-only view of the product catalog. The price calculator resolves every line item against this trait so
/// that totals are always derived from authoritative prices, never from client-supplied figures.
#[allow(async_fn_in_trait)]
pub trait ProductCatalog {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, StoreError>;
}
