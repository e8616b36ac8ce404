use sqlx::SqliteConnection;

use crate::{
    db_types::{Product, ProductId},
    traits::StoreError,
};

pub async fn fetch_product(product_id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, StoreError> {
    let product = sqlx::query_as("SELECT product_id, name, unit_price FROM products WHERE product_id = $1")
        .bind(product_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

/// Inserts or replaces a catalog record. Catalog maintenance belongs to the surrounding system; this exists for
/// seeding and tests.
pub async fn upsert_product(product: &Product, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    sqlx::query(
        r#"
            INSERT INTO products (product_id, name, unit_price) VALUES ($1, $2, $3)
            ON CONFLICT (product_id) DO UPDATE SET name = excluded.name, unit_price = excluded.unit_price;
        "#,
    )
    .bind(product.product_id.as_str())
    .bind(&product.name)
    .bind(product.unit_price.value())
    .execute(conn)
    .await?;
    Ok(())
}
