use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{LineItem, OwnerId, ProductId},
    traits::StoreError,
};

/// Empties the cart for the given owner. Returns the number of entries removed; clearing an empty cart is a
/// no-op, which is what makes the payment-success cart clear safe under redelivered notifications.
pub async fn clear_cart(owner_id: &OwnerId, conn: &mut SqliteConnection) -> Result<u64, StoreError> {
    let result =
        sqlx::query("DELETE FROM cart_items WHERE owner_id = $1").bind(owner_id.as_str()).execute(conn).await?;
    let cleared = result.rows_affected();
    debug!("📝️ Cleared {cleared} cart entries for {owner_id}");
    Ok(cleared)
}

pub async fn set_cart_item(
    owner_id: &OwnerId,
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (owner_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (owner_id, product_id) DO UPDATE SET quantity = excluded.quantity;
        "#,
    )
    .bind(owner_id.as_str())
    .bind(product_id.as_str())
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn cart_items_for_owner(owner_id: &OwnerId, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, StoreError> {
    let items = sqlx::query_as("SELECT product_id, quantity FROM cart_items WHERE owner_id = $1 ORDER BY product_id")
        .bind(owner_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}
