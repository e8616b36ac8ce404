//! `SqliteDatabase` is a concrete implementation of a checkout payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use sqlx::SqlitePool;

use super::db::{carts, new_pool, orders, products};
use crate::{
    db_types::{LineItem, NewOrder, Order, OrderId, OwnerId, Product, ProductId},
    order_objects::OrderQueryFilter,
    traits::{CartManagement, DeleteOutcome, OrderStore, ProductCatalog, StoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Seeds or updates a catalog record. Catalog maintenance is owned by the surrounding system; the engine
    /// only ever reads prices.
    pub async fn upsert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        products::upsert_product(product, &mut conn).await
    }

    /// Puts an entry in an owner's cart. Exists for seeding and tests; the engine itself only clears carts.
    pub async fn set_cart_item(&self, owner_id: &OwnerId, product_id: &ProductId, quantity: i64) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        carts::set_cart_item(owner_id, product_id, quantity, &mut conn).await
    }

    pub async fn cart_items(&self, owner_id: &OwnerId) -> Result<Vec<LineItem>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        carts::cart_items_for_owner(owner_id, &mut conn).await
    }
}

impl OrderStore for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(query, &mut conn).await
    }

    async fn mark_paid_once(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::mark_paid_once(order_id, &mut conn).await
    }

    async fn delete_unpaid_order(&self, order_id: &OrderId) -> Result<DeleteOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;
        let outcome = orders::delete_unpaid_order(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(outcome)
    }
}

impl ProductCatalog for SqliteDatabase {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(product_id, &mut conn).await
    }
}

impl CartManagement for SqliteDatabase {
    async fn clear_cart(&self, owner_id: &OwnerId) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        carts::clear_cart(owner_id, &mut conn).await
    }
}
