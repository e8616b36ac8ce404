use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{LineItem, NewOrder, Order, OrderId, PaymentState},
    order_objects::OrderQueryFilter,
    traits::{DeleteOutcome, StoreError},
};

/// The single authoritative visibility rule, as SQL. Every listing surfaced to a purchaser or to fulfilment
/// staff goes through [`search_orders`] with `visible_only` set, and therefore through this exact predicate.
const VISIBLE_PREDICATE: &str = "(payment_type = 'CashOnDelivery' OR payment_state = 'Paid')";

/// Inserts a new order and its line items using the given connection. This is not atomic on its own. You can
/// embed this call inside a transaction if you need atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let mut inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                owner_id,
                address_id,
                amount,
                payment_type,
                payment_state,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.owner_id)
    .bind(order.address_id)
    .bind(order.amount.value())
    .bind(order.payment_type)
    .bind(PaymentState::Unpaid)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await?;
    for (position, item) in order.items.iter().enumerate() {
        sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, position) VALUES ($1, $2, $3, $4)")
            .bind(inserted.order_id.as_str())
            .bind(item.product_id.as_str())
            .bind(item.quantity)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
    }
    inserted.items = order.items;
    debug!("📝️ Order {} inserted with id {}", inserted.order_id, inserted.id);
    Ok(inserted)
}

/// Returns the order with the given `order_id`, with its line items attached.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    match order {
        Some(mut order) => {
            order.items = fetch_order_items(&order.order_id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, StoreError> {
    let items =
        sqlx::query_as("SELECT product_id, quantity FROM order_items WHERE order_id = $1 ORDER BY position ASC")
            .bind(order_id.as_str())
            .fetch_all(conn)
            .await?;
    Ok(items)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in descending order (newest first).
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, StoreError> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(owner_id) = query.owner_id {
        where_clause.push("owner_id = ");
        where_clause.push_bind_unseparated(owner_id.0);
    }
    if let Some(payment_type) = query.payment_type {
        where_clause.push("payment_type = ");
        where_clause.push_bind_unseparated(payment_type.to_string());
    }
    if let Some(payment_state) = query.payment_state {
        where_clause.push("payment_state = ");
        where_clause.push_bind_unseparated(payment_state.to_string());
    }
    if query.visible_only {
        where_clause.push(VISIBLE_PREDICATE);
    }
    builder.push(" ORDER BY created_at DESC");

    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(&mut *conn).await?;
    trace!("📝️ Result of search_orders: {:?}", orders.len());
    let mut result = Vec::with_capacity(orders.len());
    for mut order in orders {
        order.items = fetch_order_items(&order.order_id, &mut *conn).await?;
        result.push(order);
    }
    Ok(result)
}

/// Transitions the given online order from `Unpaid` to `Paid` in a single conditional statement.
///
/// The `WHERE` clause is the idempotency guard: a replayed success notification matches zero rows and returns
/// `None` instead of applying a second transition.
pub(crate) async fn mark_paid_once(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let updated: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_state = 'Paid', updated_at = CURRENT_TIMESTAMP WHERE order_id = $1 AND \
         payment_type = 'Online' AND payment_state = 'Unpaid' RETURNING *",
    )
    .bind(order_id.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(mut order) => {
            order.items = fetch_order_items(&order.order_id, conn).await?;
            debug!("📝️ Order {} transitioned to Paid", order.order_id);
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// Deletes the given online order iff it is still `Unpaid`, reporting what actually happened so callers can log
/// replays and illegal transitions accurately. Paid orders are never deleted by this path.
pub(crate) async fn delete_unpaid_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<DeleteOutcome, StoreError> {
    let result = sqlx::query(
        "DELETE FROM orders WHERE order_id = $1 AND payment_type = 'Online' AND payment_state = 'Unpaid'",
    )
    .bind(order_id.as_str())
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() > 0 {
        sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id.as_str()).execute(&mut *conn).await?;
        debug!("📝️ Order {order_id} deleted after failed payment");
        return Ok(DeleteOutcome::Deleted);
    }
    let existing: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    match existing {
        Some(order) if order.payment_state == PaymentState::Paid => Ok(DeleteOutcome::AlreadyPaid),
        _ => Ok(DeleteOutcome::NotFound),
    }
}
