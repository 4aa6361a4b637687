//! Orders: history, placement and withdrawal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::{info, instrument};
use uuid::Uuid;

use record_store_core::{OrderId, OrderState, PaymentId, ProductId, ProfileId, ShippingId, ZipCode};

use super::{PgStore, ProductRow, ProfileRow, product_columns, product_joins, profile_columns};
use crate::db::RepositoryError;
use crate::db::repository::{DeleteOutcome, OrderRepository, PlaceOrderError};
use crate::models::{NamedRef, NewOrder, OrderDetail, OrderLine, OrderSummary, Profile};

/// Order header with its live total. Prices are read at query time, so a
/// repriced product changes the total of existing orders.
macro_rules! order_select {
    ($where:literal) => {
        concat!(
            r"
            SELECT o.id, o.code, o.address, o.zip_code, o.city, o.phone, o.state,
                   o.created_at,
                   s.name AS shipping_name, s.slug AS shipping_slug,
                   pm.name AS payment_name, pm.slug AS payment_slug,
                   s.price + COALESCE((
                       SELECT SUM(p.price * i.quantity)
                       FROM order_item i
                       JOIN product p ON p.id = i.product_id
                       WHERE i.order_id = o.id
                   ), 0) AS total_price,
            ",
            profile_columns!(),
            r"
            FROM customer_order o
            JOIN shipping s ON s.id = o.shipping_id
            JOIN payment pm ON pm.id = o.payment_id
            JOIN user_profile up ON up.id = o.profile_id
            JOIN account ac ON ac.id = up.account_id
            ",
            $where
        )
    };
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    code: Uuid,
    address: String,
    zip_code: String,
    city: String,
    phone: Option<String>,
    state: OrderState,
    created_at: DateTime<Utc>,
    shipping_name: String,
    shipping_slug: String,
    payment_name: String,
    payment_slug: String,
    total_price: Decimal,
    #[sqlx(flatten)]
    user: ProfileRow,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    quantity: i32,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl OrderRow {
    fn into_detail(self, items: Vec<OrderLine>) -> Result<OrderDetail, RepositoryError> {
        let zip_code = ZipCode::parse(&self.zip_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid zip code on order {}: {e}", self.id))
        })?;

        Ok(OrderDetail {
            id: self.id,
            code: self.code,
            user: Profile::try_from(self.user)?,
            shipping: NamedRef::new(self.shipping_name, self.shipping_slug),
            payment: self.payment_name,
            payment_slug: self.payment_slug,
            total_price: self.total_price,
            address: self.address,
            zip_code,
            city: self.city,
            phone: self.phone,
            state: self.state,
            created: self.created_at,
            items,
        })
    }
}

async fn order_lines(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Vec<OrderLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderLineRow>(concat!(
        "SELECT i.quantity, ",
        product_columns!(),
        product_joins!(),
        r"
        JOIN order_item i ON i.product_id = p.id
        WHERE i.order_id = $1
        ORDER BY i.id
        "
    ))
    .bind(id)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| OrderLine {
            product: row.product.into(),
            quantity: row.quantity,
        })
        .collect())
}

async fn order_detail(
    conn: &mut PgConnection,
    profile: ProfileId,
    id: OrderId,
) -> Result<Option<OrderDetail>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(order_select!("WHERE o.id = $1 AND o.profile_id = $2"))
        .bind(id)
        .bind(profile)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let items = order_lines(conn, id).await?;
    row.into_detail(items).map(Some)
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn list_orders(&self, profile: ProfileId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(order_select!(
            "WHERE o.profile_id = $1 ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(profile)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.into_detail(Vec::new()).map(|d| d.summary()))
            .collect()
    }

    async fn get_order(
        &self,
        profile: ProfileId,
        id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        order_detail(&mut conn, profile, id).await
    }

    #[instrument(skip(self), fields(profile_id = %profile, order_id = %id))]
    async fn delete_order(
        &self,
        profile: ProfileId,
        id: OrderId,
    ) -> Result<DeleteOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the row so a concurrent state change cannot land between the
        // check and the delete.
        let state: Option<OrderState> = sqlx::query_scalar(
            "SELECT state FROM customer_order WHERE id = $1 AND profile_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(profile)
        .fetch_optional(&mut *tx)
        .await?;

        match state {
            None => Ok(DeleteOutcome::NotFound),
            Some(state) if !state.is_deletable() => Ok(DeleteOutcome::Locked(state)),
            Some(_) => {
                sqlx::query("DELETE FROM customer_order WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                info!("Order deleted");
                Ok(DeleteOutcome::Deleted)
            }
        }
    }

    #[instrument(skip(self, order), fields(profile_id = %profile, lines = order.items.len()))]
    async fn place_order(
        &self,
        profile: ProfileId,
        order: &NewOrder,
    ) -> Result<OrderDetail, PlaceOrderError> {
        if order.items.is_empty() {
            return Err(PlaceOrderError::EmptyOrder);
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let shipping: ShippingId = sqlx::query_scalar("SELECT id FROM shipping WHERE slug = $1")
            .bind(&order.shipping)
            .fetch_optional(&mut *tx)
            .await
            .map_err(RepositoryError::from)?
            .ok_or_else(|| PlaceOrderError::UnknownShipping(order.shipping.clone()))?;

        let payment: PaymentId = sqlx::query_scalar("SELECT id FROM payment WHERE slug = $1")
            .bind(&order.payment)
            .fetch_optional(&mut *tx)
            .await
            .map_err(RepositoryError::from)?
            .ok_or_else(|| PlaceOrderError::UnknownPayment(order.payment.clone()))?;

        let mut products = Vec::with_capacity(order.items.len());
        for (line, item) in order.items.iter().enumerate() {
            let product: ProductId = sqlx::query_scalar("SELECT id FROM product WHERE slug = $1")
                .bind(&item.product)
                .fetch_optional(&mut *tx)
                .await
                .map_err(RepositoryError::from)?
                .ok_or_else(|| PlaceOrderError::UnknownProduct {
                    line,
                    slug: item.product.clone(),
                })?;
            products.push((product, item.quantity));
        }

        let id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO customer_order (
                code, profile_id, shipping_id, payment_id, address, zip_code, city, phone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(Uuid::new_v4())
        .bind(profile)
        .bind(shipping)
        .bind(payment)
        .bind(order.address.trim())
        .bind(order.zip_code.as_str())
        .bind(order.city.trim())
        .bind(order.phone.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        for (product, quantity) in products {
            sqlx::query("INSERT INTO order_item (order_id, product_id, quantity) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(product)
                .bind(quantity)
                .execute(&mut *tx)
                .await
                .map_err(RepositoryError::from_write)?;

            // Single-statement decrement; CHECK (stock >= 0) rejects oversell.
            sqlx::query("UPDATE product SET stock = stock - $1 WHERE id = $2")
                .bind(quantity)
                .bind(product)
                .execute(&mut *tx)
                .await
                .map_err(RepositoryError::from_write)?;
        }

        let detail = order_detail(&mut tx, profile, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await.map_err(RepositoryError::from)?;

        info!(order_id = %id, total = %detail.total_price, "Order placed");
        Ok(detail)
    }

    async fn set_order_state(&self, id: OrderId, state: OrderState) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE customer_order SET state = $2 WHERE id = $1")
            .bind(id)
            .bind(state)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
