use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{LineId, OrderId};
use domain::{Buyer, Money, Order, OrderLine, OrderStatus, PaymentStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{Result, StoreError, store::OrderStore};

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        Ok(Order {
            order_id,
            buyer: Buyer {
                name: row.try_get("buyer_name")?,
                phone: row.try_get("buyer_phone")?,
                address: row.try_get("buyer_address")?,
            },
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            status: parse_status(order_id, row.try_get("order_status")?)?,
            payment_status: parse_payment_status(order_id, row.try_get("payment_status")?)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    fn row_to_line(row: &PgRow) -> Result<OrderLine> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(OrderLine {
            line_id: LineId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: domain::ProductId::new(row.try_get::<String, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            product_icon: row.try_get("product_icon")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            quantity: quantity as u32,
        })
    }
}

fn parse_status(order_id: OrderId, s: String) -> Result<OrderStatus> {
    s.parse()
        .map_err(|detail| StoreError::InvalidRecord { order_id, detail })
}

fn parse_payment_status(order_id: OrderId, s: String) -> Result<PaymentStatus> {
    s.parse()
        .map_err(|detail| StoreError::InvalidRecord { order_id, detail })
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn save_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer_name, buyer_phone, buyer_address,
                                total_amount_cents, order_status, payment_status,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.order_id.as_uuid())
        .bind(&order.buyer.name)
        .bind(&order.buyer.phone)
        .bind(&order.buyer.address)
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_order_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, buyer_name, buyer_phone, buyer_address, total_amount_cents,
                   order_status, payment_status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn save_order_line(&self, line: &OrderLine) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_lines (id, order_id, product_id, product_name,
                                     product_icon, unit_price_cents, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(line.line_id.as_uuid())
        .bind(line.order_id.as_uuid())
        .bind(line.product_id.as_str())
        .bind(&line.product_name)
        .bind(&line.product_icon)
        .bind(line.unit_price.cents())
        .bind(line.quantity as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_order_lines_by_order_id(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, product_icon,
                   unit_price_cents, quantity
            FROM order_lines
            WHERE order_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_line).collect()
    }

    async fn delete_order_lines(&self, order_id: OrderId) -> Result<()> {
        let result = sqlx::query("DELETE FROM order_lines WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(
                %order_id,
                rows = result.rows_affected(),
                "deleted order lines"
            );
        }
        Ok(())
    }

    async fn transition_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order> {
        // Conditional update: the WHERE clause on order_status makes the
        // check-and-write a single atomic statement, so one of several
        // racing transitions wins and the rest match zero rows.
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET order_status = $3, updated_at = $4
            WHERE id = $1 AND order_status = $2
            RETURNING id, buyer_name, buyer_phone, buyer_address, total_amount_cents,
                      order_status, payment_status, created_at, updated_at
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_order(&row);
        }

        // Zero rows matched: distinguish a missing order from a lost race.
        match self.find_order_by_id(order_id).await? {
            Some(order) => {
                tracing::warn!(
                    %order_id,
                    expected = expected.as_str(),
                    actual = order.status.as_str(),
                    "status transition lost the race"
                );
                Err(StoreError::StatusConflict {
                    order_id,
                    expected,
                    actual: order.status,
                })
            }
            None => Err(StoreError::OrderNotFound(order_id)),
        }
    }
}
