use async_trait::async_trait;
use common::{Money, OrderId, PartId, TransactionId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::OrderRepository;
use crate::error::{RepositoryError, Result};
use crate::order::{Order, OrderStatus, PaymentMethod};

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
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

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let payment_method: String = row.try_get("payment_method")?;
        let part_ids: Vec<Uuid> = row.try_get("part_uuids")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get("order_uuid")?),
            user_id: UserId::from_uuid(row.try_get("user_uuid")?),
            part_ids: part_ids.into_iter().map(PartId::from_uuid).collect(),
            total_price: Money::from_cents(row.try_get("total_price")?),
            transaction_id: row
                .try_get::<Option<Uuid>, _>("transaction_uuid")?
                .map(TransactionId::from_uuid),
            payment_method: payment_method
                .parse::<PaymentMethod>()
                .map_err(|e| RepositoryError::InvalidRow(e.to_string()))?,
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| RepositoryError::InvalidRow(e.to_string()))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn current_status(&self, id: OrderId) -> Result<Option<OrderStatus>> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE order_uuid = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        status
            .map(|s| {
                s.parse::<OrderStatus>()
                    .map_err(|e| RepositoryError::InvalidRow(e.to_string()))
            })
            .transpose()
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: OrderId) -> Result<Order> {
        let row = sqlx::query(
            r#"
            SELECT order_uuid, user_uuid, part_uuids, total_price, transaction_uuid,
                   payment_method, status, created_at, updated_at
            FROM orders
            WHERE order_uuid = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn create(&self, order: &Order) -> Result<()> {
        let part_ids: Vec<Uuid> = order.part_ids().iter().map(PartId::as_uuid).collect();

        sqlx::query(
            r#"
            INSERT INTO orders (order_uuid, user_uuid, part_uuids, total_price, transaction_uuid,
                                payment_method, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_uuid())
        .bind(part_ids)
        .bind(order.total_price().cents())
        .bind(order.transaction_id().map(|t| t.as_uuid()))
        .bind(order.payment_method().as_str())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return RepositoryError::AlreadyExists(order.id());
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id(), status = %order.status()))]
    async fn update(&self, order: &Order, expected: OrderStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET transaction_uuid = $2, payment_method = $3, status = $4, updated_at = $5
            WHERE order_uuid = $1 AND status = $6
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.transaction_id().map(|t| t.as_uuid()))
        .bind(order.payment_method().as_str())
        .bind(order.status().as_str())
        .bind(order.updated_at())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.current_status(order.id()).await? {
            None => Err(RepositoryError::NotFound(order.id())),
            Some(actual) => Err(RepositoryError::Conflict {
                order_id: order.id(),
                expected,
                actual,
            }),
        }
    }
}
