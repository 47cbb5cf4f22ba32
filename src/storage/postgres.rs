// PostgreSQL 存储实现

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{
    NewPayment, NewPaymentMethod, Order, Payment, PaymentMethod, PaymentResolution, PaymentState,
    RemoteState,
};
use crate::storage::CheckoutStore;

const PAYMENT_COLUMNS: &str = r#"
    id, order_id, payment_method_id, payment_gateway, state, remote_state,
    remote_id, amount, currency, authorization_expires, test, created_at, updated_at
"#;

/// 基于 sqlx 连接池的存储
#[derive(Clone)]
pub struct PgCheckoutStore {
    pool: PgPool,
}

impl PgCheckoutStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckoutStore for PgCheckoutStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn load_order(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, total, currency, language, checkout_step, state,
                   payment_gateway, payment_method_id, placed_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn save_order(&self, order: &Order) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE orders
            SET checkout_step = $1, state = $2, payment_gateway = $3,
                payment_method_id = $4, placed_at = $5, updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(&order.checkout_step)
        .bind(order.state)
        .bind(&order.payment_gateway)
        .bind(order.payment_method_id)
        .bind(order.placed_at)
        .bind(order.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::Missing(format!("order {}", order.id)));
        }
        Ok(())
    }

    async fn load_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, StoreError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, StoreError> {
        let payment = payment.into_payment();

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, payment_method_id, payment_gateway, state, remote_state,
                remote_id, amount, currency, authorization_expires, test, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            "#,
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(payment.payment_method_id)
        .bind(&payment.payment_gateway)
        .bind(payment.state)
        .bind(payment.remote_state)
        .bind(&payment.remote_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.authorization_expires)
        .bind(payment.test)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn resolve_payment(
        &self,
        payment_id: Uuid,
        resolution: PaymentResolution,
    ) -> Result<bool, StoreError> {
        let (state, remote_state) = resolution.states();

        // 条件更新：两个并发回调中只有一个能命中 new/pending
        let rows_affected = sqlx::query(
            r#"
            UPDATE payments
            SET state = $1, remote_state = $2, updated_at = $3
            WHERE id = $4 AND state = $5 AND remote_state = $6
            "#,
        )
        .bind(state)
        .bind(remote_state)
        .bind(Utc::now())
        .bind(payment_id)
        .bind(PaymentState::New)
        .bind(RemoteState::Pending)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected == 1)
    }

    async fn load_payment_method(&self, method_id: i64) -> Result<Option<PaymentMethod>, StoreError> {
        let method = sqlx::query_as::<_, PaymentMethod>(
            r#"
            SELECT id, payment_gateway, payment_option, response_code, seal, reusable, created_at
            FROM payment_methods
            WHERE id = $1
            "#,
        )
        .bind(method_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    async fn insert_payment_method(
        &self,
        method: NewPaymentMethod,
    ) -> Result<PaymentMethod, StoreError> {
        let method = sqlx::query_as::<_, PaymentMethod>(
            r#"
            INSERT INTO payment_methods (payment_gateway, payment_option, reusable, created_at)
            VALUES ($1, $2, FALSE, $3)
            RETURNING id, payment_gateway, payment_option, response_code, seal, reusable, created_at
            "#,
        )
        .bind(&method.payment_gateway)
        .bind(method.payment_option.as_str())
        .bind(method.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(method)
    }

    async fn save_payment_method(&self, method: &PaymentMethod) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE payment_methods
            SET payment_option = $1, response_code = $2, seal = $3, reusable = $4
            WHERE id = $5
            "#,
        )
        .bind(&method.payment_option)
        .bind(&method.response_code)
        .bind(&method.seal)
        .bind(method.reusable)
        .bind(method.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::Missing(format!("payment method {}", method.id)));
        }
        Ok(())
    }

    async fn delete_payment_method(&self, method_id: i64) -> Result<bool, StoreError> {
        let rows_affected = sqlx::query("DELETE FROM payment_methods WHERE id = $1")
            .bind(method_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
