use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pw_core::error::{AppError, Result};
use pw_core::models::{Payment, PaymentStatus, User};
use pw_core::pro;
use pw_core::traits::PaymentRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::{enum_column, unique_or_db_err, user_from_row, DbResultExt, SqliteRepo, USER_COLUMNS};

const PAYMENT_COLUMNS: &str =
    "id, user_id, order_id, request_id, amount, plan_months, status, trans_id, created_at, paid_at";

fn payment_from_row(row: &SqliteRow) -> std::result::Result<Payment, sqlx::Error> {
    Ok(Payment {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        order_id: row.try_get("order_id")?,
        request_id: row.try_get("request_id")?,
        amount: row.try_get("amount")?,
        plan_months: row.try_get("plan_months")?,
        status: enum_column(row, "status")?,
        trans_id: row.try_get("trans_id")?,
        created_at: row.try_get("created_at")?,
        paid_at: row.try_get("paid_at")?,
    })
}

#[async_trait]
impl PaymentRepo for SqliteRepo {
    async fn create_payment(&self, payment: Payment) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO payments ({PAYMENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(payment.id)
        .bind(payment.user_id)
        .bind(&payment.order_id)
        .bind(&payment.request_id)
        .bind(payment.amount)
        .bind(payment.plan_months)
        .bind(payment.status.as_str())
        .bind(payment.trans_id)
        .bind(payment.created_at)
        .bind(payment.paid_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db_err(e, "duplicate order id"))?;
        Ok(())
    }

    async fn get_payment(&self, order_id: &str) -> Result<Option<Payment>> {
        sqlx::query(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?"))
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .db()?
            .map(|row| payment_from_row(&row))
            .transpose()
            .db()
    }

    /// Gateways retry notifications, so a payment that is no longer PENDING
    /// is left alone and `None` is returned.
    async fn complete_payment(
        &self,
        order_id: &str,
        trans_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let mut tx = self.pool.begin().await.db()?;

        let row = sqlx::query(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?"))
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await
            .db()?
            .ok_or_else(|| AppError::not_found("Payment", order_id))?;
        let payment = payment_from_row(&row).db()?;
        if payment.status != PaymentStatus::Pending {
            return Ok(None);
        }

        sqlx::query(
            "UPDATE payments SET status = 'PAID', trans_id = ?, paid_at = ? \
             WHERE order_id = ? AND status = 'PENDING'",
        )
        .bind(trans_id)
        .bind(at)
        .bind(order_id)
        .execute(&mut *tx)
        .await
        .db()?;

        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(payment.user_id)
            .fetch_optional(&mut *tx)
            .await
            .db()?
            .ok_or_else(|| AppError::not_found("User", payment.user_id))?;
        let mut user = user_from_row(&row).db()?;

        // An open-ended Pro grant stays open-ended.
        let expiry = match (user.is_pro, user.pro_expiry) {
            (true, None) => None,
            (_, current) => Some(pro::extend_expiry(current, at, payment.plan_months)),
        };
        sqlx::query("UPDATE users SET is_pro = 1, pro_expiry = ? WHERE id = ?")
            .bind(expiry)
            .bind(user.id)
            .execute(&mut *tx)
            .await
            .db()?;

        tx.commit().await.db()?;

        user.is_pro = true;
        user.pro_expiry = expiry;
        log::info!(
            "payment {} completed; {} is Pro until {:?}",
            order_id,
            user.username,
            expiry
        );
        Ok(Some(user))
    }

    async fn fail_payment(&self, order_id: &str, trans_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'FAILED', trans_id = ? \
             WHERE order_id = ? AND status = 'PENDING'",
        )
        .bind(trans_id)
        .bind(order_id)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(result.rows_affected() > 0)
    }
}
