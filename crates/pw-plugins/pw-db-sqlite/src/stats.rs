use async_trait::async_trait;
use pw_core::error::Result;
use pw_core::models::Stats;
use pw_core::traits::StatsRepo;
use sqlx::Row;

use crate::{DbResultExt, SqliteRepo};

#[async_trait]
impl StatsRepo for SqliteRepo {
    async fn stats(&self) -> Result<Stats> {
        let row = sqlx::query(
            "SELECT \
               (SELECT COUNT(*) FROM users) AS users, \
               (SELECT COUNT(*) FROM users WHERE is_pro = 1) AS pro_users, \
               (SELECT COUNT(*) FROM users WHERE is_admin = 1) AS admins, \
               (SELECT COUNT(*) FROM threads) AS threads, \
               (SELECT COUNT(*) FROM comments) AS comments, \
               (SELECT COUNT(*) FROM reposts) AS reposts, \
               (SELECT COUNT(*) FROM reports WHERE status = 'OPEN') AS open_reports, \
               (SELECT COUNT(*) FROM friend_requests WHERE status = 'PENDING') AS pending_friend_requests, \
               (SELECT COUNT(*) FROM payments WHERE status = 'PAID') AS paid_payments, \
               (SELECT COALESCE(SUM(amount), 0) FROM payments WHERE status = 'PAID') AS revenue",
        )
        .fetch_one(&self.pool)
        .await
        .db()?;

        Ok(Stats {
            users: row.try_get("users").db()?,
            pro_users: row.try_get("pro_users").db()?,
            admins: row.try_get("admins").db()?,
            threads: row.try_get("threads").db()?,
            comments: row.try_get("comments").db()?,
            reposts: row.try_get("reposts").db()?,
            open_reports: row.try_get("open_reports").db()?,
            pending_friend_requests: row.try_get("pending_friend_requests").db()?,
            paid_payments: row.try_get("paid_payments").db()?,
            revenue: row.try_get("revenue").db()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pw_core::models::{Payment, PaymentStatus, Thread};
    use pw_core::traits::{PaymentRepo, ThreadRepo, UserRepo};
    use uuid::Uuid;

    use super::*;
    use crate::testing::{repo, user};

    #[tokio::test]
    async fn empty_database_has_zero_stats() {
        let repo = repo().await;
        assert_eq!(repo.stats().await.unwrap(), Stats::default());
    }

    #[tokio::test]
    async fn stats_count_only_paid_revenue() {
        let repo = repo().await;
        let rex = user(&repo, "rex").await;
        user(&repo, "luna").await;
        repo.update_pro(rex.id, true, None).await.unwrap();
        repo.create_thread(Thread {
            id: Uuid::now_v7(),
            author_id: rex.id,
            content: "hi".into(),
            hashtags: vec![],
            created_at: Utc::now(),
        })
        .await
        .unwrap();

        for (order, amount) in [("paid", 49_000), ("pending", 147_000)] {
            repo.create_payment(Payment {
                id: Uuid::now_v7(),
                user_id: rex.id,
                order_id: order.into(),
                request_id: order.into(),
                amount,
                plan_months: 1,
                status: PaymentStatus::Pending,
                trans_id: None,
                created_at: Utc::now(),
                paid_at: None,
            })
            .await
            .unwrap();
        }
        repo.complete_payment("paid", 1, Utc::now()).await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.users, 2);
        assert_eq!(stats.pro_users, 1);
        assert_eq!(stats.threads, 1);
        assert_eq!(stats.paid_payments, 1);
        assert_eq!(stats.revenue, 49_000);
    }
}
