use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pw_core::error::Result;
use pw_core::models::{Pagination, User};
use pw_core::traits::UserRepo;
use uuid::Uuid;

use crate::{like_pattern, unique_or_db_err, user_from_row, DbResultExt, SqliteRepo, USER_COLUMNS};

#[async_trait]
impl UserRepo for SqliteRepo {
    async fn create_user(&self, user: User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, display_name, bio, is_admin, is_pro, pro_expiry, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(&user.bio)
        .bind(user.is_admin)
        .bind(user.is_pro)
        .bind(user.pro_expiry)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db_err(e, "username or email already taken"))?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .db()?
            .map(|row| user_from_row(&row))
            .transpose()
            .db()
    }

    /// Both columns are `COLLATE NOCASE`, so the comparison ignores case.
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .db()?
        .map(|row| user_from_row(&row))
        .transpose()
        .db()
    }

    async fn search_users(&self, query: Option<&str>, page: Pagination) -> Result<Vec<User>> {
        let pattern = query.map(like_pattern);
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ?1 IS NULL OR username LIKE ?1 ESCAPE '\\' OR email LIKE ?1 ESCAPE '\\' \
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .db()?;

        rows.iter()
            .map(user_from_row)
            .collect::<std::result::Result<_, _>>()
            .db()
    }

    async fn update_pro(
        &self,
        id: Uuid,
        is_pro: bool,
        pro_expiry: Option<DateTime<Utc>>,
    ) -> Result<Option<User>> {
        let result = sqlx::query("UPDATE users SET is_pro = ?, pro_expiry = ? WHERE id = ?")
            .bind(is_pro)
            .bind(pro_expiry)
            .bind(id)
            .execute(&self.pool)
            .await
            .db()?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(id).await
    }

    async fn expire_pro(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE users SET is_pro = 0 \
             WHERE is_pro = 1 AND pro_expiry IS NOT NULL AND pro_expiry <= ?",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(result.rows_affected())
    }
}
