use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pw_core::error::{AppError, Result};
use pw_core::models::{FriendRequest, FriendRequestStatus, FriendRequestView, UserProfile};
use pw_core::traits::SocialRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use uuid::Uuid;

use crate::{enum_column, profile_from_row, unique_or_db_err, DbResultExt, SqliteRepo};

const REQUEST_COLUMNS: &str = "id, from_user_id, to_user_id, status, created_at, responded_at";

fn request_from_row(row: &SqliteRow) -> std::result::Result<FriendRequest, sqlx::Error> {
    Ok(FriendRequest {
        id: row.try_get("id")?,
        from_user_id: row.try_get("from_user_id")?,
        to_user_id: row.try_get("to_user_id")?,
        status: enum_column(row, "status")?,
        created_at: row.try_get("created_at")?,
        responded_at: row.try_get("responded_at")?,
    })
}

/// Loads a request inside `tx` and insists that it is still PENDING.
async fn pending_request(
    tx: &mut Transaction<'_, Sqlite>,
    id: Uuid,
) -> Result<FriendRequest> {
    let row = sqlx::query(&format!("SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .db()?
        .ok_or_else(|| AppError::not_found("FriendRequest", id))?;
    let request = request_from_row(&row).db()?;

    if request.status != FriendRequestStatus::Pending {
        return Err(AppError::Conflict(format!(
            "friend request already {}",
            request.status.as_str().to_lowercase()
        )));
    }
    Ok(request)
}

async fn respond(
    tx: &mut Transaction<'_, Sqlite>,
    request: &mut FriendRequest,
    status: FriendRequestStatus,
    at: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE friend_requests SET status = ?, responded_at = ? WHERE id = ? AND status = 'PENDING'",
    )
    .bind(status.as_str())
    .bind(at)
    .bind(request.id)
    .execute(&mut **tx)
    .await
    .db()?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("friend request already answered".into()));
    }
    request.status = status;
    request.responded_at = Some(at);
    Ok(())
}

#[async_trait]
impl SocialRepo for SqliteRepo {
    async fn create_friend_request(&self, request: FriendRequest) -> Result<()> {
        sqlx::query(
            "INSERT INTO friend_requests (id, from_user_id, to_user_id, status, created_at, responded_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(request.id)
        .bind(request.from_user_id)
        .bind(request.to_user_id)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.responded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db_err(e, "a friend request between these users is already pending"))?;
        Ok(())
    }

    async fn get_friend_request(&self, id: Uuid) -> Result<Option<FriendRequest>> {
        sqlx::query(&format!("SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .db()?
            .map(|row| request_from_row(&row))
            .transpose()
            .db()
    }

    async fn find_pending_request(&self, a: Uuid, b: Uuid) -> Result<Option<FriendRequest>> {
        sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests \
             WHERE status = 'PENDING' \
               AND ((from_user_id = ?1 AND to_user_id = ?2) OR (from_user_id = ?2 AND to_user_id = ?1)) \
             LIMIT 1"
        ))
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await
        .db()?
        .map(|row| request_from_row(&row))
        .transpose()
        .db()
    }

    async fn list_incoming_requests(&self, user_id: Uuid) -> Result<Vec<FriendRequestView>> {
        let rows = sqlx::query(
            "SELECT fr.id, fr.from_user_id, fr.to_user_id, fr.status, fr.created_at, fr.responded_at, \
                    u.id AS u_id, u.username AS u_username, u.display_name AS u_display_name, \
                    u.bio AS u_bio, u.is_pro AS u_is_pro, u.created_at AS u_created_at \
             FROM friend_requests fr JOIN users u ON u.id = fr.from_user_id \
             WHERE fr.to_user_id = ? AND fr.status = 'PENDING' \
             ORDER BY fr.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .db()?;

        rows.iter()
            .map(|row| {
                Ok(FriendRequestView {
                    request: request_from_row(row)?,
                    from: profile_from_row(row, "u_")?,
                })
            })
            .collect::<std::result::Result<_, sqlx::Error>>()
            .db()
    }

    /// The status change and both friendship rows commit together or not at all.
    async fn accept_friend_request(&self, id: Uuid, at: DateTime<Utc>) -> Result<FriendRequest> {
        let mut tx = self.pool.begin().await.db()?;

        let mut request = pending_request(&mut tx, id).await?;
        respond(&mut tx, &mut request, FriendRequestStatus::Accepted, at).await?;

        for (user_id, friend_id) in [
            (request.from_user_id, request.to_user_id),
            (request.to_user_id, request.from_user_id),
        ] {
            sqlx::query(
                "INSERT OR IGNORE INTO friendships (user_id, friend_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(friend_id)
            .bind(at)
            .execute(&mut *tx)
            .await
            .db()?;
        }

        tx.commit().await.db()?;
        log::info!(
            "friend request {} accepted: {} <-> {}",
            request.id,
            request.from_user_id,
            request.to_user_id
        );
        Ok(request)
    }

    async fn reject_friend_request(&self, id: Uuid, at: DateTime<Utc>) -> Result<FriendRequest> {
        let mut tx = self.pool.begin().await.db()?;
        let mut request = pending_request(&mut tx, id).await?;
        respond(&mut tx, &mut request, FriendRequestStatus::Rejected, at).await?;
        tx.commit().await.db()?;
        Ok(request)
    }

    async fn are_friends(&self, a: Uuid, b: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM friendships WHERE user_id = ? AND friend_id = ?) AS found",
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await
        .db()?;
        let found: i64 = row.try_get("found").db()?;
        Ok(found != 0)
    }

    async fn list_friends(&self, user_id: Uuid) -> Result<Vec<UserProfile>> {
        let rows = sqlx::query(
            "SELECT u.id, u.username, u.display_name, u.bio, u.is_pro, u.created_at \
             FROM friendships f JOIN users u ON u.id = f.friend_id \
             WHERE f.user_id = ? \
             ORDER BY u.username COLLATE NOCASE",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .db()?;

        rows.iter()
            .map(|row| profile_from_row(row, ""))
            .collect::<std::result::Result<_, _>>()
            .db()
    }

    async fn remove_friend(&self, a: Uuid, b: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM friendships \
             WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)",
        )
        .bind(a)
        .bind(b)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(result.rows_affected() > 0)
    }
}
