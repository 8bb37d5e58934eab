use async_trait::async_trait;
use pw_core::error::{AppError, Result};
use pw_core::models::{Comment, Pagination, Repost, Thread, ThreadView};
use pw_core::traits::ThreadRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{json_column, like_pattern, unique_or_db_err, DbResultExt, SqliteRepo};

/// Thread columns plus author and counters; callers append WHERE/ORDER.
const THREAD_VIEW_SELECT: &str = "SELECT t.id, t.author_id, t.content, t.hashtags, t.created_at, \
     u.username AS author_username, \
     (SELECT COUNT(*) FROM comments c WHERE c.thread_id = t.id) AS comment_count, \
     (SELECT COUNT(*) FROM reposts r WHERE r.thread_id = t.id) AS repost_count \
     FROM threads t JOIN users u ON u.id = t.author_id";

fn thread_view_from_row(row: &SqliteRow) -> std::result::Result<ThreadView, sqlx::Error> {
    Ok(ThreadView {
        thread: Thread {
            id: row.try_get("id")?,
            author_id: row.try_get("author_id")?,
            content: row.try_get("content")?,
            hashtags: json_column(row, "hashtags")?,
            created_at: row.try_get("created_at")?,
        },
        author_username: row.try_get("author_username")?,
        comment_count: row.try_get("comment_count")?,
        repost_count: row.try_get("repost_count")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> std::result::Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        author_id: row.try_get("author_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

fn collect_views(rows: Vec<SqliteRow>) -> Result<Vec<ThreadView>> {
    rows.iter()
        .map(thread_view_from_row)
        .collect::<std::result::Result<_, _>>()
        .db()
}

#[async_trait]
impl ThreadRepo for SqliteRepo {
    async fn create_thread(&self, thread: Thread) -> Result<()> {
        let hashtags = serde_json::to_string(&thread.hashtags)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        sqlx::query(
            "INSERT INTO threads (id, author_id, content, hashtags, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(thread.id)
        .bind(thread.author_id)
        .bind(&thread.content)
        .bind(hashtags)
        .bind(thread.created_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn get_thread(&self, id: Uuid) -> Result<Option<ThreadView>> {
        sqlx::query(&format!("{THREAD_VIEW_SELECT} WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .db()?
            .map(|row| thread_view_from_row(&row))
            .transpose()
            .db()
    }

    async fn search_threads(
        &self,
        query: Option<&str>,
        page: Pagination,
    ) -> Result<Vec<ThreadView>> {
        let pattern = query.map(like_pattern);
        let rows = sqlx::query(&format!(
            "{THREAD_VIEW_SELECT} \
             WHERE ?1 IS NULL OR t.content LIKE ?1 ESCAPE '\\' OR u.username LIKE ?1 ESCAPE '\\' \
             ORDER BY t.created_at DESC, t.id DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .db()?;
        collect_views(rows)
    }

    async fn list_threads_by_hashtag(
        &self,
        tag: &str,
        page: Pagination,
    ) -> Result<Vec<ThreadView>> {
        let rows = sqlx::query(&format!(
            "{THREAD_VIEW_SELECT} \
             WHERE EXISTS (SELECT 1 FROM json_each(t.hashtags) WHERE json_each.value = ?1) \
             ORDER BY t.created_at DESC, t.id DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(tag.to_lowercase())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .db()?;
        collect_views(rows)
    }

    /// Children first: the foreign keys reject deleting a thread that still has them.
    async fn delete_thread(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.db()?;

        sqlx::query("DELETE FROM comments WHERE thread_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .db()?;
        sqlx::query("DELETE FROM reposts WHERE thread_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .db()?;
        let deleted = sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .db()?
            .rows_affected();

        tx.commit().await.db()?;
        Ok(deleted > 0)
    }

    async fn create_comment(&self, comment: Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, thread_id, author_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(comment.id)
        .bind(comment.thread_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .db()?;
        Ok(())
    }

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .db()?
            .map(|row| comment_from_row(&row))
            .transpose()
            .db()
    }

    async fn list_comments(&self, thread_id: Uuid) -> Result<Vec<Comment>> {
        sqlx::query("SELECT * FROM comments WHERE thread_id = ? ORDER BY created_at ASC, id ASC")
            .bind(thread_id)
            .fetch_all(&self.pool)
            .await
            .db()?
            .iter()
            .map(comment_from_row)
            .collect::<std::result::Result<_, _>>()
            .db()
    }

    async fn create_repost(&self, repost: Repost) -> Result<()> {
        sqlx::query(
            "INSERT INTO reposts (id, user_id, thread_id, comment, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(repost.id)
        .bind(repost.user_id)
        .bind(repost.thread_id)
        .bind(&repost.comment)
        .bind(repost.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db_err(e, "thread already reposted"))?;
        Ok(())
    }

    async fn delete_repost(&self, user_id: Uuid, thread_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reposts WHERE user_id = ? AND thread_id = ?")
            .bind(user_id)
            .bind(thread_id)
            .execute(&self.pool)
            .await
            .db()?;
        Ok(result.rows_affected() > 0)
    }
}
