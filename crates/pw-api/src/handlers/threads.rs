use actix_web::web;
use chrono::Utc;
use pw_core::error::AppError;
use pw_core::hashtags::{extract_hashtags, linkify_hashtags};
use pw_core::models::{Comment, Repost, Thread, ThreadView};
use pw_core::traits::ThreadRepo;
use pw_core::validate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::extractors::AuthUser;
use crate::handlers::ListQuery;
use crate::response::{created, ok, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RepostRequest {
    pub comment: Option<String>,
}

/// A thread page: the thread, its rendered body and its comments.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDetail {
    #[serde(flatten)]
    pub thread: ThreadView,
    pub content_html: String,
    pub comments: Vec<Comment>,
}

/// Loads a thread or fails with NotFound.
pub(crate) async fn require_thread(state: &AppState, id: Uuid) -> Result<ThreadView, AppError> {
    state
        .repo
        .get_thread(id)
        .await?
        .ok_or_else(|| AppError::not_found("Thread", id))
}

/// The public feed, newest first. `q` filters by content or author.
pub async fn list_threads(state: web::Data<AppState>, query: web::Query<ListQuery>) -> ApiResult {
    let threads = state
        .repo
        .search_threads(query.search(), query.pagination())
        .await?;
    Ok(ok(threads))
}

pub async fn create_thread(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<ContentRequest>,
) -> ApiResult {
    let content = body.into_inner().content;
    validate::content(&content)?;

    let thread = Thread {
        id: Uuid::now_v7(),
        author_id: user.id,
        hashtags: extract_hashtags(&content),
        content,
        created_at: Utc::now(),
    };
    state.repo.create_thread(thread.clone()).await?;

    Ok(created(ThreadView {
        thread,
        author_username: user.username,
        comment_count: 0,
        repost_count: 0,
    }))
}

pub async fn get_thread(state: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let thread = require_thread(&state, path.into_inner()).await?;
    let comments = state.repo.list_comments(thread.thread.id).await?;
    Ok(ok(ThreadDetail {
        content_html: linkify_hashtags(&thread.thread.content),
        thread,
        comments,
    }))
}

/// Authors delete their own threads; admins delete anything.
pub async fn delete_thread(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    let thread = require_thread(&state, path.into_inner()).await?;
    if thread.thread.author_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden("only the author can delete this thread".into()).into());
    }

    state.repo.delete_thread(thread.thread.id).await?;
    log::info!("@{} deleted thread {}", user.username, thread.thread.id);
    Ok(ok(json!({ "id": thread.thread.id })))
}

pub async fn add_comment(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<ContentRequest>,
) -> ApiResult {
    let thread = require_thread(&state, path.into_inner()).await?;
    let content = body.into_inner().content;
    validate::content(&content)?;

    let comment = Comment {
        id: Uuid::now_v7(),
        thread_id: thread.thread.id,
        author_id: user.id,
        content,
        created_at: Utc::now(),
    };
    state.repo.create_comment(comment.clone()).await?;
    Ok(created(comment))
}

/// An empty body reposts as is; `{"comment": "..."}` adds a quote.
pub async fn repost(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> ApiResult {
    let request: Option<RepostRequest> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(serde_json::from_slice(&body).map_err(|e| AppError::validation(e.to_string()))?)
    };

    let thread = require_thread(&state, path.into_inner()).await?;
    let comment = request
        .and_then(|r| r.comment)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if let Some(comment) = &comment {
        validate::content(comment)?;
    }

    let repost = Repost {
        id: Uuid::now_v7(),
        user_id: user.id,
        thread_id: thread.thread.id,
        comment,
        created_at: Utc::now(),
    };
    state.repo.create_repost(repost.clone()).await?;
    Ok(created(repost))
}

pub async fn undo_repost(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    let thread_id = path.into_inner();
    if !state.repo.delete_repost(user.id, thread_id).await? {
        return Err(AppError::not_found("Repost", thread_id).into());
    }
    Ok(ok(json!({ "threadId": thread_id })))
}

/// Threads tagged `#tag`, newest first. The tag is matched case-insensitively.
pub async fn by_hashtag(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> ApiResult {
    let tag = path.trim().trim_start_matches('#').to_lowercase();
    if tag.is_empty() {
        return Err(AppError::validation("hashtag must not be empty").into());
    }
    let threads = state
        .repo
        .list_threads_by_hashtag(&tag, query.pagination())
        .await?;
    Ok(ok(threads))
}
