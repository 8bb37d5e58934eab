//! Admin console. Every handler takes `AdminUser`.

use actix_web::web;
use chrono::{DateTime, Utc};
use pw_core::error::AppError;
use pw_core::models::{Pagination, ReportStatus};
use pw_core::traits::{ReportRepo, StatsRepo, ThreadRepo, UserRepo};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use uuid::Uuid;

use crate::extractors::AdminUser;
use crate::handlers::{friends, threads, ListQuery};
use crate::logs;
use crate::response::{ok, ApiResult};
use crate::state::AppState;

/// Absent stays `None`; an explicit `null` becomes `Some(None)`.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProRequest {
    pub is_pro: Option<bool>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub pro_expiry: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub lines: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ReportListQuery {
    pub status: Option<ReportStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReportRequest {
    pub status: Option<ReportStatus>,
    pub notes: Option<String>,
}

pub async fn stats(state: web::Data<AppState>, _admin: AdminUser) -> ApiResult {
    Ok(ok(state.repo.stats().await?))
}

pub async fn list_threads(
    state: web::Data<AppState>,
    _admin: AdminUser,
    query: web::Query<ListQuery>,
) -> ApiResult {
    let threads = state
        .repo
        .search_threads(query.search(), query.pagination())
        .await?;
    Ok(ok(threads))
}

/// Same cascade as the author's delete, without the ownership check.
pub async fn delete_thread(
    state: web::Data<AppState>,
    AdminUser(admin): AdminUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    let thread = threads::require_thread(&state, path.into_inner()).await?;
    state.repo.delete_thread(thread.thread.id).await?;
    log::info!(
        "admin @{} deleted thread {} by @{}",
        admin.username,
        thread.thread.id,
        thread.author_username
    );
    Ok(ok(json!({ "id": thread.thread.id })))
}

pub async fn list_users(
    state: web::Data<AppState>,
    _admin: AdminUser,
    query: web::Query<ListQuery>,
) -> ApiResult {
    let users = state
        .repo
        .search_users(query.search(), query.pagination())
        .await?;
    Ok(ok(users))
}

/// Grants, revokes or re-dates Pro. Revoking also clears the expiry.
pub async fn update_pro(
    state: web::Data<AppState>,
    AdminUser(admin): AdminUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProRequest>,
) -> ApiResult {
    let id = path.into_inner();
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;

    let is_pro = body.is_pro.unwrap_or(user.is_pro);
    let pro_expiry = match (is_pro, body.pro_expiry) {
        (false, _) => None,
        (true, Some(expiry)) => expiry,
        (true, None) => user.pro_expiry,
    };

    let updated = state
        .repo
        .update_pro(id, is_pro, pro_expiry)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    log::info!(
        "admin @{} set @{} Pro={} until {:?}",
        admin.username,
        updated.username,
        updated.is_pro,
        updated.pro_expiry
    );
    Ok(ok(updated))
}

/// Tail of the configured log file.
pub async fn read_logs(
    state: web::Data<AppState>,
    _admin: AdminUser,
    query: web::Query<LogsQuery>,
) -> ApiResult {
    let path = state
        .config
        .log_file
        .clone()
        .ok_or_else(|| AppError::NotFound("Log file".into(), "(not configured)".into()))?;
    let count = query
        .lines
        .unwrap_or(logs::DEFAULT_LINES)
        .clamp(1, logs::MAX_LINES);

    let file = path.clone();
    let lines = web::block(move || logs::tail_lines(&file, count))
        .await
        .map_err(|e| AppError::Internal(format!("log reader panicked: {e}")))?
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::not_found("Log file", path.display()),
            _ => AppError::Internal(format!("reading {}: {e}", path.display())),
        })?;

    Ok(ok(json!({ "file": path, "lines": lines })))
}

/// Runs the Pro expiry sweep now.
pub async fn enforce_pro_expiry(
    state: web::Data<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiResult {
    let modified = state.repo.expire_pro(Utc::now()).await?;
    log::info!("admin @{} expired {modified} Pro account(s)", admin.username);
    Ok(ok(json!({ "modified": modified })))
}

pub async fn accept_friend_request(
    state: web::Data<AppState>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    Ok(ok(friends::accept_and_notify(&state, path.into_inner()).await?))
}

pub async fn list_reports(
    state: web::Data<AppState>,
    _admin: AdminUser,
    query: web::Query<ReportListQuery>,
) -> ApiResult {
    let reports = state
        .repo
        .list_reports(query.status, Pagination::new(query.page, query.limit))
        .await?;
    Ok(ok(reports))
}

/// Records a moderator decision or note in the report history.
pub async fn update_report(
    state: web::Data<AppState>,
    AdminUser(admin): AdminUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateReportRequest>,
) -> ApiResult {
    let body = body.into_inner();
    let notes = body.notes.filter(|n| !n.trim().is_empty());
    if body.status.is_none() && notes.is_none() {
        return Err(AppError::validation("provide a status or notes").into());
    }

    let id = path.into_inner();
    let report = state
        .repo
        .update_report(id, body.status, notes, admin.id, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found("Report", id))?;
    Ok(ok(report))
}
