use actix_web::web;
use chrono::Utc;
use pw_core::error::AppError;
use pw_core::models::{Report, ReportTarget};
use pw_core::traits::{ReportRepo, ThreadRepo, UserRepo};
use pw_core::validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::extractors::AuthUser;
use crate::response::{created, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub target_type: ReportTarget,
    pub target_id: Uuid,
    pub reason: String,
    pub details: Option<String>,
}

/// Owner of the reported object, or NotFound if it does not exist.
async fn target_owner(state: &AppState, target: ReportTarget, id: Uuid) -> Result<Uuid, AppError> {
    match target {
        ReportTarget::User => state
            .repo
            .get_user(id)
            .await?
            .map(|user| user.id)
            .ok_or_else(|| AppError::not_found("User", id)),
        ReportTarget::Thread => state
            .repo
            .get_thread(id)
            .await?
            .map(|view| view.thread.author_id)
            .ok_or_else(|| AppError::not_found("Thread", id)),
        ReportTarget::Comment => state
            .repo
            .get_comment(id)
            .await?
            .map(|comment| comment.author_id)
            .ok_or_else(|| AppError::not_found("Comment", id)),
    }
}

pub async fn create_report(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<CreateReportRequest>,
) -> ApiResult {
    let body = body.into_inner();
    let reason = body.reason.trim().to_string();
    validate::reason(&reason)?;

    if target_owner(&state, body.target_type, body.target_id).await? == user.id {
        let message = match body.target_type {
            ReportTarget::User => "you cannot report yourself".to_string(),
            other => format!("you cannot report your own {other}"),
        };
        return Err(AppError::validation(message).into());
    }

    let report = Report::open(
        user.id,
        body.target_type,
        body.target_id,
        reason,
        body.details.filter(|d| !d.trim().is_empty()),
        Utc::now(),
    );
    state.repo.create_report(report.clone()).await?;
    log::info!(
        "@{} reported {} {}",
        user.username,
        report.target_type,
        report.target_id
    );
    Ok(created(report))
}
