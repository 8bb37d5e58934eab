use actix_web::web;
use chrono::Utc;
use pw_core::error::AppError;
use pw_core::mail;
use pw_core::models::{FriendRequest, FriendRequestStatus};
use pw_core::traits::{SocialRepo, UserRepo};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::extractors::AuthUser;
use crate::response::{created, ok, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub to_user_id: Uuid,
}

async fn require_request(state: &AppState, id: Uuid) -> Result<FriendRequest, AppError> {
    state
        .repo
        .get_friend_request(id)
        .await?
        .ok_or_else(|| AppError::not_found("FriendRequest", id))
}

/// Accepts a request and tells the requester. Shared with the admin console,
/// which skips the recipient check.
pub(crate) async fn accept_and_notify(
    state: &AppState,
    id: Uuid,
) -> Result<FriendRequest, AppError> {
    let request = state.repo.accept_friend_request(id, Utc::now()).await?;

    let requester = state.repo.get_user(request.from_user_id).await?;
    let accepter = state.repo.get_user(request.to_user_id).await?;
    if let (Some(requester), Some(accepter)) = (requester, accepter) {
        let email = mail::friend_request_accepted(&requester, &accepter);
        if let Err(e) = state.mailer.send(email).await {
            log::warn!("friend accept mail to {} failed: {e}", requester.email);
        }
    }
    Ok(request)
}

pub async fn list_friends(state: web::Data<AppState>, AuthUser(user): AuthUser) -> ApiResult {
    Ok(ok(state.repo.list_friends(user.id).await?))
}

pub async fn remove_friend(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    let friend_id = path.into_inner();
    if !state.repo.remove_friend(user.id, friend_id).await? {
        return Err(AppError::not_found("Friend", friend_id).into());
    }
    Ok(ok(json!({ "userId": friend_id })))
}

/// Pending requests addressed to the caller.
pub async fn list_requests(state: web::Data<AppState>, AuthUser(user): AuthUser) -> ApiResult {
    Ok(ok(state.repo.list_incoming_requests(user.id).await?))
}

pub async fn send_request(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<SendRequest>,
) -> ApiResult {
    let to = body.to_user_id;

    // 1. Sanity
    if to == user.id {
        return Err(AppError::validation("you cannot befriend yourself").into());
    }
    if state.repo.get_user(to).await?.is_none() {
        return Err(AppError::not_found("User", to).into());
    }

    // 2. State checks
    if state.repo.are_friends(user.id, to).await? {
        return Err(AppError::Conflict("already friends".into()).into());
    }
    if state.repo.find_pending_request(user.id, to).await?.is_some() {
        return Err(AppError::Conflict("a friend request is already pending".into()).into());
    }

    // 3. Persist
    let request = FriendRequest {
        id: Uuid::now_v7(),
        from_user_id: user.id,
        to_user_id: to,
        status: FriendRequestStatus::Pending,
        created_at: Utc::now(),
        responded_at: None,
    };
    state.repo.create_friend_request(request.clone()).await?;
    Ok(created(request))
}

pub async fn accept_request(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    let request = require_request(&state, path.into_inner()).await?;
    if request.to_user_id != user.id {
        return Err(AppError::Forbidden("only the recipient can accept this request".into()).into());
    }
    Ok(ok(accept_and_notify(&state, request.id).await?))
}

pub async fn reject_request(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    let request = require_request(&state, path.into_inner()).await?;
    if request.to_user_id != user.id {
        return Err(AppError::Forbidden("only the recipient can reject this request".into()).into());
    }
    Ok(ok(state.repo.reject_friend_request(request.id, Utc::now()).await?))
}
