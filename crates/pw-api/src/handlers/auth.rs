use actix_web::web;
use chrono::Utc;
use pw_core::error::AppError;
use pw_core::mail;
use pw_core::models::User;
use pw_core::traits::UserRepo;
use pw_core::validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extractors::AuthUser;
use crate::response::{created, ok, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Creates an account and signs it in.
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> ApiResult {
    let body = body.into_inner();
    let username = body.username.trim().to_string();
    let email = body.email.trim().to_string();

    // 1. Validate
    validate::username(&username)?;
    validate::email(&email)?;
    validate::password(&body.password)?;

    // 2. Persist; the unique indexes report duplicates as Conflict
    let user = User {
        id: Uuid::now_v7(),
        username,
        email,
        password_hash: state.auth.hash_password(&body.password)?,
        display_name: body
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
        bio: None,
        is_admin: false,
        is_pro: false,
        pro_expiry: None,
        created_at: Utc::now(),
    };
    state.repo.create_user(user.clone()).await?;
    log::info!("registered @{} ({})", user.username, user.id);

    // 3. Welcome mail is best effort
    if let Err(e) = state.mailer.send(mail::welcome(&user)).await {
        log::warn!("welcome mail to {} failed: {e}", user.email);
    }

    let token = state.auth.issue_token(&user)?;
    Ok(created(AuthResponse { token, user }))
}

pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult {
    let invalid = || AppError::Unauthorized("invalid credentials".into());

    let user = state
        .repo
        .find_user_by_login(body.login.trim())
        .await?
        .ok_or_else(invalid)?;
    if !state.auth.verify_password(&body.password, &user.password_hash) {
        log::debug!("failed login for @{}", user.username);
        return Err(invalid().into());
    }

    let token = state.auth.issue_token(&user)?;
    Ok(ok(AuthResponse { token, user }))
}

pub async fn me(AuthUser(user): AuthUser) -> ApiResult {
    Ok(ok(user))
}
