use actix_web::web;
use pw_core::error::AppError;
use pw_core::models::UserProfile;
use pw_core::traits::UserRepo;
use uuid::Uuid;

use crate::response::{ok, ApiResult};
use crate::state::AppState;

/// Public profile of any user.
pub async fn get_profile(state: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let id = path.into_inner();
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    Ok(ok(UserProfile::from(&user)))
}
