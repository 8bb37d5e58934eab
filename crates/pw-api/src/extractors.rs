//! Request guards for authenticated routes.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use pw_core::error::AppError;
use pw_core::models::User;
use pw_core::traits::UserRepo;

use crate::response::ApiError;
use crate::state::AppState;

/// The caller, resolved from `Authorization: Bearer <token>`.
/// The account must still exist.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// An `AuthUser` whose stored account is an admin. The token's `adm` claim
/// is not trusted on its own since it outlives a demotion.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state =
                state.ok_or_else(|| AppError::Internal("AppState is not registered".into()))?;
            let token =
                token.ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

            let claims = state.auth.verify_token(&token)?;
            let user = state
                .repo
                .get_user(claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthorized("account no longer exists".into()))?;
            Ok::<_, ApiError>(AuthUser(user))
        })
    }
}

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let user = AuthUser::from_request(req, payload);
        Box::pin(async move {
            let AuthUser(user) = user.await?;
            if !user.is_admin {
                return Err(AppError::Forbidden("admin access required".into()).into());
            }
            Ok::<_, ApiError>(AdminUser(user))
        })
    }
}
