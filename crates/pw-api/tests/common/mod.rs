#![allow(dead_code)]

use actix_web::http::header::{HeaderName, AUTHORIZATION};
use actix_web::web;
use chrono::Utc;
use pw_api::{ApiConfig, AppState};
use pw_auth_simple::SimpleAuthProvider;
use pw_core::models::User;
use pw_core::traits::{MockMailer, MockPaymentGateway, UserRepo};
use pw_db_sqlite::SqliteRepo;
use secrecy::SecretString;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse battery";

pub async fn state_with(
    mailer: MockMailer,
    payments: MockPaymentGateway,
    config: ApiConfig,
) -> web::Data<AppState> {
    let repo = SqliteRepo::new("sqlite::memory:")
        .await
        .expect("in-memory database");
    web::Data::new(AppState {
        repo: Box::new(repo),
        auth: Box::new(SimpleAuthProvider::new(
            SecretString::from("test-secret".to_string()),
            1,
        )),
        mailer: Box::new(mailer),
        payments: Box::new(payments),
        config,
    })
}

pub async fn state(mailer: MockMailer, payments: MockPaymentGateway) -> web::Data<AppState> {
    state_with(mailer, payments, ApiConfig::default()).await
}

/// Accepts any number of messages.
pub fn quiet_mailer() -> MockMailer {
    let mut mailer = MockMailer::new();
    mailer.expect_send().returning(|_| Ok(()));
    mailer
}

/// Panics if the handler touches the gateway.
pub fn no_gateway() -> MockPaymentGateway {
    MockPaymentGateway::new()
}

/// Inserts a user directly and signs a token for it.
pub async fn user(state: &AppState, name: &str, is_admin: bool) -> (User, String) {
    let user = User {
        id: Uuid::now_v7(),
        username: name.to_string(),
        email: format!("{name}@example.com"),
        password_hash: state.auth.hash_password(PASSWORD).unwrap(),
        display_name: None,
        bio: None,
        is_admin,
        is_pro: false,
        pro_expiry: None,
        created_at: Utc::now(),
    };
    state.repo.create_user(user.clone()).await.unwrap();
    let token = state.auth.issue_token(&user).unwrap();
    (user, token)
}

pub fn bearer(token: &str) -> (HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}
