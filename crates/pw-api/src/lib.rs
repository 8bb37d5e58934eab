//! # pw-api
//!
//! The web routing and orchestration layer for PawSter.

pub mod extractors;
pub mod handlers;
pub mod logs;
pub mod middleware;
pub mod response;
pub mod state;

use actix_web::web;
use pw_core::error::AppError;

use crate::handlers::{admin, auth, friends, payments, reports, threads, users};
use crate::response::ApiError;

pub use crate::state::{ApiConfig, AppState};

/// Configures the JSON API.
///
/// # Developer Note
/// Everything is mounted under `/api`; the binary only adds middleware.
/// Extractor failures (bad JSON, bad UUID in a path, bad query string) are
/// turned into the same envelope as handler errors.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::from(AppError::validation(err.to_string())).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::from(AppError::validation(err.to_string())).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::from(AppError::validation(err.to_string())).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .route("/users/{id}", web::get().to(users::get_profile))
            .service(
                web::scope("/threads")
                    .route("", web::get().to(threads::list_threads))
                    .route("", web::post().to(threads::create_thread))
                    .route("/{id}", web::get().to(threads::get_thread))
                    .route("/{id}", web::delete().to(threads::delete_thread))
                    .route("/{id}/comments", web::post().to(threads::add_comment))
                    .route("/{id}/repost", web::post().to(threads::repost))
                    .route("/{id}/repost", web::delete().to(threads::undo_repost)),
            )
            .route("/hashtags/{tag}", web::get().to(threads::by_hashtag))
            .service(
                web::scope("/friends")
                    .route("", web::get().to(friends::list_friends))
                    .route("/requests", web::get().to(friends::list_requests))
                    .route("/requests", web::post().to(friends::send_request))
                    .route("/requests/{id}/accept", web::post().to(friends::accept_request))
                    .route("/requests/{id}/reject", web::post().to(friends::reject_request))
                    .route("/{user_id}", web::delete().to(friends::remove_friend)),
            )
            .route("/reports", web::post().to(reports::create_report))
            .service(
                web::scope("/payments")
                    .route("/momo", web::post().to(payments::create_momo_payment))
                    .route("/momo/ipn", web::post().to(payments::momo_ipn))
                    .route("/{order_id}", web::get().to(payments::get_payment)),
            )
            .service(
                web::scope("/admin")
                    .route("/stats", web::get().to(admin::stats))
                    .route("/threads", web::get().to(admin::list_threads))
                    .route("/threads/{id}", web::delete().to(admin::delete_thread))
                    .route("/users", web::get().to(admin::list_users))
                    .route("/users/{id}/pro", web::patch().to(admin::update_pro))
                    .route("/logs", web::get().to(admin::read_logs))
                    .route("/pro/enforce-expiry", web::post().to(admin::enforce_pro_expiry))
                    .route(
                        "/friend-requests/{id}/accept",
                        web::post().to(admin::accept_friend_request),
                    )
                    .route("/reports", web::get().to(admin::list_reports))
                    .route("/reports/{id}", web::patch().to(admin::update_report)),
            ),
    );
}
