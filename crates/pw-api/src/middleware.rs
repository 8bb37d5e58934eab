//! pawster/crates/pw-api/src/middleware.rs Middleware
//!
//! Access logging and CORS for the PawSter API.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;

// Returns the access logger for the PawSter API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS for the web client. An empty list allows any origin.
pub fn cors_policy(allowed_origins: &[String]) -> Cors {
    let cors = if allowed_origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}
