//! # pw-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.

pub mod admin;
pub mod auth;
pub mod friends;
pub mod payments;
pub mod reports;
pub mod threads;
pub mod users;

use actix_web::HttpResponse;
use pw_core::models::Pagination;
use serde::Deserialize;
use serde_json::json;

use crate::response::ok;

/// `?page=&limit=` plus an optional search term.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }

    /// The search term, ignoring blanks.
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

pub async fn health() -> HttpResponse {
    ok(json!({ "status": "ok" }))
}
