//! Background jobs.

use std::time::Duration;

use actix_web::web;
use chrono::Utc;
use pw_api::AppState;
use pw_core::error::Result;
use pw_core::traits::{Repository, UserRepo};

/// Demotes every Pro account whose expiry has passed.
pub async fn sweep_expired_pro(repo: &dyn Repository) -> Result<u64> {
    let modified = repo.expire_pro(Utc::now()).await?;
    if modified > 0 {
        log::info!("Pro expiry sweep: {modified} account(s) expired");
    } else {
        log::debug!("Pro expiry sweep: nothing to do");
    }
    Ok(modified)
}

/// Runs the sweep now and then every `every`.
pub fn spawn_pro_expiry(state: web::Data<AppState>, every: Duration) {
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = sweep_expired_pro(state.repo.as_ref()).await {
                log::warn!("Pro expiry sweep failed: {e}");
            }
        }
    });
}
