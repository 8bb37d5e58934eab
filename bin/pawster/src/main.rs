//! # PawSter Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod logging;
mod settings;
mod tasks;

use std::time::Duration;

use actix_web::{web, App, HttpServer};
use pw_api::middleware::{cors_policy, standard_middleware};
use pw_api::{configure_routes, ApiConfig, AppState};
use pw_core::traits::Mailer;
use secrecy::ExposeSecret;

use crate::settings::Settings;

#[cfg(not(all(
    feature = "db-sqlite",
    feature = "auth-simple",
    feature = "mail-smtp",
    feature = "pay-momo"
)))]
compile_error!("pawster needs the db-sqlite, auth-simple, mail-smtp and pay-momo features");

// Feature-gated imports: one implementation per port
#[cfg(feature = "db-sqlite")]
use pw_db_sqlite::SqliteRepo;

#[cfg(feature = "auth-simple")]
use pw_auth_simple::SimpleAuthProvider;

#[cfg(feature = "mail-smtp")]
use pw_mail_smtp::{LogMailer, SmtpMailer};

#[cfg(feature = "pay-momo")]
use pw_pay_momo::{MomoConfig, MomoGateway};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let settings = Settings::load()?;
    logging::init(settings.log_file.as_deref())?;

    // 1. Database (runs pending migrations)
    let repo = SqliteRepo::new(&settings.database_url).await?;

    // 2. Auth
    let auth = SimpleAuthProvider::new(settings.auth.jwt_secret, settings.auth.token_ttl_hours);

    // 3. Mail
    let mailer: Box<dyn Mailer> = match &settings.mail.smtp_url {
        Some(url) => Box::new(SmtpMailer::new(
            url.expose_secret(),
            &settings.mail.from,
            &settings.mail.hostname,
        )?),
        None => {
            log::warn!("mail.smtp_url is not set; outgoing mail will only be logged");
            Box::new(LogMailer)
        }
    };

    // 4. Payments
    let momo = settings.momo;
    let config = ApiConfig {
        pro_monthly_price: momo.monthly_price,
        log_file: settings.log_file,
    };
    let payments = MomoGateway::new(MomoConfig {
        endpoint: momo.endpoint,
        partner_code: momo.partner_code,
        access_key: momo.access_key,
        secret_key: momo.secret_key,
        redirect_url: momo.redirect_url,
        ipn_url: momo.ipn_url,
        request_type: momo.request_type,
        lang: momo.lang,
    });

    // 5. Wrap in AppState
    let state = web::Data::new(AppState {
        repo: Box::new(repo),
        auth: Box::new(auth),
        mailer,
        payments: Box::new(payments),
        config,
    });

    // 6. Pro expiry sweep
    match settings.pro.enforce_interval_secs {
        0 => log::info!("Pro expiry sweep disabled"),
        secs => tasks::spawn_pro_expiry(state.clone(), Duration::from_secs(secs)),
    }

    let cors_origins = settings.cors_origins;
    log::info!("PawSter listening on http://{}:{}", settings.bind, settings.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_policy(&cors_origins))
            .wrap(standard_middleware())
            .configure(configure_routes)
    })
    .bind((settings.bind.as_str(), settings.port))?
    .run()
    .await?;

    Ok(())
}
