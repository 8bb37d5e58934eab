use std::path::PathBuf;

use pw_core::traits::{AuthProvider, Mailer, PaymentGateway, Repository};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Box<dyn Repository>,
    pub auth: Box<dyn AuthProvider>,
    pub mailer: Box<dyn Mailer>,
    pub payments: Box<dyn PaymentGateway>,
    pub config: ApiConfig,
}

/// Runtime knobs the handlers read.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Price of one month of Pro, in VND
    pub pro_monthly_price: i64,
    /// File served by the admin log viewer
    pub log_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            pro_monthly_price: 49_000,
            log_file: None,
        }
    }
}
