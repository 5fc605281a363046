use std::net::SocketAddr;
use std::path::PathBuf;

use rust_decimal::Decimal;

use crate::pricing::{DiscountCode, PricingPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Base URL of the external product/category API. `None` puts the
    /// catalog client in offline mode (sample data for reads).
    pub catalog_api_url: Option<String>,
    pub catalog_timeout_secs: u64,
    pub catalog_user_agent: String,
    /// Public origin of the storefront, without a trailing slash.
    pub site_url: String,
    pub auth_jwt_secret: Option<String>,
    pub auth_jwt_audience: String,
    pub tax_rate: Decimal,
    pub shipping_amount: Decimal,
    pub discount_codes: Vec<DiscountCode>,
    pub receipts_dir: PathBuf,
    pub receipt_max_bytes: usize,
}

impl AppConfig {
    /// Pricing policy applied server-side at checkout.
    #[must_use]
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy::new(self.tax_rate, self.shipping_amount, self.discount_codes.clone())
    }

    /// Redirect target embedded in signup confirmation emails.
    #[must_use]
    pub fn email_confirmation_redirect(&self) -> String {
        format!("{}/auth/callback", self.site_url)
    }

    /// Public URL under which a stored receipt file is served.
    #[must_use]
    pub fn receipt_public_url(&self, file_name: &str) -> String {
        format!("{}/receipts/{file_name}", self.site_url)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("catalog_api_url", &self.catalog_api_url)
            .field("catalog_timeout_secs", &self.catalog_timeout_secs)
            .field("catalog_user_agent", &self.catalog_user_agent)
            .field("site_url", &self.site_url)
            .field(
                "auth_jwt_secret",
                &self.auth_jwt_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("auth_jwt_audience", &self.auth_jwt_audience)
            .field("tax_rate", &self.tax_rate)
            .field("shipping_amount", &self.shipping_amount)
            .field("discount_codes", &self.discount_codes)
            .field("receipts_dir", &self.receipts_dir)
            .field("receipt_max_bytes", &self.receipt_max_bytes)
            .finish()
    }
}
