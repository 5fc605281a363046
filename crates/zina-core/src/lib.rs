pub mod app_config;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod orders;
pub mod pricing;

pub use app_config::{AppConfig, Environment};
pub use cart::{Cart, CartLine, Wishlist};
pub use catalog::{Category, Product, ProductColor, ProductImage};
pub use config::{load_app_config, load_app_config_from_env};
pub use orders::{
    generate_order_number, NewOrder, NewOrderItem, OrderStatus, PaymentMethod,
    ORDER_NUMBER_PREFIX,
};
pub use pricing::{DiscountCode, DiscountStatus, PriceLine, PricingError, PricingPolicy, Quote};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid order status: {0}")]
    InvalidOrderStatus(String),
    #[error("invalid payment method: {0}")]
    InvalidPaymentMethod(String),
    #[error("invalid cart snapshot: {0}")]
    InvalidSnapshot(String),
}
