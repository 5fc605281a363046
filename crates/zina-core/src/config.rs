use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::{AppConfig, Environment};
use crate::pricing::DiscountCode;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_decimal = |var: &str, default: &str| -> Result<Decimal, ConfigError> {
        let raw = or_default(var, default);
        let value = Decimal::from_str(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if value.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("ZINA_ENV", "development"))?;

    let bind_addr_raw = or_default("ZINA_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr =
        bind_addr_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: "ZINA_BIND_ADDR".to_string(),
                reason: e.to_string(),
            })?;
    let log_level = or_default("ZINA_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("ZINA_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("ZINA_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_num("ZINA_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let catalog_api_url = optional("ZINA_CATALOG_API_URL");
    let catalog_timeout_secs = parse_num("ZINA_CATALOG_TIMEOUT_SECS", "15")?;
    let catalog_user_agent = or_default("ZINA_CATALOG_USER_AGENT", "zina/0.1 (storefront)");

    let site_url = or_default("ZINA_SITE_URL", "http://localhost:3000")
        .trim_end_matches('/')
        .to_string();

    let auth_jwt_secret = optional("ZINA_AUTH_JWT_SECRET");
    if auth_jwt_secret.is_none() && env == Environment::Production {
        return Err(ConfigError::MissingEnvVar("ZINA_AUTH_JWT_SECRET".to_string()));
    }
    let auth_jwt_audience = or_default("ZINA_AUTH_JWT_AUDIENCE", "authenticated");

    let tax_rate = parse_decimal("ZINA_TAX_RATE", "0.14")?;
    if tax_rate > Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar {
            var: "ZINA_TAX_RATE".to_string(),
            reason: "must be a fraction between 0 and 1".to_string(),
        });
    }
    let shipping_amount = parse_decimal("ZINA_SHIPPING_AMOUNT", "0")?;
    let discount_codes = parse_discount_codes(&or_default("ZINA_DISCOUNT_CODES", "SAVE18:18"))?;

    let receipts_dir = PathBuf::from(or_default("ZINA_RECEIPTS_DIR", "./uploads/receipts"));
    let receipt_max_bytes = usize::try_from(parse_num("ZINA_RECEIPT_MAX_BYTES", "5242880")?)
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "ZINA_RECEIPT_MAX_BYTES".to_string(),
            reason: e.to_string(),
        })?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        catalog_api_url,
        catalog_timeout_secs,
        catalog_user_agent,
        site_url,
        auth_jwt_secret,
        auth_jwt_audience,
        tax_rate,
        shipping_amount,
        discount_codes,
        receipts_dir,
        receipt_max_bytes,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ZINA_ENV".to_string(),
            reason: format!("expected development, test or production, got '{other}'"),
        }),
    }
}

/// Parses `CODE:PERCENT` pairs separated by commas, e.g. `SAVE18:18,VIP:25`.
fn parse_discount_codes(raw: &str) -> Result<Vec<DiscountCode>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "ZINA_DISCOUNT_CODES".to_string(),
        reason,
    };

    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (code, percent) = entry
                .split_once(':')
                .ok_or_else(|| invalid(format!("'{entry}' is not CODE:PERCENT")))?;
            let percent = Decimal::from_str(percent.trim())
                .map_err(|e| invalid(format!("'{entry}': {e}")))?;
            if percent.is_sign_negative() || percent > Decimal::ONE_HUNDRED {
                return Err(invalid(format!("'{entry}': percent must be within 0..=100")));
            }
            Ok(DiscountCode::new(code.trim(), percent / Decimal::ONE_HUNDRED))
        })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
