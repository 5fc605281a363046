//! Per-account favorites kept by the catalog API. These require a token and
//! have no sample fallback.

use reqwest::Method;
use serde_json::Value;
use zina_core::Product;

use crate::envelope::{decode_records, normalize_collection};
use crate::error::CatalogError;
use crate::types::RemoteProduct;

use super::CatalogClient;

const FLAG_KEYS: [&str; 3] = ["is_favorite", "is_favorited", "favorited"];

impl CatalogClient {
    /// Flips the favorite flag for a product. Returns the new state.
    ///
    /// # Errors
    ///
    /// Transport, status or configuration errors.
    pub async fn toggle_favorite(&self, product_id: i64) -> Result<bool, CatalogError> {
        let request = self.request(Method::POST, &format!("favorites/{product_id}/toggle"))?;
        let body = self.execute(request, "toggle favorite").await?;
        Ok(read_flag(&body, product_id))
    }

    /// # Errors
    ///
    /// Transport, status or configuration errors.
    pub async fn is_favorite(&self, product_id: i64) -> Result<bool, CatalogError> {
        let request = self.request(Method::GET, &format!("favorites/{product_id}"))?;
        let body = self.execute(request, "favorite status").await?;
        Ok(read_flag(&body, product_id))
    }

    /// Products the account has marked as favorite. Records may be products
    /// or favorite rows embedding a `product`.
    ///
    /// # Errors
    ///
    /// Transport, status or configuration errors.
    pub async fn list_favorites(&self) -> Result<Vec<Product>, CatalogError> {
        let request = self.request(Method::GET, "favorites")?;
        let body = self.execute(request, "favorites").await?;
        let records = normalize_collection(body, "favorites")
            .into_iter()
            .map(|record| match record {
                Value::Object(mut map) if map.get("product").is_some_and(Value::is_object) => {
                    map.remove("product").unwrap_or(Value::Null)
                }
                other => other,
            })
            .collect();
        Ok(decode_records::<RemoteProduct>(records, "favorites")
            .into_iter()
            .map(Product::from)
            .collect())
    }
}

fn read_flag(body: &Value, product_id: i64) -> bool {
    let scopes = [Some(body), body.get("data")];
    let flag = scopes
        .into_iter()
        .flatten()
        .find_map(|scope| FLAG_KEYS.iter().find_map(|key| scope.get(*key)?.as_bool()));
    flag.unwrap_or_else(|| {
        tracing::warn!(product_id, "favorite response carried no flag; assuming not favorite");
        false
    })
}
