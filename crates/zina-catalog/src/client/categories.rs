//! Category reads (with sample fallback) and writes.

use reqwest::Method;
use zina_core::Category;

use crate::envelope::{decode_records, normalize_collection};
use crate::error::CatalogError;
use crate::sample::{sample_categories, sample_category};
use crate::types::{CategoryDraft, RemoteCategory};

use super::{decode_record, CatalogClient};

impl CatalogClient {
    /// # Errors
    ///
    /// [`CatalogError::NotConfigured`] offline, [`CatalogError::Http`],
    /// [`CatalogError::Status`] or [`CatalogError::Deserialize`] otherwise.
    pub async fn try_list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let request = self.request(Method::GET, "categories")?;
        let body = self.execute(request, "categories").await?;
        Ok(
            decode_records::<RemoteCategory>(normalize_collection(body, "categories"), "categories")
                .into_iter()
                .map(Category::from)
                .collect(),
        )
    }

    pub async fn list_categories(&self) -> Vec<Category> {
        if !self.is_configured() {
            return sample_categories();
        }
        match self.try_list_categories().await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!(error = %e, "catalog category list failed; serving sample categories");
                sample_categories()
            }
        }
    }

    /// Returns `Ok(None)` when the API answers 404.
    ///
    /// # Errors
    ///
    /// As [`CatalogClient::try_list_categories`].
    pub async fn try_get_category(&self, id: i64) -> Result<Option<Category>, CatalogError> {
        let request = self.request(Method::GET, &format!("categories/{id}"))?;
        match self.execute(request, "category").await {
            Ok(body) => {
                let remote: RemoteCategory = decode_record(body, "category", "category")?;
                Ok(Some(Category::from(remote)))
            }
            Err(CatalogError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn get_category(&self, id: i64) -> Option<Category> {
        if !self.is_configured() {
            return sample_category(id);
        }
        match self.try_get_category(id).await {
            Ok(category) => category,
            Err(e) => {
                tracing::warn!(error = %e, id, "catalog category read failed; serving sample category");
                sample_category(id)
            }
        }
    }

    /// # Errors
    ///
    /// [`CatalogError::Validation`] for a rejected field, otherwise as
    /// [`CatalogClient::try_list_categories`].
    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, CatalogError> {
        let request = self.request(Method::POST, "categories")?;
        let mut draft = draft.clone();
        draft.validate()?;
        let body = self.execute(request.json(&draft), "created category").await?;
        let remote: RemoteCategory = decode_record(body, "category", "created category")?;
        tracing::info!(id = remote.id, "catalog category created");
        Ok(Category::from(remote))
    }

    /// # Errors
    ///
    /// As [`CatalogClient::create_category`].
    pub async fn update_category(
        &self,
        id: i64,
        draft: &CategoryDraft,
    ) -> Result<Category, CatalogError> {
        let request = self.request(Method::PUT, &format!("categories/{id}"))?;
        let mut draft = draft.clone();
        draft.validate()?;
        let body = self.execute(request.json(&draft), "updated category").await?;
        let remote: RemoteCategory = decode_record(body, "category", "updated category")?;
        tracing::info!(id, "catalog category updated");
        Ok(Category::from(remote))
    }

    /// # Errors
    ///
    /// As [`CatalogClient::try_list_categories`].
    pub async fn delete_category(&self, id: i64) -> Result<(), CatalogError> {
        let request = self.request(Method::DELETE, &format!("categories/{id}"))?;
        self.execute(request, "deleted category").await?;
        tracing::info!(id, "catalog category deleted");
        Ok(())
    }
}
