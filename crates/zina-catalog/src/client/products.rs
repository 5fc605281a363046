//! Product reads (with sample fallback) and writes.

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use zina_core::Product;

use crate::envelope::{decode_records, normalize_collection};
use crate::error::CatalogError;
use crate::pagination::PageMeta;
use crate::sample::{sample_product, sample_products};
use crate::types::{ImageUpload, ProductDraft, RemoteProduct};

use super::{decode_record, CatalogClient, MAX_PAGES};

/// One page of products with the API's page metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub meta: PageMeta,
}

impl ProductPage {
    fn sample() -> Self {
        Self {
            products: sample_products(),
            meta: PageMeta::single(),
        }
    }
}

impl CatalogClient {
    /// Fetches one page of products (`page` is 1-based; 0 is treated as 1).
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotConfigured`] in offline mode.
    /// - [`CatalogError::Http`] on transport failure.
    /// - [`CatalogError::Status`] on a non-2xx response.
    /// - [`CatalogError::Deserialize`] if the body is not JSON.
    pub async fn try_list_products(&self, page: u32) -> Result<ProductPage, CatalogError> {
        let request = self
            .request(Method::GET, "products")?
            .query(&[("page", page.max(1))]);
        let body = self.execute(request, "products page").await?;

        let meta = PageMeta::from_body(&body);
        let products = decode_records::<RemoteProduct>(normalize_collection(body, "products"), "products")
            .into_iter()
            .map(Product::from)
            .collect();
        Ok(ProductPage { products, meta })
    }

    /// Like [`CatalogClient::try_list_products`], serving the sample catalog
    /// as a single page on any failure.
    pub async fn list_products(&self, page: u32) -> ProductPage {
        if !self.is_configured() {
            return ProductPage::sample();
        }
        match self.try_list_products(page).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(error = %e, page, "catalog product list failed; serving sample products");
                ProductPage::sample()
            }
        }
    }

    /// Walks every page until `current_page >= last_page`.
    ///
    /// All-or-nothing: a failure on any page discards the pages already read.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`CatalogClient::try_list_products`], or
    /// returns [`CatalogError::PaginationLimit`] after [`MAX_PAGES`] pages.
    pub async fn try_fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            if page > MAX_PAGES {
                return Err(CatalogError::PaginationLimit {
                    max_pages: MAX_PAGES,
                });
            }
            let ProductPage { products, meta } = self.try_list_products(page).await?;
            all.extend(products);

            if !meta.has_next() {
                break;
            }
            page = meta.current_page.max(page) + 1;
        }

        Ok(all)
    }

    pub async fn fetch_all_products(&self) -> Vec<Product> {
        if !self.is_configured() {
            return sample_products();
        }
        match self.try_fetch_all_products().await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, "catalog product walk failed; serving sample products");
                sample_products()
            }
        }
    }

    /// Returns `Ok(None)` when the API answers 404.
    ///
    /// # Errors
    ///
    /// As [`CatalogClient::try_list_products`], plus
    /// [`CatalogError::Deserialize`] when the record does not decode.
    pub async fn try_get_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        let request = self.request(Method::GET, &format!("products/{id}"))?;
        match self.execute(request, "product").await {
            Ok(body) => {
                let remote: RemoteProduct = decode_record(body, "product", "product")?;
                Ok(Some(Product::from(remote)))
            }
            Err(CatalogError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn get_product(&self, id: i64) -> Option<Product> {
        if !self.is_configured() {
            return sample_product(id);
        }
        match self.try_get_product(id).await {
            Ok(product) => product,
            Err(e) => {
                tracing::warn!(error = %e, id, "catalog product read failed; serving sample product");
                sample_product(id)
            }
        }
    }

    /// Creates a product. With images the request is `multipart/form-data`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotConfigured`] offline, [`CatalogError::Validation`]
    /// for a rejected field (local or remote), otherwise as
    /// [`CatalogClient::try_list_products`].
    pub async fn create_product(
        &self,
        draft: &ProductDraft,
        images: &[ImageUpload],
    ) -> Result<Product, CatalogError> {
        let request = self.request(Method::POST, "products")?;
        let draft = validated(draft)?;
        let request = if images.is_empty() {
            request.json(&draft)
        } else {
            request.multipart(product_form(&draft, images, false)?)
        };
        let body = self.execute(request, "created product").await?;
        let remote: RemoteProduct = decode_record(body, "product", "created product")?;
        tracing::info!(id = remote.id, "catalog product created");
        Ok(Product::from(remote))
    }

    /// Updates a product. With images the request is a multipart `POST`
    /// carrying `_method=PUT`, since the API only parses files on `POST`.
    ///
    /// # Errors
    ///
    /// As [`CatalogClient::create_product`].
    pub async fn update_product(
        &self,
        id: i64,
        draft: &ProductDraft,
        images: &[ImageUpload],
    ) -> Result<Product, CatalogError> {
        let path = format!("products/{id}");
        let draft = validated(draft)?;
        let request: RequestBuilder = if images.is_empty() {
            self.request(Method::PUT, &path)?.json(&draft)
        } else {
            self.request(Method::POST, &path)?
                .multipart(product_form(&draft, images, true)?)
        };
        let body = self.execute(request, "updated product").await?;
        let remote: RemoteProduct = decode_record(body, "product", "updated product")?;
        tracing::info!(id, "catalog product updated");
        Ok(Product::from(remote))
    }

    /// # Errors
    ///
    /// As [`CatalogClient::try_list_products`].
    pub async fn delete_product(&self, id: i64) -> Result<(), CatalogError> {
        let request = self.request(Method::DELETE, &format!("products/{id}"))?;
        self.execute(request, "deleted product").await?;
        tracing::info!(id, "catalog product deleted");
        Ok(())
    }
}

fn validated(draft: &ProductDraft) -> Result<ProductDraft, CatalogError> {
    let mut draft = draft.clone();
    draft.validate()?;
    Ok(draft)
}

fn product_form(
    draft: &ProductDraft,
    images: &[ImageUpload],
    method_override: bool,
) -> Result<Form, CatalogError> {
    let mut form = Form::new();
    if method_override {
        form = form.text("_method", "PUT");
    }
    for (key, value) in draft.form_fields() {
        form = form.text(key, value);
    }
    for image in images {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        form = form.part("images[]", part);
    }
    Ok(form)
}
