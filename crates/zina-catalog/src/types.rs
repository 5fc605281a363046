//! Wire types for the external catalog API.
//!
//! Records are decoded leniently: the API has shipped both `name` and
//! `name_ar`/`name_en`, prices as strings or numbers, and images as plain
//! URLs or objects. Everything is converted into the `zina-core` catalog
//! types at this boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use zina_core::catalog::{is_valid_hex_color, is_valid_slug, slugify};
use zina_core::{Category, Product, ProductColor, ProductImage};

use crate::error::CatalogError;

// ---------------------------------------------------------------------------
// Remote records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProduct {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default, alias = "stock")]
    pub stock_quantity: Option<i32>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub images: Vec<RemoteImage>,
    #[serde(default)]
    pub colors: Vec<RemoteColor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RemoteImage {
    Url(String),
    Object {
        #[serde(alias = "path", alias = "image_url")]
        url: String,
        #[serde(default)]
        is_primary: Option<bool>,
        #[serde(default)]
        sort_order: Option<i32>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RemoteColor {
    Hex(String),
    Object {
        #[serde(default)]
        name: Option<String>,
        #[serde(alias = "hex_code", alias = "code")]
        hex: String,
    },
}

impl From<RemoteProduct> for Product {
    fn from(remote: RemoteProduct) -> Self {
        let name_ar = remote
            .name_ar
            .or_else(|| remote.name.clone())
            .unwrap_or_default();
        let name_en = remote
            .name_en
            .or(remote.name)
            .unwrap_or_else(|| name_ar.clone());
        let slug = remote
            .slug
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback_slug(&name_en, "product", remote.id));

        let images = remote
            .images
            .into_iter()
            .zip(0_i32..)
            .map(|(image, index)| match image {
                RemoteImage::Url(url) => ProductImage {
                    url,
                    is_primary: false,
                    sort_order: index,
                },
                RemoteImage::Object {
                    url,
                    is_primary,
                    sort_order,
                } => ProductImage {
                    url,
                    is_primary: is_primary.unwrap_or(false),
                    sort_order: sort_order.unwrap_or(index),
                },
            })
            .collect();

        let colors = remote
            .colors
            .into_iter()
            .map(|color| match color {
                RemoteColor::Hex(hex) => ProductColor { name: None, hex },
                RemoteColor::Object { name, hex } => ProductColor { name, hex },
            })
            .collect();

        Product {
            id: remote.id,
            name_ar,
            name_en,
            slug,
            description: remote.description,
            price: remote.price,
            stock_quantity: remote.stock_quantity.unwrap_or(0).max(0),
            category_id: remote.category_id,
            is_available: remote.is_available.unwrap_or(true),
            is_featured: remote.is_featured.unwrap_or(false),
            images,
            colors,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCategory {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl From<RemoteCategory> for Category {
    fn from(remote: RemoteCategory) -> Self {
        let name_ar = remote
            .name_ar
            .or_else(|| remote.name.clone())
            .unwrap_or_default();
        let name_en = remote
            .name_en
            .or(remote.name)
            .unwrap_or_else(|| name_ar.clone());
        let slug = remote
            .slug
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback_slug(&name_en, "category", remote.id));
        Category {
            id: remote.id,
            name_ar,
            name_en,
            slug,
            description: remote.description,
            image_url: remote.image_url,
            is_active: remote.is_active.unwrap_or(true),
        }
    }
}

fn fallback_slug(name: &str, kind: &str, id: i64) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        format!("{kind}-{id}")
    } else {
        slug
    }
}

/// The account behind a catalog API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteSession {
    pub token: String,
    pub user: Option<RemoteUser>,
}

// ---------------------------------------------------------------------------
// Write payloads
// ---------------------------------------------------------------------------

/// Product fields sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name_ar: String,
    pub name_en: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub colors: Vec<ProductColor>,
}

impl ProductDraft {
    /// Checks the draft before it is sent, filling in a slug derived from the
    /// English name when none was given.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] naming the first offending field.
    pub fn validate(&mut self) -> Result<(), CatalogError> {
        require_text("name_ar", &self.name_ar)?;
        require_text("name_en", &self.name_en)?;
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(invalid("price", "must not be negative"));
        }
        if self.stock_quantity < 0 {
            return Err(invalid("stock_quantity", "must not be negative"));
        }
        if let Some(color) = self.colors.iter().find(|c| !is_valid_hex_color(&c.hex)) {
            return Err(invalid("colors", &format!("invalid hex color {}", color.hex)));
        }
        self.slug = Some(resolve_slug(self.slug.take(), &self.name_en)?);
        Ok(())
    }

    /// Flattens the draft into multipart text fields, using the bracketed
    /// array notation the API expects for colors.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("name_ar".to_string(), self.name_ar.clone()),
            ("name_en".to_string(), self.name_en.clone()),
            ("price".to_string(), self.price.to_string()),
            ("stock_quantity".to_string(), self.stock_quantity.to_string()),
            ("is_available".to_string(), bool_field(self.is_available)),
            ("is_featured".to_string(), bool_field(self.is_featured)),
        ];
        if let Some(slug) = &self.slug {
            fields.push(("slug".to_string(), slug.clone()));
        }
        if let Some(description) = &self.description {
            fields.push(("description".to_string(), description.clone()));
        }
        if let Some(category_id) = self.category_id {
            fields.push(("category_id".to_string(), category_id.to_string()));
        }
        for (index, color) in self.colors.iter().enumerate() {
            fields.push((format!("colors[{index}][hex]"), color.hex.clone()));
            if let Some(name) = &color.name {
                fields.push((format!("colors[{index}][name]"), name.clone()));
            }
        }
        fields
    }
}

/// Category fields sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name_ar: String,
    pub name_en: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CategoryDraft {
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] naming the first offending field.
    pub fn validate(&mut self) -> Result<(), CatalogError> {
        require_text("name_ar", &self.name_ar)?;
        require_text("name_en", &self.name_en)?;
        self.slug = Some(resolve_slug(self.slug.take(), &self.name_en)?);
        Ok(())
    }
}

/// An image file to attach to a product create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn default_true() -> bool {
    true
}

fn bool_field(value: bool) -> String {
    let flag = if value { "1" } else { "0" };
    flag.to_string()
}

fn invalid(field: &str, message: &str) -> CatalogError {
    CatalogError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn require_text(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "is required"));
    }
    Ok(())
}

fn resolve_slug(slug: Option<String>, name_en: &str) -> Result<String, CatalogError> {
    match slug.filter(|s| !s.trim().is_empty()) {
        Some(slug) if is_valid_slug(&slug) => Ok(slug),
        Some(slug) => Err(invalid("slug", &format!("\"{slug}\" is not URL-safe"))),
        None => {
            let derived = slugify(name_en);
            if derived.is_empty() {
                Err(invalid("slug", "cannot be derived from name_en"))
            } else {
                Ok(derived)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn remote_product_accepts_legacy_shape() {
        let remote: RemoteProduct = serde_json::from_value(json!({
            "id": 9,
            "name": "Pearl Earrings",
            "price": "45.50",
            "stock": 3,
            "images": ["/a.jpg", "/b.jpg"],
            "colors": ["#fff"]
        }))
        .expect("decode");
        let product = Product::from(remote);

        assert_eq!(product.name_ar, "Pearl Earrings");
        assert_eq!(product.name_en, "Pearl Earrings");
        assert_eq!(product.slug, "pearl-earrings");
        assert_eq!(product.price, Decimal::new(4550, 2));
        assert_eq!(product.stock_quantity, 3);
        assert!(product.is_available);
        assert_eq!(product.primary_image().map(|i| i.url.as_str()), Some("/a.jpg"));
        assert_eq!(product.colors[0].hex, "#fff");
    }

    #[test]
    fn remote_product_accepts_bilingual_shape() {
        let remote: RemoteProduct = serde_json::from_value(json!({
            "id": 10,
            "name_ar": "سوار ذهبي",
            "name_en": "Gold Bracelet",
            "slug": "gold-bracelet",
            "price": 300,
            "stock_quantity": 0,
            "is_featured": true,
            "images": [
                {"url": "/1.jpg", "sort_order": 2},
                {"path": "/2.jpg", "is_primary": true, "sort_order": 1}
            ],
            "colors": [{"name": "ذهبي", "hex_code": "#c0a062"}]
        }))
        .expect("decode");
        let product = Product::from(remote);

        assert_eq!(product.name_ar, "سوار ذهبي");
        assert!(!product.in_stock());
        assert!(product.is_featured);
        assert_eq!(product.primary_image().map(|i| i.url.as_str()), Some("/2.jpg"));
        assert_eq!(product.colors[0].name.as_deref(), Some("ذهبي"));
    }

    #[test]
    fn arabic_only_names_fall_back_to_id_slug() {
        let remote: RemoteCategory =
            serde_json::from_value(json!({"id": 4, "name": "خواتم"})).expect("decode");
        let category = Category::from(remote);
        assert_eq!(category.slug, "category-4");
        assert!(category.is_active);
    }

    #[test]
    fn product_draft_validation_derives_slug() {
        let mut draft = ProductDraft {
            name_ar: "قلادة".to_string(),
            name_en: "Silver Necklace".to_string(),
            slug: None,
            description: None,
            price: Decimal::new(199, 0),
            stock_quantity: 2,
            category_id: Some(1),
            is_available: true,
            is_featured: false,
            colors: vec![],
        };
        draft.validate().expect("valid draft");
        assert_eq!(draft.slug.as_deref(), Some("silver-necklace"));
    }

    #[test]
    fn product_draft_validation_reports_field() {
        let mut draft = ProductDraft {
            name_ar: "قلادة".to_string(),
            name_en: "Necklace".to_string(),
            slug: Some("Bad Slug".to_string()),
            description: None,
            price: Decimal::new(-1, 0),
            stock_quantity: 0,
            category_id: None,
            is_available: true,
            is_featured: false,
            colors: vec![],
        };
        let err = draft.validate().expect_err("negative price");
        assert!(matches!(err, CatalogError::Validation { ref field, .. } if field == "price"));

        draft.price = Decimal::ONE;
        let err = draft.validate().expect_err("bad slug");
        assert!(matches!(err, CatalogError::Validation { ref field, .. } if field == "slug"));

        draft.slug = None;
        draft.colors = vec![ProductColor {
            name: None,
            hex: "gold".to_string(),
        }];
        let err = draft.validate().expect_err("bad color");
        assert!(matches!(err, CatalogError::Validation { ref field, .. } if field == "colors"));
    }

    #[test]
    fn form_fields_flatten_colors() {
        let draft = ProductDraft {
            name_ar: "خاتم".to_string(),
            name_en: "Ring".to_string(),
            slug: Some("ring".to_string()),
            description: None,
            price: Decimal::new(1050, 2),
            stock_quantity: 1,
            category_id: None,
            is_available: false,
            is_featured: true,
            colors: vec![ProductColor {
                name: Some("فضي".to_string()),
                hex: "#c0c0c0".to_string(),
            }],
        };
        let fields = draft.form_fields();
        let get = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("price"), Some("10.50"));
        assert_eq!(get("is_available"), Some("0"));
        assert_eq!(get("is_featured"), Some("1"));
        assert_eq!(get("colors[0][hex]"), Some("#c0c0c0"));
        assert_eq!(get("colors[0][name]"), Some("فضي"));
        assert_eq!(get("category_id"), None);
    }
}
