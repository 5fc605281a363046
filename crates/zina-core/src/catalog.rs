//! Catalog entities shared by the database layer, the external catalog API
//! client and the HTTP surface.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    pub is_primary: bool,
    pub sort_order: i32,
}

/// A color swatch offered for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductColor {
    pub name: Option<String>,
    /// Hex value including the leading `#`, e.g. `"#c0a062"`.
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name_ar: String,
    pub name_en: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Option<i64>,
    pub is_available: bool,
    pub is_featured: bool,
    pub images: Vec<ProductImage>,
    pub colors: Vec<ProductColor>,
}

impl Product {
    /// The image flagged primary, falling back to the first by sort order.
    #[must_use]
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .or_else(|| self.images.iter().min_by_key(|img| img.sort_order))
    }

    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.is_available && self.stock_quantity > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name_ar: String,
    pub name_en: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
}

/// Returns `true` for lowercase ASCII alphanumerics separated by single hyphens.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Builds a URL-safe slug from a (Latin-script) name.
///
/// Non-ASCII characters are dropped, so Arabic-only names produce an empty
/// string; callers should slugify the English name.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Returns `true` for `#rgb` or `#rrggbb` hex colors.
#[must_use]
pub fn is_valid_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
