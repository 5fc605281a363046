//! Fixed sample catalog served when the catalog API is not configured or a
//! read fails. The data is deterministic so callers and tests can rely on it.

use rust_decimal::Decimal;
use zina_core::{Category, Product, ProductColor, ProductImage};

struct SampleCategory {
    id: i64,
    name_ar: &'static str,
    name_en: &'static str,
    slug: &'static str,
}

const CATEGORIES: [SampleCategory; 4] = [
    SampleCategory { id: 1, name_ar: "خواتم", name_en: "Rings", slug: "rings" },
    SampleCategory { id: 2, name_ar: "قلادات", name_en: "Necklaces", slug: "necklaces" },
    SampleCategory { id: 3, name_ar: "أساور", name_en: "Bracelets", slug: "bracelets" },
    SampleCategory { id: 4, name_ar: "أقراط", name_en: "Earrings", slug: "earrings" },
];

struct SampleProduct {
    id: i64,
    category_id: i64,
    name_ar: &'static str,
    name_en: &'static str,
    slug: &'static str,
    /// Price in piastres (hundredths).
    price_minor: i64,
    stock: i32,
    featured: bool,
    colors: &'static [(&'static str, &'static str)],
}

const GOLD: (&str, &str) = ("ذهبي", "#c0a062");
const SILVER: (&str, &str) = ("فضي", "#c0c0c0");
const ROSE: (&str, &str) = ("وردي", "#b76e79");

const PRODUCTS: [SampleProduct; 8] = [
    SampleProduct {
        id: 1,
        category_id: 1,
        name_ar: "خاتم فضة كلاسيكي",
        name_en: "Classic Silver Ring",
        slug: "classic-silver-ring",
        price_minor: 12_000,
        stock: 15,
        featured: true,
        colors: &[SILVER],
    },
    SampleProduct {
        id: 2,
        category_id: 1,
        name_ar: "خاتم مطلي بالذهب",
        name_en: "Gold Plated Ring",
        slug: "gold-plated-ring",
        price_minor: 18_500,
        stock: 8,
        featured: false,
        colors: &[GOLD, ROSE],
    },
    SampleProduct {
        id: 3,
        category_id: 2,
        name_ar: "قلادة لؤلؤ",
        name_en: "Pearl Necklace",
        slug: "pearl-necklace",
        price_minor: 34_900,
        stock: 5,
        featured: true,
        colors: &[SILVER],
    },
    SampleProduct {
        id: 4,
        category_id: 2,
        name_ar: "قلادة حرف",
        name_en: "Initial Necklace",
        slug: "initial-necklace",
        price_minor: 15_000,
        stock: 20,
        featured: false,
        colors: &[GOLD, SILVER],
    },
    SampleProduct {
        id: 5,
        category_id: 3,
        name_ar: "سوار سلسلة",
        name_en: "Chain Bracelet",
        slug: "chain-bracelet",
        price_minor: 9_900,
        stock: 12,
        featured: true,
        colors: &[GOLD],
    },
    SampleProduct {
        id: 6,
        category_id: 3,
        name_ar: "سوار خرز",
        name_en: "Beaded Bracelet",
        slug: "beaded-bracelet",
        price_minor: 4_500,
        stock: 0,
        featured: false,
        colors: &[],
    },
    SampleProduct {
        id: 7,
        category_id: 4,
        name_ar: "أقراط حلقية",
        name_en: "Hoop Earrings",
        slug: "hoop-earrings",
        price_minor: 7_500,
        stock: 30,
        featured: false,
        colors: &[GOLD, SILVER, ROSE],
    },
    SampleProduct {
        id: 8,
        category_id: 4,
        name_ar: "أقراط لؤلؤ",
        name_en: "Pearl Studs",
        slug: "pearl-studs",
        price_minor: 11_000,
        stock: 9,
        featured: true,
        colors: &[SILVER],
    },
];

#[must_use]
pub fn sample_categories() -> Vec<Category> {
    CATEGORIES
        .iter()
        .map(|c| Category {
            id: c.id,
            name_ar: c.name_ar.to_string(),
            name_en: c.name_en.to_string(),
            slug: c.slug.to_string(),
            description: None,
            image_url: Some(format!("/images/categories/{}.jpg", c.slug)),
            is_active: true,
        })
        .collect()
}

#[must_use]
pub fn sample_products() -> Vec<Product> {
    PRODUCTS
        .iter()
        .map(|p| Product {
            id: p.id,
            name_ar: p.name_ar.to_string(),
            name_en: p.name_en.to_string(),
            slug: p.slug.to_string(),
            description: None,
            price: Decimal::new(p.price_minor, 2),
            stock_quantity: p.stock,
            category_id: Some(p.category_id),
            is_available: true,
            is_featured: p.featured,
            images: vec![
                ProductImage {
                    url: format!("/images/products/{}-1.jpg", p.slug),
                    is_primary: true,
                    sort_order: 0,
                },
                ProductImage {
                    url: format!("/images/products/{}-2.jpg", p.slug),
                    is_primary: false,
                    sort_order: 1,
                },
            ],
            colors: p
                .colors
                .iter()
                .map(|(name, hex)| ProductColor {
                    name: Some((*name).to_string()),
                    hex: (*hex).to_string(),
                })
                .collect(),
        })
        .collect()
}

#[must_use]
pub fn sample_product(id: i64) -> Option<Product> {
    sample_products().into_iter().find(|p| p.id == id)
}

#[must_use]
pub fn sample_category(id: i64) -> Option<Category> {
    sample_categories().into_iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use zina_core::catalog::{is_valid_hex_color, is_valid_slug};

    use super::*;

    #[test]
    fn samples_are_deterministic() {
        assert_eq!(sample_products(), sample_products());
        assert_eq!(sample_categories(), sample_categories());
    }

    #[test]
    fn every_product_references_a_sample_category() {
        let category_ids: HashSet<i64> = sample_categories().iter().map(|c| c.id).collect();
        for product in sample_products() {
            let category_id = product.category_id.expect("categorized");
            assert!(category_ids.contains(&category_id), "{}", product.slug);
        }
    }

    #[test]
    fn slugs_and_colors_are_well_formed() {
        let products = sample_products();
        let slugs: HashSet<&str> = products.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs.len(), products.len());
        for product in &products {
            assert!(is_valid_slug(&product.slug), "{}", product.slug);
            assert!(product.colors.iter().all(|c| is_valid_hex_color(&c.hex)));
            assert!(product.primary_image().is_some());
        }
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(sample_product(3).map(|p| p.slug), Some("pearl-necklace".to_string()));
        assert!(sample_product(99).is_none());
        assert_eq!(sample_category(4).map(|c| c.name_en), Some("Earrings".to_string()));
    }
}
