//! Offline pricing of a cart snapshot.

use std::fmt::Write as _;
use std::path::Path;

use zina_core::{Cart, DiscountStatus, PricingPolicy, Quote};

/// Reads a cart snapshot and prices it.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a cart snapshot, or
/// holds no lines.
pub(crate) fn quote_cart_file(
    path: &Path,
    policy: &PricingPolicy,
    discount: Option<&str>,
) -> anyhow::Result<Quote> {
    let snapshot = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let cart = Cart::restore(&snapshot)?;
    anyhow::ensure!(!cart.is_empty(), "cart in {} is empty", path.display());
    Ok(policy.quote(&cart.price_lines(), discount))
}

pub(crate) fn format_quote(quote: &Quote) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "subtotal  {}", quote.subtotal);
    let _ = writeln!(
        out,
        "tax       {} ({}%)",
        quote.tax,
        (quote.tax_rate * rust_decimal::Decimal::ONE_HUNDRED).normalize()
    );
    match &quote.discount_status {
        DiscountStatus::Applied { code, .. } => {
            let _ = writeln!(out, "discount  -{} ({code})", quote.discount);
        }
        DiscountStatus::Invalid { code } => {
            let _ = writeln!(out, "discount  0 (unknown code {code})");
        }
        DiscountStatus::NotRequested => {}
    }
    if !quote.shipping.is_zero() {
        let _ = writeln!(out, "shipping  {}", quote.shipping);
    }
    let _ = writeln!(out, "total     {}", quote.total);
    out
}
