//! Order pricing: subtotal, tax, discount, shipping and grand total.
//!
//! All arithmetic is exact `Decimal` arithmetic. Nothing here performs I/O,
//! so a quote can be recomputed every time cart contents change.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single priced line: unit price and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLine {
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl PriceLine {
    #[must_use]
    pub fn new(unit_price: Decimal, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A known discount code and the fraction of the subtotal it removes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,
    /// Fraction in `0..=1`, e.g. `0.18` for 18%.
    pub rate: Decimal,
}

impl DiscountCode {
    #[must_use]
    pub fn new(code: impl Into<String>, rate: Decimal) -> Self {
        Self {
            code: code.into(),
            rate,
        }
    }
}

/// Outcome of the discount-code lookup, reported alongside the totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DiscountStatus {
    NotRequested,
    Applied { code: String, rate: Decimal },
    Invalid { code: String },
}

impl DiscountStatus {
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    /// The code that was applied, if any.
    #[must_use]
    pub fn applied_code(&self) -> Option<&str> {
        match self {
            Self::Applied { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("computed order total is negative: {0}")]
    NegativeTotal(Decimal),
}

/// Priced totals for a set of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub discount_status: DiscountStatus,
}

impl Quote {
    /// Rejects a negative grand total.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeTotal`] when `total < 0`.
    pub fn ensure_non_negative(self) -> Result<Self, PricingError> {
        if self.total.is_sign_negative() && !self.total.is_zero() {
            return Err(PricingError::NegativeTotal(self.total));
        }
        Ok(self)
    }
}

/// Fixed tax rate, flat shipping and the table of known discount codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    tax_rate: Decimal,
    shipping: Decimal,
    discount_codes: Vec<DiscountCode>,
}

impl Default for PricingPolicy {
    /// 14% tax, free shipping, `SAVE18` for 18% off.
    fn default() -> Self {
        Self::new(
            Decimal::new(14, 2),
            Decimal::ZERO,
            vec![DiscountCode::new("SAVE18", Decimal::new(18, 2))],
        )
    }
}

impl PricingPolicy {
    #[must_use]
    pub fn new(tax_rate: Decimal, shipping: Decimal, discount_codes: Vec<DiscountCode>) -> Self {
        Self {
            tax_rate,
            shipping,
            discount_codes,
        }
    }

    #[must_use]
    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Looks up a discount code. Matching is exact and case-sensitive.
    #[must_use]
    pub fn lookup_discount(&self, code: &str) -> Option<&DiscountCode> {
        self.discount_codes.iter().find(|d| d.code == code)
    }

    /// Resolves an optional submitted code into a [`DiscountStatus`].
    ///
    /// A blank code counts as "not requested".
    #[must_use]
    pub fn discount_status(&self, code: Option<&str>) -> DiscountStatus {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            None => DiscountStatus::NotRequested,
            Some(code) => match self.lookup_discount(code) {
                Some(known) => DiscountStatus::Applied {
                    code: known.code.clone(),
                    rate: known.rate,
                },
                None => DiscountStatus::Invalid {
                    code: code.to_string(),
                },
            },
        }
    }

    /// Computes totals for `lines` with an optional discount code.
    ///
    /// `total = subtotal + tax - discount + shipping`. The result is not
    /// clamped; see [`Quote::ensure_non_negative`].
    #[must_use]
    pub fn quote(&self, lines: &[PriceLine], discount_code: Option<&str>) -> Quote {
        let subtotal: Decimal = lines.iter().map(PriceLine::line_total).sum();
        let tax = subtotal * self.tax_rate;
        let discount_status = self.discount_status(discount_code);
        let discount = match &discount_status {
            DiscountStatus::Applied { rate, .. } => subtotal * *rate,
            _ => Decimal::ZERO,
        };
        let total = subtotal + tax - discount + self.shipping;

        Quote {
            subtotal,
            tax_rate: self.tax_rate,
            tax,
            discount,
            shipping: self.shipping,
            total,
            discount_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    #[test]
    fn empty_lines_quote_to_zero_plus_shipping() {
        let policy = PricingPolicy::new(dec("0.14"), dec("25"), vec![]);
        let quote = policy.quote(&[], None);
        assert_eq!(quote.subtotal, Decimal::ZERO);
        assert_eq!(quote.tax, Decimal::ZERO);
        assert_eq!(quote.discount, Decimal::ZERO);
        assert_eq!(quote.total, dec("25"));
        assert_eq!(quote.discount_status, DiscountStatus::NotRequested);
    }

    #[test]
    fn subtotal_and_tax_are_exact_sums() {
        let policy = PricingPolicy::default();
        let lines = [
            PriceLine::new(dec("19.99"), 3),
            PriceLine::new(dec("0.03"), 1),
            PriceLine::new(dec("120.50"), 2),
        ];
        let quote = policy.quote(&lines, None);
        assert_eq!(quote.subtotal, dec("301.00"));
        assert_eq!(quote.tax, dec("42.14"));
        assert_eq!(quote.total, dec("343.14"));
    }

    #[test]
    fn save18_discounts_eighteen_percent() {
        let policy = PricingPolicy::default();
        let quote = policy.quote(&[PriceLine::new(dec("100.00"), 1)], Some("SAVE18"));
        assert_eq!(quote.discount, dec("18.00"));
        assert_eq!(
            quote.discount_status.applied_code(),
            Some("SAVE18"),
            "code should be reported as applied"
        );
    }

    #[test]
    fn unknown_code_is_flagged_and_leaves_total_unchanged() {
        let policy = PricingPolicy::default();
        let lines = [PriceLine::new(dec("100.00"), 1)];
        let plain = policy.quote(&lines, None);
        let wrong = policy.quote(&lines, Some("WRONGCODE"));

        assert_eq!(wrong.discount, Decimal::ZERO);
        assert!(wrong.discount_status.is_invalid());
        assert_eq!(wrong.total, plain.total);
    }

    #[test]
    fn code_matching_is_case_sensitive() {
        let policy = PricingPolicy::default();
        let quote = policy.quote(&[PriceLine::new(dec("10"), 1)], Some("save18"));
        assert!(quote.discount_status.is_invalid());
    }

    #[test]
    fn blank_code_is_not_requested() {
        let policy = PricingPolicy::default();
        let quote = policy.quote(&[PriceLine::new(dec("10"), 1)], Some("  "));
        assert_eq!(quote.discount_status, DiscountStatus::NotRequested);
    }

    #[test]
    fn checkout_scenario_totals() {
        let policy = PricingPolicy::default();
        let quote = policy.quote(&[PriceLine::new(dec("50.00"), 2)], Some("SAVE18"));
        assert_eq!(quote.subtotal, dec("100.00"));
        assert_eq!(quote.tax, dec("14.00"));
        assert_eq!(quote.discount, dec("18.00"));
        assert_eq!(quote.shipping, Decimal::ZERO);
        assert_eq!(quote.total, dec("96.00"));
    }

    #[test]
    fn requoting_after_quantity_change_does_not_accumulate() {
        let policy = PricingPolicy::default();
        let mut lines = vec![PriceLine::new(dec("33.33"), 1)];
        for qty in [2, 5, 1, 3] {
            lines[0].quantity = qty;
            let quote = policy.quote(&lines, None);
            let expected_subtotal = dec("33.33") * Decimal::from(qty);
            assert_eq!(quote.subtotal, expected_subtotal);
            assert_eq!(quote.tax, expected_subtotal * dec("0.14"));
        }
    }

    #[test]
    fn negative_total_is_an_error() {
        let policy = PricingPolicy::new(
            Decimal::ZERO,
            Decimal::ZERO,
            vec![DiscountCode::new("BROKEN", dec("1.5"))],
        );
        let quote = policy.quote(&[PriceLine::new(dec("10"), 1)], Some("BROKEN"));
        assert_eq!(
            quote.ensure_non_negative(),
            Err(PricingError::NegativeTotal(dec("-5.0")))
        );
    }
}
