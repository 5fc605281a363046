//! Order lifecycle types: status machine, payment methods, insert payloads and
//! order-number generation.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const ORDER_NUMBER_PREFIX: &str = "ORD-";
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Lifecycle state of an order.
///
/// `New` is the only initial state. Admins may move an order to any state at
/// any time; the enumeration itself is the only constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    Processing,
    Ready,
    Shipping,
    Completed,
    Cancelled,
    RefundPending,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::New,
        OrderStatus::Processing,
        OrderStatus::Ready,
        OrderStatus::Shipping,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::RefundPending,
        OrderStatus::Refunded,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Processing => "processing",
            OrderStatus::Ready => "ready",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::RefundPending => "refund_pending",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Arabic display label used on invoices and the back-office.
    #[must_use]
    pub fn label_ar(self) -> &'static str {
        match self {
            OrderStatus::New => "جديد",
            OrderStatus::Processing => "قيد المعالجة",
            OrderStatus::Ready => "جاهز",
            OrderStatus::Shipping => "قيد الشحن",
            OrderStatus::Completed => "مكتمل",
            OrderStatus::Cancelled => "ملغي",
            OrderStatus::RefundPending => "بانتظار الاسترداد",
            OrderStatus::Refunded => "مسترد",
        }
    }

    #[must_use]
    pub fn is_initial(self) -> bool {
        self == OrderStatus::New
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::InvalidOrderStatus(s.to_string()))
    }
}

/// How the customer pays. There is no gateway: both are verified by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cash,
    /// Manual bank transfer; a receipt image is mandatory.
    Transfer,
}

impl PaymentMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
        }
    }

    #[must_use]
    pub fn label_ar(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "الدفع عند الاستلام",
            PaymentMethod::Transfer => "تحويل بنكي",
        }
    }

    #[must_use]
    pub fn requires_receipt(self) -> bool {
        self == PaymentMethod::Transfer
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            other => Err(CoreError::InvalidPaymentMethod(other.to_string())),
        }
    }
}

/// Order header as written at checkout. Totals are final once inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: String,
    pub customer_whatsapp: Option<String>,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    pub receipt_url: Option<String>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub discount_code: Option<String>,
    pub discount_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
}

/// Line snapshot taken at checkout, decoupled from the live product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl NewOrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Generates `ORD-<unix millis>-<6 random uppercase alphanumerics>`.
///
/// Uniqueness is probabilistic; the `orders.order_number` unique index is the
/// backstop.
#[must_use]
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ORDER_NUMBER_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{ORDER_NUMBER_PREFIX}{millis}-{suffix}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(
            "shipped".parse::<OrderStatus>(),
            Err(CoreError::InvalidOrderStatus("shipped".to_string()))
        );
        assert!("NEW".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&OrderStatus::RefundPending).expect("serialize");
        assert_eq!(json, "\"refund_pending\"");
        let parsed: OrderStatus = serde_json::from_str("\"shipping\"").expect("deserialize");
        assert_eq!(parsed, OrderStatus::Shipping);
    }

    #[test]
    fn only_new_is_initial_and_three_states_are_terminal() {
        let initial: Vec<_> = OrderStatus::ALL.into_iter().filter(|s| s.is_initial()).collect();
        assert_eq!(initial, vec![OrderStatus::New]);

        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                OrderStatus::Completed,
                OrderStatus::Cancelled,
                OrderStatus::Refunded
            ]
        );
        assert_eq!(OrderStatus::default(), OrderStatus::New);
    }

    #[test]
    fn payment_method_parsing_and_receipt_rule() {
        assert_eq!("cash".parse::<PaymentMethod>(), Ok(PaymentMethod::Cash));
        assert_eq!(
            "transfer".parse::<PaymentMethod>(),
            Ok(PaymentMethod::Transfer)
        );
        assert!("card".parse::<PaymentMethod>().is_err());
        assert!(PaymentMethod::Transfer.requires_receipt());
        assert!(!PaymentMethod::Cash.requires_receipt());
    }

    #[test]
    fn order_number_has_expected_shape() {
        let number = generate_order_number();
        let rest = number.strip_prefix(ORDER_NUMBER_PREFIX).expect("prefix");
        let (millis, suffix) = rest.split_once('-').expect("separator");
        assert!(millis.parse::<i64>().is_ok(), "timestamp part: {millis}");
        assert_eq!(suffix.len(), ORDER_NUMBER_SUFFIX_LEN);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn ten_thousand_order_numbers_are_distinct() {
        let numbers: HashSet<String> = (0..10_000).map(|_| generate_order_number()).collect();
        assert_eq!(numbers.len(), 10_000);
    }

    #[test]
    fn order_item_line_total() {
        let item = NewOrderItem {
            product_id: 7,
            product_name: "قلادة".to_string(),
            product_image: None,
            quantity: 2,
            unit_price: Decimal::new(5000, 2),
        };
        assert_eq!(item.line_total(), Decimal::new(10000, 2));
    }
}
