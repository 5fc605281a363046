//! Checkout workflow: validate the submitted cart, price it server-side,
//! store the payment receipt, and persist the order with its items.
//!
//! Persistence and receipt storage sit behind [`OrderStore`] and
//! [`ReceiptStore`] so the workflow can be driven without Postgres or a disk.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zina_core::{
    generate_order_number, AppConfig, Cart, CartLine, NewOrder, NewOrderItem, PaymentMethod,
    PricingPolicy, Quote,
};

/// Attempts at generating a fresh order number when the unique index rejects one.
pub const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 3;

const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// Checkout payload as posted by the storefront.
///
/// Every field defaults so that a missing field reaches validation and is
/// reported by name instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    /// Client-computed total. Informational only; totals are recomputed.
    pub total: Option<Decimal>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: String,
    pub customer_whatsapp: Option<String>,
    pub delivery_address: String,
    pub payment_method: String,
    pub payment_receipt: Option<String>,
    pub notes: Option<String>,
    pub discount_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
}

/// A receipt file uploaded alongside the order.
#[derive(Debug, Clone)]
pub struct ReceiptUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_id: i64,
    pub order_number: String,
    pub quote: Quote,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{message}")]
    ValidationFailed {
        field: &'static str,
        message: String,
    },
    #[error("receipt storage unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("order could not be saved: {0}")]
    PersistenceFailed(String),
}

impl CheckoutError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        CheckoutError::ValidationFailed {
            field,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::ValidationFailed { .. } => "validation_error",
            CheckoutError::UpstreamUnavailable(_) => "upstream_unavailable",
            CheckoutError::PersistenceFailed(_) => "internal_error",
        }
    }

    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CheckoutError::ValidationFailed { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Message safe to show to the shopper.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            CheckoutError::ValidationFailed { message, .. } => message.clone(),
            CheckoutError::UpstreamUnavailable(_) => "تعذر رفع إيصال الدفع، حاول مرة أخرى".to_string(),
            CheckoutError::PersistenceFailed(_) => "تعذر حفظ الطلب، حاول مرة أخرى".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OrderInsertError {
    #[error("order number already exists")]
    DuplicateOrderNumber,
    #[error(transparent)]
    Db(#[from] zina_db::DbError),
}

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("receipt is larger than {max_bytes} bytes")]
    TooLarge { max_bytes: usize },
    #[error("unsupported receipt type: {0}")]
    UnsupportedType(String),
    #[error("receipt is empty")]
    Empty,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Writes an order together with its items, all or nothing.
pub trait OrderStore: Send + Sync {
    /// Returns the new order id.
    fn insert_order(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> impl Future<Output = Result<i64, OrderInsertError>> + Send;
}

/// Persists an uploaded receipt and returns its public URL.
pub trait ReceiptStore: Send + Sync {
    fn store(
        &self,
        upload: &ReceiptUpload,
    ) -> impl Future<Output = Result<String, ReceiptError>> + Send;
}

#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: sqlx::PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

impl OrderStore for PgOrderStore {
    async fn insert_order(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<i64, OrderInsertError> {
        match zina_db::create_order_with_items(&self.pool, order, items).await {
            Ok(row) => Ok(row.id),
            Err(e) if e.is_unique_violation() && e.constraint() == Some(ORDER_NUMBER_CONSTRAINT) => {
                Err(OrderInsertError::DuplicateOrderNumber)
            }
            Err(e) => Err(OrderInsertError::Db(e)),
        }
    }
}

/// Stores receipts on local disk under a content-addressed name; the
/// directory is served at `/receipts`.
#[derive(Debug, Clone)]
pub struct LocalReceiptStore {
    config: Arc<AppConfig>,
}

impl LocalReceiptStore {
    #[must_use]
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.config.receipts_dir
    }
}

impl ReceiptStore for LocalReceiptStore {
    async fn store(&self, upload: &ReceiptUpload) -> Result<String, ReceiptError> {
        let extension = receipt_extension(&upload.content_type)?;
        if upload.bytes.is_empty() {
            return Err(ReceiptError::Empty);
        }
        if upload.bytes.len() > self.config.receipt_max_bytes {
            return Err(ReceiptError::TooLarge {
                max_bytes: self.config.receipt_max_bytes,
            });
        }

        let file_name = format!("{:x}.{extension}", Sha256::digest(&upload.bytes));
        tokio::fs::create_dir_all(&self.config.receipts_dir).await?;
        tokio::fs::write(self.config.receipts_dir.join(&file_name), &upload.bytes).await?;

        tracing::info!(
            file = %file_name,
            original = upload.file_name.as_deref().unwrap_or(""),
            bytes = upload.bytes.len(),
            "receipt stored"
        );
        Ok(self.config.receipt_public_url(&file_name))
    }
}

fn receipt_extension(content_type: &str) -> Result<&'static str, ReceiptError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        "application/pdf" => Ok("pdf"),
        _ => Err(ReceiptError::UnsupportedType(content_type.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

struct ValidatedCheckout {
    cart: Cart,
    customer_name: String,
    customer_email: Option<String>,
    customer_phone: String,
    customer_whatsapp: Option<String>,
    delivery_address: String,
    payment_method: PaymentMethod,
    receipt_url: Option<String>,
    notes: Option<String>,
    discount_code: Option<String>,
}

fn required(field: &'static str, value: &str, message: &str) -> Result<String, CheckoutError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CheckoutError::validation(field, message));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// Checks every precondition. Nothing is written before this succeeds.
fn validate(
    request: &CheckoutRequest,
    has_upload: bool,
    policy: &PricingPolicy,
) -> Result<ValidatedCheckout, CheckoutError> {
    if request.items.is_empty() {
        return Err(CheckoutError::validation("items", "السلة فارغة"));
    }

    let mut cart = Cart::new();
    for item in &request.items {
        if item.quantity == 0 {
            return Err(CheckoutError::validation(
                "items",
                format!("الكمية غير صالحة للمنتج {}", item.id),
            ));
        }
        if item.price.is_sign_negative() && !item.price.is_zero() {
            return Err(CheckoutError::validation(
                "items",
                format!("السعر غير صالح للمنتج {}", item.id),
            ));
        }
        let mut line = CartLine::new(item.id, item.name.trim(), item.price)
            .with_quantity(item.quantity);
        if let Some(image) = optional(item.image.as_deref()) {
            line = line.with_image(image);
        }
        cart.add(line);
    }

    let customer_name = required("customerName", &request.customer_name, "الاسم مطلوب")?;
    let customer_phone = required("customerPhone", &request.customer_phone, "رقم الهاتف مطلوب")?;
    let delivery_address = required(
        "deliveryAddress",
        &request.delivery_address,
        "عنوان التوصيل مطلوب",
    )?;

    let payment_method: PaymentMethod = request
        .payment_method
        .trim()
        .parse()
        .map_err(|_| CheckoutError::validation("paymentMethod", "طريقة الدفع غير صالحة"))?;

    let receipt_url = optional(request.payment_receipt.as_deref());
    if payment_method.requires_receipt() && receipt_url.is_none() && !has_upload {
        return Err(CheckoutError::validation(
            "paymentReceipt",
            "إيصال التحويل مطلوب عند الدفع بالتحويل البنكي",
        ));
    }

    let discount_code = optional(request.discount_code.as_deref());
    if policy.discount_status(discount_code.as_deref()).is_invalid() {
        return Err(CheckoutError::validation(
            "discountCode",
            "كود الخصم غير صالح",
        ));
    }

    Ok(ValidatedCheckout {
        cart,
        customer_name,
        customer_email: optional(request.customer_email.as_deref()),
        customer_phone,
        customer_whatsapp: optional(request.customer_whatsapp.as_deref()),
        delivery_address,
        payment_method,
        receipt_url,
        notes: optional(request.notes.as_deref()),
        discount_code,
    })
}

fn receipt_error(err: ReceiptError) -> CheckoutError {
    match err {
        ReceiptError::TooLarge { .. } => {
            CheckoutError::validation("paymentReceipt", "حجم الإيصال كبير جداً")
        }
        ReceiptError::UnsupportedType(_) => {
            CheckoutError::validation("paymentReceipt", "نوع ملف الإيصال غير مدعوم")
        }
        ReceiptError::Empty => CheckoutError::validation("paymentReceipt", "ملف الإيصال فارغ"),
        ReceiptError::Io(e) => {
            tracing::error!(error = %e, "receipt storage failed");
            CheckoutError::UpstreamUnavailable(e.to_string())
        }
    }
}

/// Runs the checkout workflow.
///
/// Steps, strictly in order: validate, price, store the receipt (if one was
/// uploaded), then insert the order and its items in one unit. A duplicate
/// order number is regenerated up to [`MAX_ORDER_NUMBER_ATTEMPTS`] times.
///
/// # Errors
///
/// - [`CheckoutError::ValidationFailed`] before any write when a precondition
///   fails, or when the computed total would be negative.
/// - [`CheckoutError::UpstreamUnavailable`] if the receipt cannot be stored;
///   no order row is written.
/// - [`CheckoutError::PersistenceFailed`] if the insert fails; no order
///   survives.
pub async fn place_order<O, R>(
    orders: &O,
    receipts: &R,
    policy: &PricingPolicy,
    request: CheckoutRequest,
    receipt: Option<ReceiptUpload>,
) -> Result<PlacedOrder, CheckoutError>
where
    O: OrderStore,
    R: ReceiptStore,
{
    let checkout = validate(&request, receipt.is_some(), policy)?;

    let quote = policy
        .quote(&checkout.cart.price_lines(), checkout.discount_code.as_deref())
        .ensure_non_negative()
        .map_err(|e| CheckoutError::validation("total", e.to_string()))?;

    if let Some(client_total) = request.total {
        if client_total != quote.total {
            tracing::warn!(
                client_total = %client_total,
                computed_total = %quote.total,
                "client total differs from computed total; using computed"
            );
        }
    }

    let receipt_url = match &receipt {
        Some(upload) => Some(receipts.store(upload).await.map_err(receipt_error)?),
        None => checkout.receipt_url,
    };

    let items: Vec<NewOrderItem> = checkout
        .cart
        .lines()
        .iter()
        .map(|line| NewOrderItem {
            product_id: line.product_id,
            product_name: line.name.clone(),
            product_image: line.image.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
        .collect();

    let mut order = NewOrder {
        order_number: String::new(),
        customer_name: checkout.customer_name,
        customer_email: checkout.customer_email,
        customer_phone: checkout.customer_phone,
        customer_whatsapp: checkout.customer_whatsapp,
        delivery_address: checkout.delivery_address,
        payment_method: checkout.payment_method,
        receipt_url,
        subtotal: quote.subtotal,
        tax_rate: quote.tax_rate,
        tax_amount: quote.tax,
        discount_code: quote.discount_status.applied_code().map(ToOwned::to_owned),
        discount_amount: quote.discount,
        shipping_amount: quote.shipping,
        total: quote.total,
        notes: checkout.notes,
    };

    for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
        order.order_number = generate_order_number();
        match orders.insert_order(&order, &items).await {
            Ok(order_id) => {
                tracing::info!(
                    order_id,
                    order_number = %order.order_number,
                    items = items.len(),
                    total = %quote.total,
                    "order placed"
                );
                return Ok(PlacedOrder {
                    order_id,
                    order_number: order.order_number,
                    quote,
                });
            }
            Err(OrderInsertError::DuplicateOrderNumber) => {
                tracing::warn!(
                    attempt,
                    order_number = %order.order_number,
                    "order number collision; regenerating"
                );
            }
            Err(OrderInsertError::Db(e)) => {
                tracing::error!(error = %e, "order insert failed");
                return Err(CheckoutError::PersistenceFailed(e.to_string()));
            }
        }
    }

    Err(CheckoutError::PersistenceFailed(format!(
        "no unique order number after {MAX_ORDER_NUMBER_ATTEMPTS} attempts"
    )))
}

#[cfg(test)]
#[path = "checkout_test.rs"]
mod tests;
