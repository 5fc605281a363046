//! Printable Arabic (RTL) HTML invoice for a single order.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use zina_db::{OrderItemRow, OrderRow};

const STYLE: &str = "body{font-family:Tahoma,Arial,sans-serif;margin:32px;color:#222}\
h1{font-size:22px;margin:0 0 4px}\
table{width:100%;border-collapse:collapse;margin-top:16px}\
th,td{border:1px solid #ccc;padding:8px;text-align:right}\
th{background:#f4f0ea}\
.totals td{border:none;padding:4px 8px}\
.totals .grand td{font-weight:bold;border-top:2px solid #222}\
@media print{body{margin:0}}";

/// Escapes text for use inside HTML element content and attribute values.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `invoice-<order number>.html`, restricted to filename-safe characters.
#[must_use]
pub fn invoice_file_name(order_number: &str) -> String {
    let safe: String = order_number
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    format!("invoice-{safe}.html")
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn percent(rate: Decimal) -> String {
    (rate * Decimal::ONE_HUNDRED).round_dp(2).normalize().to_string()
}

/// Renders the invoice document.
///
/// Stored labels fall back to the raw value when a status or payment method
/// does not parse.
#[must_use]
pub fn render_invoice(order: &OrderRow, items: &[OrderItemRow]) -> String {
    let status = order
        .status()
        .map_or_else(|_| order.status_raw.clone(), |s| s.label_ar().to_string());
    let payment = order.payment_method().map_or_else(
        |_| order.payment_method_raw.clone(),
        |m| m.label_ar().to_string(),
    );

    let mut html = String::with_capacity(4096);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"ar\" dir=\"rtl\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>فاتورة {number}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>فاتورة رقم {number}</h1>\n<p>التاريخ: {date}</p>\n<p>الحالة: {status}</p>\n",
        number = escape_html(&order.order_number),
        date = order.created_at.format("%Y-%m-%d %H:%M"),
        status = escape_html(&status),
    );

    html.push_str("<h2>بيانات العميل</h2>\n<table>\n");
    let mut contact = vec![
        ("الاسم", Some(order.customer_name.as_str())),
        ("البريد الإلكتروني", order.customer_email.as_deref()),
        ("الهاتف", Some(order.customer_phone.as_str())),
        ("واتساب", order.customer_whatsapp.as_deref()),
        ("عنوان التوصيل", Some(order.delivery_address.as_str())),
        ("طريقة الدفع", Some(payment.as_str())),
    ];
    if let Some(notes) = order.notes.as_deref() {
        contact.push(("ملاحظات", Some(notes)));
    }
    for (label, value) in contact.into_iter().filter_map(|(l, v)| v.map(|v| (l, v))) {
        let _ = writeln!(
            html,
            "<tr><th>{label}</th><td>{}</td></tr>",
            escape_html(value)
        );
    }
    html.push_str("</table>\n");

    html.push_str(
        "<h2>المنتجات</h2>\n<table>\n<tr><th>المنتج</th><th>الكمية</th>\
         <th>سعر الوحدة</th><th>الإجمالي</th></tr>\n",
    );
    for item in items {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&item.product_name),
            item.quantity,
            money(item.unit_price),
            money(item.line_total),
        );
    }
    html.push_str("</table>\n<table class=\"totals\">\n");

    let _ = writeln!(
        html,
        "<tr><td>المجموع الفرعي</td><td>{}</td></tr>",
        money(order.subtotal)
    );
    let _ = writeln!(
        html,
        "<tr><td>الضريبة ({}%)</td><td>{}</td></tr>",
        percent(order.tax_rate),
        money(order.tax_amount)
    );
    if !order.discount_amount.is_zero() {
        let code = order.discount_code.as_deref().unwrap_or_default();
        let _ = writeln!(
            html,
            "<tr><td>الخصم {}</td><td>-{}</td></tr>",
            escape_html(code),
            money(order.discount_amount)
        );
    }
    if !order.shipping_amount.is_zero() {
        let _ = writeln!(
            html,
            "<tr><td>الشحن</td><td>{}</td></tr>",
            money(order.shipping_amount)
        );
    }
    let _ = writeln!(
        html,
        "<tr class=\"grand\"><td>الإجمالي</td><td>{}</td></tr>",
        money(order.total)
    );
    html.push_str("</table>\n</body>\n</html>\n");

    html
}
