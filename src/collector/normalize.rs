//! Validation and normalization of extraction results.
//!
//! Scripts return platform field names and page text. Everything is
//! checked here, at the collector boundary, and turned into canonical
//! records or counters. Nothing untyped leaves this module.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{
    schema::{Channel, ChannelSnapshot, ChannelSummary, OrderRecord, OrderStatus},
    storefronts::adapter::ExtractionKind,
    util,
};

/// Typed script output.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    /// Raw order objects, not yet validated individually
    Records(Vec<Map<String, Value>>),

    Summary(ChannelSummary),
}

impl ExtractionResult {
    /// Validate a script value against the shape the script declares.
    ///
    /// Returns `None` for null, empty, or wrongly shaped values. Array
    /// entries that are not objects are discarded here.
    pub fn from_value(kind: ExtractionKind, value: Value) -> Option<Self> {
        match (kind, value) {
            (ExtractionKind::RecordList, Value::Array(items)) => {
                let records: Vec<_> = items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .collect();
                (!records.is_empty()).then_some(Self::Records(records))
            }
            (ExtractionKind::SummaryObject, Value::Object(map)) if !map.is_empty() => {
                Some(Self::Summary(summary_from_object(&map)))
            }
            _ => None,
        }
    }
}

/// Outcome of normalizing one extraction.
#[derive(Debug)]
pub struct Normalized {
    pub snapshot: ChannelSnapshot,

    /// Records skipped for a missing or duplicate `order_id`
    pub dropped: usize,
}

/// Build a channel snapshot from a validated extraction.
///
/// Returns `None` when a record list loses every record to
/// normalization; that counts as an empty extraction.
pub fn normalize(
    extraction: ExtractionResult,
    channel: Channel,
    default_status: OrderStatus,
    collected_at: DateTime<Utc>,
) -> Option<Normalized> {
    match extraction {
        ExtractionResult::Summary(summary) => Some(Normalized {
            snapshot: ChannelSnapshot {
                channel,
                collected_at,
                orders: Vec::new(),
                summary,
            },
            dropped: 0,
        }),
        ExtractionResult::Records(raw) => {
            let total = raw.len();
            let mut seen = HashSet::new();
            let orders: Vec<OrderRecord> = raw
                .iter()
                .filter_map(|r| normalize_record(r, channel, default_status))
                .filter(|o| seen.insert(o.order_id.clone()))
                .collect();

            if orders.is_empty() {
                return None;
            }

            let summary = summarize(&orders);
            Some(Normalized {
                dropped: total - orders.len(),
                snapshot: ChannelSnapshot {
                    channel,
                    collected_at,
                    orders,
                    summary,
                },
            })
        }
    }
}

// ------------------------------------------------------------
// Field aliases
// ------------------------------------------------------------
//
// Canonical name first, then the names the storefront pages use
// (Naver grid columns, Coupang Wing API fields).
//
const ORDER_ID: &[&str] = &["order_id", "orderId", "productOrderId", "orderNo"];
const STATUS: &[&str] = &["status", "productOrderStatus", "orderStatus"];
const CUSTOMER: &[&str] = &["customer_name", "ordererName", "receiverName", "buyerName"];
const PRODUCT: &[&str] = &["product_name", "productName", "vendorItemName"];
const QUANTITY: &[&str] = &["quantity", "shippingCount", "qty"];
const AMOUNT: &[&str] = &["total_amount", "totalPaymentAmount", "orderPrice", "amount"];
const ORDERED_AT: &[&str] = &["ordered_at", "orderDate", "orderedAt"];

const SUMMARY_ORDERS: &[&str] = &["total_orders", "newOrders", "orderCount"];
const SUMMARY_PENDING: &[&str] = &["pending_shipments", "readyToShip", "shippingCount"];
const SUMMARY_REVENUE: &[&str] = &["total_revenue", "todaySales", "salesAmount"];

static MISSING: Value = Value::Null;

fn field<'a>(raw: &'a Map<String, Value>, names: &[&str]) -> &'a Value {
    names
        .iter()
        .filter_map(|n| raw.get(*n))
        .find(|v| !v.is_null())
        .unwrap_or(&MISSING)
}

fn text(raw: &Map<String, Value>, names: &[&str]) -> String {
    match field(raw, names) {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Normalize one raw record.
///
/// Returns `None` when the record has no `order_id`; every other
/// field falls back to a default.
pub fn normalize_record(
    raw: &Map<String, Value>,
    channel: Channel,
    default_status: OrderStatus,
) -> Option<OrderRecord> {
    let order_id = text(raw, ORDER_ID);
    if order_id.is_empty() {
        return None;
    }

    Some(OrderRecord {
        order_id,
        channel,
        status: parse_status(&text(raw, STATUS)).unwrap_or(default_status),
        customer_name: text(raw, CUSTOMER),
        product_name: text(raw, PRODUCT),
        quantity: util::parse_quantity(field(raw, QUANTITY)),
        total_amount: util::parse_amount(field(raw, AMOUNT)),
        ordered_at: text(raw, ORDERED_AT),
    })
}

fn summary_from_object(raw: &Map<String, Value>) -> ChannelSummary {
    ChannelSummary {
        total_orders: util::parse_amount(field(raw, SUMMARY_ORDERS)),
        pending_shipments: util::parse_amount(field(raw, SUMMARY_PENDING)),
        total_revenue: util::parse_amount(field(raw, SUMMARY_REVENUE)),
    }
}

/// Counters derived from a record list.
pub fn summarize(orders: &[OrderRecord]) -> ChannelSummary {
    ChannelSummary {
        total_orders: orders.len() as i64,
        pending_shipments: orders.iter().filter(|o| o.status.awaits_shipment()).count() as i64,
        total_revenue: orders
            .iter()
            .map(|o| o.total_amount)
            .fold(0, i64::saturating_add),
    }
}

/// Map a status label to the canonical status.
///
/// Understands the canonical names, Naver and Coupang status codes,
/// and the Korean labels shown in admin tables. Labels are checked
/// from most to least specific so "배송준비중" is not read as "배송중".
pub fn parse_status(raw: &str) -> Option<OrderStatus> {
    let label = raw.trim();
    if label.is_empty() {
        return None;
    }

    let code = label.to_ascii_lowercase();
    let by_code = match code.as_str() {
        "pending" | "payment_waiting" | "accept_waiting" => Some(OrderStatus::Pending),
        "confirmed" | "payed" | "paid" | "accept" => Some(OrderStatus::Confirmed),
        "processing" | "instruct" | "preparing" => Some(OrderStatus::Processing),
        "shipped" | "delivering" | "departure" | "none_tracking" => Some(OrderStatus::Shipped),
        "delivered" | "final_delivery" | "purchase_decided" => Some(OrderStatus::Delivered),
        "cancelled" | "canceled" | "cancel" => Some(OrderStatus::Cancelled),
        "returned" | "return" => Some(OrderStatus::Returned),
        _ => None,
    };
    if by_code.is_some() {
        return by_code;
    }

    const LABELS: &[(&str, OrderStatus)] = &[
        ("취소", OrderStatus::Cancelled),
        ("반품", OrderStatus::Returned),
        ("배송완료", OrderStatus::Delivered),
        ("구매확정", OrderStatus::Delivered),
        ("배송준비", OrderStatus::Processing),
        ("발송대기", OrderStatus::Processing),
        ("배송중", OrderStatus::Shipped),
        ("발송완료", OrderStatus::Shipped),
        ("결제완료", OrderStatus::Confirmed),
        ("신규주문", OrderStatus::Confirmed),
        ("발주확인", OrderStatus::Confirmed),
        ("입금전", OrderStatus::Pending),
        ("결제대기", OrderStatus::Pending),
    ];

    LABELS
        .iter()
        .find(|(needle, _)| label.contains(needle))
        .map(|(_, status)| *status)
}
