use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storefront channel identifier.
///
/// The serialized form (`"cafe24"`, `"naver"`, `"coupang"`) is shared by
/// cache files, the combined snapshot and the dashboard API.
///
/// IMPORTANT:
/// - Adding a variant requires a new adapter and a new weekly
///   sales column.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Cafe24,
    Naver,
    Coupang,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Cafe24, Channel::Naver, Channel::Coupang];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Cafe24 => "cafe24",
            Channel::Naver => "naver",
            Channel::Coupang => "coupang",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    /// Orders in these states still need to be shipped.
    pub fn awaits_shipment(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
        )
    }
}

// ------------------------------------------------------------
// Remote session
// ------------------------------------------------------------
//
// One open browser page reachable through the DevTools endpoint.
//
// Field names follow the DevTools `/json` listing so entries can be
// deserialized directly. Sessions are discovered fresh on every
// collection attempt and never persisted.
//
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteSession {
    pub id: String,

    pub url: String,

    #[serde(default)]
    pub title: String,

    /// WebSocket URL of the page's debugging session
    #[serde(rename = "webSocketDebuggerUrl")]
    pub control_endpoint: String,
}

// ------------------------------------------------------------
// Canonical order record
// ------------------------------------------------------------
//
// Normalized across all storefronts.
//
// `order_id` is unique per channel. `ordered_at` keeps the page text
// of the order timestamp; it is parsed into a date only when the
// weekly series is built.
//
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,

    pub channel: Channel,

    pub status: OrderStatus,

    pub customer_name: String,

    pub product_name: String,

    pub quantity: u32,

    /// Order total in the storefront's minor-less currency unit (KRW)
    pub total_amount: i64,

    pub ordered_at: String,
}

/// Per-channel counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub total_orders: i64,
    pub pending_shipments: i64,
    pub total_revenue: i64,
}

// ------------------------------------------------------------
// Channel snapshot
// ------------------------------------------------------------
//
// Produced once per collection cycle per channel and persisted
// to the channel's cache file. A new snapshot overwrites the
// previous cache; no history is kept.
//
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub channel: Channel,

    pub collected_at: DateTime<Utc>,

    pub orders: Vec<OrderRecord>,

    pub summary: ChannelSummary,
}

impl ChannelSnapshot {
    /// Snapshot with no orders and all counters at zero.
    pub fn empty(channel: Channel, collected_at: DateTime<Utc>) -> Self {
        Self {
            channel,
            collected_at,
            orders: Vec::new(),
            summary: ChannelSummary::default(),
        }
    }
}

// ------------------------------------------------------------
// Inventory
// ------------------------------------------------------------
//
// Inventory comes from a provider outside the collection
// pipeline and is passed through unmodified: `status` is kept
// as the provider's label and fields this crate does not know
// are carried along in `extra`.
//
pub const STOCK_NORMAL: &str = "normal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub product_id: String,

    #[serde(default)]
    pub product_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    #[serde(default)]
    pub current_stock: i64,

    #[serde(default)]
    pub reserved_stock: i64,

    #[serde(default)]
    pub available_stock: i64,

    /// "normal", "low", "out_of_stock", or any provider label
    #[serde(default = "default_stock_status")]
    pub status: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InventoryItem {
    /// Anything other than `normal` raises a low-stock alert.
    pub fn needs_attention(&self) -> bool {
        self.status != STOCK_NORMAL
    }
}

fn default_stock_status() -> String {
    STOCK_NORMAL.to_string()
}

// ------------------------------------------------------------
// Combined snapshot
// ------------------------------------------------------------
//
// Derived from the three channel snapshots and rebuilt from
// scratch on every cycle. The file written from this structure
// is the only thing the dashboard API reads.
//
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSnapshot {
    pub summary: DailySummary,

    pub channel_breakdown: Vec<ChannelBreakdown>,

    /// Exactly seven entries, oldest first
    pub weekly_sales: Vec<WeeklySales>,

    /// At most twenty entries
    pub pending_shipments: Vec<PendingShipment>,

    pub inventory: Vec<InventoryItem>,

    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// `YYYY-MM-DD`
    pub date: String,
    pub total_orders: i64,
    pub total_revenue: i64,
    pub pending_shipments: i64,
    pub low_stock_alerts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBreakdown {
    pub channel: Channel,
    pub order_count: i64,
    pub revenue: i64,
    /// Share of total revenue, one decimal place
    pub percentage: f64,
}

/// One day of the trailing weekly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySales {
    /// `MM/DD`
    pub date: String,
    pub cafe24: i64,
    pub naver: i64,
    pub coupang: i64,
    pub total: i64,
}

impl WeeklySales {
    pub fn add(&mut self, channel: Channel, amount: i64) {
        match channel {
            Channel::Cafe24 => self.cafe24 = self.cafe24.saturating_add(amount),
            Channel::Naver => self.naver = self.naver.saturating_add(amount),
            Channel::Coupang => self.coupang = self.coupang.saturating_add(amount),
        }
        self.total = self.total.saturating_add(amount);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingShipment {
    pub order_id: String,
    pub channel: Channel,
    pub product_name: String,
    pub quantity: u32,
    pub ordered_at: String,
    pub customer_name: String,
}

impl From<&OrderRecord> for PendingShipment {
    fn from(order: &OrderRecord) -> Self {
        Self {
            order_id: order.order_id.clone(),
            channel: order.channel,
            product_name: order.product_name.clone(),
            quantity: order.quantity,
            ordered_at: order.ordered_at.clone(),
            customer_name: order.customer_name.clone(),
        }
    }
}
