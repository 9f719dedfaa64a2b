//! Combination of channel snapshots into the dashboard snapshot.
//!
//! `combine` is pure: same snapshots, inventory and day give the same
//! result. `publish` is the only side effect of a cycle.

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{
    schema::{
        ChannelBreakdown, ChannelSnapshot, CombinedSnapshot, DailySummary, InventoryItem,
        PendingShipment, WeeklySales,
    },
    store, util,
};

/// Maximum entries in the combined pending-shipment list
pub const PENDING_LIMIT: usize = 20;

/// Length of the trailing sales series, today included
pub const SALES_WINDOW_DAYS: i64 = 7;

/// Merge channel snapshots.
///
/// RULES:
/// - Order counts come from `orders.len()`, revenue from
///   `summary.total_revenue`. Dashboard-only snapshots therefore count
///   revenue but no orders.
/// - Orders with an unparseable `ordered_at` are left out of the weekly
///   series only.
/// - Aggregation does not depend on snapshot order, except for the
///   order of breakdown rows and pending entries.
pub fn combine(
    snapshots: &[ChannelSnapshot],
    inventory: Vec<InventoryItem>,
    today: NaiveDate,
    collected_at: DateTime<Utc>,
) -> CombinedSnapshot {
    let total_orders: i64 = snapshots.iter().map(|s| s.orders.len() as i64).sum();
    let total_revenue = saturating_sum(snapshots.iter().map(|s| s.summary.total_revenue));

    let revenues: Vec<i64> = snapshots.iter().map(|s| s.summary.total_revenue).collect();
    let channel_breakdown = snapshots
        .iter()
        .zip(revenue_shares(&revenues))
        .map(|(s, percentage)| ChannelBreakdown {
            channel: s.channel,
            order_count: s.orders.len() as i64,
            revenue: s.summary.total_revenue,
            percentage,
        })
        .collect();

    let pending_shipments: Vec<PendingShipment> = snapshots
        .iter()
        .flat_map(|s| s.orders.iter())
        .filter(|o| o.status.awaits_shipment())
        .take(PENDING_LIMIT)
        .map(PendingShipment::from)
        .collect();

    // Dashboard-only snapshots report their count in the summary;
    // the listed entries are used when no channel reports one.
    let reported_pending = saturating_sum(snapshots.iter().map(|s| s.summary.pending_shipments));
    let pending_count = if reported_pending > 0 {
        reported_pending
    } else {
        pending_shipments.len() as i64
    };

    let low_stock_alerts = inventory
        .iter()
        .filter(|i| i.needs_attention())
        .count() as i64;

    CombinedSnapshot {
        summary: DailySummary {
            date: today.format("%Y-%m-%d").to_string(),
            total_orders,
            total_revenue,
            pending_shipments: pending_count,
            low_stock_alerts,
        },
        channel_breakdown,
        weekly_sales: weekly_sales(snapshots, today),
        pending_shipments,
        inventory,
        collected_at,
    }
}

/// Replace the combined snapshot file.
pub async fn publish(path: &Path, combined: &CombinedSnapshot) -> anyhow::Result<()> {
    store::write_atomic(path, combined).await
}

/// Revenue share per entry, in percent rounded to one decimal.
///
/// Negative revenues count as zero. All zero when there is no revenue.
/// Each share is rounded on its own, so the sum may be off 100 by a
/// rounding step (three thirds give 99.9).
pub fn revenue_shares(revenues: &[i64]) -> Vec<f64> {
    let clamped: Vec<f64> = revenues.iter().map(|r| (*r).max(0) as f64).collect();
    let total: f64 = clamped.iter().sum();
    if total <= 0.0 {
        return vec![0.0; revenues.len()];
    }

    clamped
        .iter()
        .map(|r| (r * 1000.0 / total).round() / 10.0)
        .collect()
}

/// Sum that pins at `i64::MAX` / `i64::MIN` instead of overflowing.
fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0i64, i64::saturating_add)
}

/// Per-day, per-channel revenue for the trailing window ending today.
pub fn weekly_sales(snapshots: &[ChannelSnapshot], today: NaiveDate) -> Vec<WeeklySales> {
    let days: Vec<NaiveDate> = (0..SALES_WINDOW_DAYS)
        .rev()
        .map(|back| today - Duration::days(back))
        .collect();

    let mut series: Vec<WeeklySales> = days
        .iter()
        .map(|d| WeeklySales {
            date: d.format("%m/%d").to_string(),
            cafe24: 0,
            naver: 0,
            coupang: 0,
            total: 0,
        })
        .collect();

    for order in snapshots.iter().flat_map(|s| s.orders.iter()) {
        let Some(date) = util::parse_order_date(&order.ordered_at) else {
            continue;
        };
        if let Some(idx) = days.iter().position(|d| *d == date) {
            series[idx].add(order.channel, order.total_amount);
        }
    }

    series
}
