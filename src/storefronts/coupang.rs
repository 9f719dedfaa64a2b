use crate::schema::{Channel, OrderStatus};

use super::adapter::{ExtractionKind, PageRoute, PageScript, StorefrontAdapter};

/// Coupang Wing adapter
///
/// Wing loads order data through its own XHR API, so the order
/// scripts fetch the JSON the page itself uses (same origin, same
/// session cookies) and return it as-is. The collector resolves
/// the promise by value.
pub struct CoupangAdapter;

const INSTRUCT_SCRIPT: &str = r#"
(async () => {
  const res = await fetch('/tenants/sfl-portal/delivery/management/dashboard/search?status=INSTRUCT', {
    credentials: 'include',
    headers: { 'Accept': 'application/json' }
  });
  if (!res.ok) return null;
  const body = await res.json();
  return (body.content || body.data || []).map((o) => ({
    orderId: o.orderId,
    status: o.status || 'INSTRUCT',
    receiverName: o.receiverName || (o.receiver && o.receiver.name) || '',
    vendorItemName: o.vendorItemName || (o.orderItems && o.orderItems[0] && o.orderItems[0].vendorItemName) || '',
    shippingCount: o.shippingCount || 1,
    orderPrice: o.orderPrice || o.totalPrice || 0,
    orderedAt: o.orderedAt || ''
  }));
})()
"#;

const ORDERS_SCRIPT: &str = r#"
(async () => {
  const res = await fetch('/tenants/sfl-portal/delivery/management/dashboard/search?status=ACCEPT', {
    credentials: 'include',
    headers: { 'Accept': 'application/json' }
  });
  if (!res.ok) return null;
  const body = await res.json();
  return (body.content || body.data || []).map((o) => ({
    orderId: o.orderId,
    status: o.status || '',
    receiverName: o.receiverName || '',
    vendorItemName: o.vendorItemName || '',
    shippingCount: o.shippingCount || 1,
    orderPrice: o.orderPrice || 0,
    orderedAt: o.orderedAt || ''
  }));
})()
"#;

const DASHBOARD_SCRIPT: &str = r#"
(() => {
  const num = (sel) => {
    const el = document.querySelector(sel);
    return el ? el.textContent : '0';
  };
  return {
    orderCount: num('[data-wuic-props*="ORDER"] .count, .order-summary .count'),
    shippingCount: num('[data-wuic-props*="INSTRUCT"] .count, .shipping-summary .count'),
    salesAmount: num('.sales-summary .amount, [class*="sales"] strong')
  };
})()
"#;

const ROUTES: &[PageRoute] = &[
    PageRoute {
        url_contains: "/delivery/management",
        script: PageScript {
            label: "pending",
            kind: ExtractionKind::RecordList,
            default_status: OrderStatus::Processing,
            expression: INSTRUCT_SCRIPT,
        },
    },
    PageRoute {
        url_contains: "/order",
        script: PageScript {
            label: "orders",
            kind: ExtractionKind::RecordList,
            default_status: OrderStatus::Confirmed,
            expression: ORDERS_SCRIPT,
        },
    },
];

impl StorefrontAdapter for CoupangAdapter {
    fn channel(&self) -> Channel {
        Channel::Coupang
    }

    fn default_url_pattern(&self) -> &'static str {
        "wing.coupang.com"
    }

    fn routes(&self) -> &'static [PageRoute] {
        ROUTES
    }

    fn fallback_script(&self) -> PageScript {
        PageScript {
            label: "dashboard",
            kind: ExtractionKind::SummaryObject,
            default_status: OrderStatus::Pending,
            expression: DASHBOARD_SCRIPT,
        }
    }
}
