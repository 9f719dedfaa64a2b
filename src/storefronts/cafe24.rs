use crate::schema::{Channel, OrderStatus};

use super::adapter::{ExtractionKind, PageRoute, PageScript, StorefrontAdapter};

/// Cafe24 admin console adapter
///
/// Pages:
/// - `shipped_begin_list` (배송준비중): pending shipments table
/// - `order_list`: order search results
/// - anything else under `/admin`: dashboard widgets
///
/// Cafe24 renders plain server-side tables, so the scripts read
/// cells by position where no class hook exists.
pub struct Cafe24Adapter;

const PENDING_SCRIPT: &str = r#"
(() => {
  const orders = [];
  document.querySelectorAll('table tbody tr').forEach((row) => {
    const cells = row.querySelectorAll('td');
    if (cells.length < 5 || orders.length >= 50) return;
    const link = row.querySelector('a[href*="order_id"], td a');
    const product = row.querySelector('[class*="product"], td:nth-child(9) a, td:nth-child(10) a');
    const buyer = row.querySelector('td:nth-child(4) a');
    const date = row.querySelector('td:nth-child(2)');
    const amount = row.querySelector('[class*="price"], td:nth-child(14)');
    const id = link ? link.textContent.trim() : '';
    if (!/\d{8}/.test(id)) return;
    orders.push({
      order_id: id,
      product_name: product ? product.textContent.trim().slice(0, 50) : '',
      customer_name: buyer ? buyer.textContent.trim() : '',
      ordered_at: date ? date.textContent.trim().split('(')[0].trim() : '',
      total_amount: amount ? amount.textContent : '0',
      quantity: 1,
      status: 'processing'
    });
  });
  return orders;
})()
"#;

const ORDERS_SCRIPT: &str = r#"
(() => {
  const orders = [];
  const rows = document.querySelectorAll(
    'table tbody tr[class*="order"], .order-list tr, table[class*="order"] tbody tr'
  );
  rows.forEach((row) => {
    if (row.querySelectorAll('td').length < 3 || orders.length >= 50) return;
    const text = (sel) => {
      const el = row.querySelector(sel);
      return el ? el.textContent.trim() : '';
    };
    orders.push({
      order_id: text('a[href*="order"], [class*="order-id"], td:nth-child(2) a'),
      status: text('[class*="status"], .order-status'),
      customer_name: text('[class*="customer"], [class*="buyer"]'),
      product_name: text('[class*="product"]'),
      quantity: text('[class*="qty"], [class*="quantity"]'),
      total_amount: text('[class*="amount"], [class*="price"], [class*="total"]'),
      ordered_at: text('[class*="date"], time')
    });
  });
  return orders;
})()
"#;

const DASHBOARD_SCRIPT: &str = r#"
(() => {
  const count = (sel) => {
    const el = document.querySelector(sel);
    return el ? el.textContent : '0';
  };
  return {
    total_orders: count('.today-order-count, [class*="order"] [class*="count"]'),
    pending_shipments: count('.shipped_begin_count, a[href*="shipped_begin"] strong, [class*="shipping"] [class*="count"]'),
    total_revenue: count('.today-sales, [class*="revenue"], [class*="sales"]')
  };
})()
"#;

const ROUTES: &[PageRoute] = &[
    PageRoute {
        url_contains: "shipped_begin",
        script: PageScript {
            label: "pending",
            kind: ExtractionKind::RecordList,
            default_status: OrderStatus::Processing,
            expression: PENDING_SCRIPT,
        },
    },
    PageRoute {
        url_contains: "order_list",
        script: PageScript {
            label: "orders",
            kind: ExtractionKind::RecordList,
            default_status: OrderStatus::Pending,
            expression: ORDERS_SCRIPT,
        },
    },
];

impl StorefrontAdapter for Cafe24Adapter {
    fn channel(&self) -> Channel {
        Channel::Cafe24
    }

    fn default_url_pattern(&self) -> &'static str {
        "cafe24.com/admin"
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
