use crate::schema::{Channel, OrderStatus};

use super::adapter::{ExtractionKind, PageRoute, PageScript, StorefrontAdapter};

/// Naver SmartStore Center adapter
///
/// SmartStore Center is a single-page app; the page is chosen by the
/// URL fragment (`#/naverpay/sale/...`). Grids are rendered from the
/// app state, so the scripts read the grid rows and keep Naver's own
/// field names. Normalization maps them to canonical records.
pub struct NaverAdapter;

const DELIVERY_SCRIPT: &str = r#"
(() => {
  const rows = document.querySelectorAll('[role="row"][data-product-order-id], .tui-grid-body-area tr');
  return Array.from(rows).slice(0, 100).map((row) => {
    const cell = (name) => {
      const el = row.querySelector(`[data-column-name="${name}"]`);
      return el ? el.textContent.trim() : '';
    };
    return {
      productOrderId: row.dataset.productOrderId || cell('productOrderNo'),
      productOrderStatus: cell('productOrderStatus') || '발주확인',
      ordererName: cell('ordererName'),
      productName: cell('productName'),
      quantity: cell('quantity'),
      totalPaymentAmount: cell('totalPaymentAmount'),
      orderDate: cell('orderDate')
    };
  });
})()
"#;

const ORDERS_SCRIPT: &str = r#"
(() => {
  const rows = document.querySelectorAll('[role="row"][data-product-order-id], .tui-grid-body-area tr');
  return Array.from(rows).slice(0, 100).map((row) => {
    const cell = (name) => {
      const el = row.querySelector(`[data-column-name="${name}"]`);
      return el ? el.textContent.trim() : '';
    };
    return {
      productOrderId: row.dataset.productOrderId || cell('productOrderNo'),
      productOrderStatus: cell('productOrderStatus'),
      ordererName: cell('ordererName'),
      productName: cell('productName'),
      quantity: cell('quantity'),
      totalPaymentAmount: cell('totalPaymentAmount'),
      orderDate: cell('orderDate') || cell('paymentDate')
    };
  });
})()
"#;

const DASHBOARD_SCRIPT: &str = r#"
(() => {
  const stat = (key) => {
    const el = document.querySelector(`[data-nclick*="${key}"] .number, [class*="${key}"] strong`);
    return el ? el.textContent : '0';
  };
  return {
    newOrders: stat('newOrder'),
    readyToShip: stat('delivery'),
    todaySales: stat('sales')
  };
})()
"#;

const ROUTES: &[PageRoute] = &[
    PageRoute {
        url_contains: "/naverpay/sale/delivery",
        script: PageScript {
            label: "pending",
            kind: ExtractionKind::RecordList,
            default_status: OrderStatus::Processing,
            expression: DELIVERY_SCRIPT,
        },
    },
    PageRoute {
        url_contains: "/naverpay/sale/",
        script: PageScript {
            label: "orders",
            kind: ExtractionKind::RecordList,
            default_status: OrderStatus::Pending,
            expression: ORDERS_SCRIPT,
        },
    },
];

impl StorefrontAdapter for NaverAdapter {
    fn channel(&self) -> Channel {
        Channel::Naver
    }

    fn default_url_pattern(&self) -> &'static str {
        "sell.smartstore.naver.com"
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
