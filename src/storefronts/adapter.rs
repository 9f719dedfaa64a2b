use crate::schema::{Channel, OrderStatus};

/// Shape of the value an extraction script returns.
///
/// IMPORTANT:
/// - Every script must declare exactly one shape
/// - Collectors validate the returned value against it
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionKind {
    /// Array of order-like objects
    RecordList,

    /// Single object with summary counters
    SummaryObject,
}

/// One extraction script and how to read its result.
#[derive(Debug, Clone, Copy)]
pub struct PageScript {
    /// Short name used in logs ("pending", "orders", "dashboard")
    pub label: &'static str,

    pub kind: ExtractionKind,

    /// Status given to records whose status text is not recognised
    pub default_status: OrderStatus,

    /// Page-side expression, evaluated by value
    pub expression: &'static str,
}

/// Static mapping from a URL sub-pattern to a script.
#[derive(Debug, Clone, Copy)]
pub struct PageRoute {
    pub url_contains: &'static str,
    pub script: PageScript,
}

/// StorefrontAdapter is the abstraction layer between:
/// - The generic collector runtime
/// - Storefront-specific admin pages
///
/// Each storefront implementation must:
/// - Name its channel
/// - Provide the default admin URL pattern used to find its tab
/// - Provide page scripts and the static routing between them
///
/// DESIGN GOALS:
/// - Zero storefront-specific logic outside adapters
/// - Script choice is decided from the URL only, never from page content
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - Adapter instances are shared across tasks
///
pub trait StorefrontAdapter: Send + Sync {
    fn channel(&self) -> Channel;

    /// Substring that identifies this storefront's admin tab.
    fn default_url_pattern(&self) -> &'static str;

    /// Routes checked in order against the tab URL.
    fn routes(&self) -> &'static [PageRoute];

    /// Script used when no route matches.
    fn fallback_script(&self) -> PageScript;

    /// Choose the script for a tab URL. First matching route wins.
    fn select_script(&self, url: &str) -> PageScript {
        self.routes()
            .iter()
            .find(|r| url.contains(r.url_contains))
            .map(|r| r.script)
            .unwrap_or_else(|| self.fallback_script())
    }
}
