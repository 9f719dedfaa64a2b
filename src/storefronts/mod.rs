//! Storefront adapter registry and factory
//!
//! This module provides:
//! - Central registration of all supported storefronts
//! - A factory function to resolve adapters by name
//!
//! All storefront-specific page knowledge (URL patterns, scripts)
//! lives in the adapter modules. Collectors interact exclusively
//! through the `StorefrontAdapter` trait.

pub mod adapter;
mod cafe24;
mod coupang;
mod naver;

use std::sync::Arc;

use adapter::StorefrontAdapter;

/// Returns a storefront adapter instance by name.
///
/// CONTRACT:
/// - `name` MUST match the `storefronts[].name` field in config.json
/// - Names are lowercase and equal to the channel's wire name
///
pub fn get_adapter(name: &str) -> Option<Arc<dyn StorefrontAdapter>> {
    match name {
        "cafe24" => Some(Arc::new(cafe24::Cafe24Adapter)),
        "naver" => Some(Arc::new(naver::NaverAdapter)),
        "coupang" => Some(Arc::new(coupang::CoupangAdapter)),
        _ => None,
    }
}
