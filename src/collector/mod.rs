/// Collector module
///
/// This module groups all logic responsible for:
/// - Collecting one storefront's current data from its admin tab
/// - Validating and normalizing what the page scripts return
/// - Falling back to the channel cache when live collection fails
///
/// Design notes:
/// - Storefront-specific page knowledge MUST NOT live here
///   (it belongs to `storefronts`)
/// - Collectors never fail outward; every failure becomes the
///   next fallback tier
pub mod normalize;
pub mod runner;

pub use runner::{Collector, FallbackReason};
