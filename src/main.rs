// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:      Configuration structs loaded from JSON
// - schema:      Snapshot, record and session types
// - error:       Execution and cache error types
// - util:        Numeric and date parsing of scraped text
// - devtools:    Page discovery and script execution over CDP
// - storefronts: Storefront adapters (URL patterns + page scripts)
// - collector:   Per-storefront collection with cache fallback
// - store:       Atomic JSON snapshot persistence
// - inventory:   Inventory provider for the combined snapshot
// - combiner:    Aggregation of channel snapshots
// - pipeline:    One collection cycle, end to end
// - metrics:     Process-wide counters
//
mod collector;
mod combiner;
mod config;
mod devtools;
mod error;
mod inventory;
mod metrics;
mod pipeline;
mod schema;
mod store;
mod storefronts;
mod util;

// ------------------------------------------------------------
// External dependencies
// ------------------------------------------------------------

use rustls::crypto::{CryptoProvider, ring};

use config::Config;
use metrics::METRICS;

use std::fs;
use std::time::Duration;

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Initialize cryptography backend (rustls)
// - Load configuration and set up logging
// - Run one collection cycle, or keep running on the
//   configured refresh interval until Ctrl-C
//
// A failed cycle leaves the previously published combined
// snapshot untouched. In one-shot mode the failure becomes
// the process exit status.
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --------------------------------------------------------
    // rustls >= 0.23 requires an explicit CryptoProvider.
    // Page sockets may be wss:// when the browser sits behind
    // a TLS-terminating proxy.
    // --------------------------------------------------------
    CryptoProvider::install_default(ring::default_provider())
        .map_err(|_| anyhow::anyhow!("failed to install rustls CryptoProvider"))?;

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = load_config(&path)?;

    init_logging(config.debug_log());

    log::info!(
        "storefront collector starting: devtools={} storefronts={}",
        config.devtools.endpoint,
        config.storefronts.iter().filter(|s| s.enabled).count()
    );

    let Some(every) = config.refresh_interval_secs else {
        let result = pipeline::run_cycle(&config).await;
        log::info!("{}", METRICS.report());
        return result.map(|_| ());
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(every.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        // Ctrl-C during a cycle drops it: collector tasks are
        // aborted and nothing is published.
        tokio::select! {
            result = pipeline::run_cycle(&config) => {
                if let Err(e) = result {
                    log::error!("collection cycle failed: {e:#}");
                }
                log::info!("{}", METRICS.report());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    log::info!("shutting down");
    Ok(())
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

// ------------------------------------------------------------
// Configuration loader
// ------------------------------------------------------------
//
// Reads a JSON configuration file from disk and deserializes
// it into the strongly typed `Config` structure.
//
fn load_config(path: &str) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read config {path}: {e}"))?;
    let cfg = serde_json::from_str(&data)
        .map_err(|e| anyhow::anyhow!("invalid config {path}: {e}"))?;
    Ok(cfg)
}
