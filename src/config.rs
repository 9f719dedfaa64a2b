use std::path::PathBuf;

use serde::Deserialize;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// This is the top-level configuration structure loaded from
// `config.json`.
//
// It defines:
// - Where the browser DevTools endpoint lives
// - Which storefronts are collected and where their caches go
// - Where the combined snapshot is published
// - Cycle bounds and optional refresh interval
//
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// DevTools endpoint settings
    #[serde(default)]
    pub devtools: DevToolsConfig,

    /// List of storefront configurations
    pub storefronts: Vec<StorefrontConfig>,

    /// Output locations for the combined snapshot
    pub output: OutputConfig,

    /// Upper bound for a single collector inside one cycle
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,

    /// Re-run the cycle on this interval. Runs once when absent.
    pub refresh_interval_secs: Option<u64>,

    /// Optional debug configuration
    pub debug: Option<DebugConfig>,
}

impl Config {
    /// Returns true when debug logging was requested in the config file.
    pub fn debug_log(&self) -> bool {
        self.debug
            .as_ref()
            .is_some_and(|d| d.log.unwrap_or(false))
    }
}

// ------------------------------------------------------------
// DevTools configuration
// ------------------------------------------------------------
//
// The browser is expected to be started with
// `--remote-debugging-port`. The endpoint is the HTTP base URL
// of that port; page listing lives at `{endpoint}/json`.
//
#[derive(Debug, Deserialize, Clone)]
pub struct DevToolsConfig {
    /// HTTP base URL of the DevTools endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bound for one script execution (connect + enable + evaluate)
    #[serde(default = "default_execution_timeout_ms")]
    pub execution_timeout_ms: u64,

    /// Bound for the page listing request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for DevToolsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            execution_timeout_ms: default_execution_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

// ------------------------------------------------------------
// Storefront configuration
// ------------------------------------------------------------
//
// Configuration for a single storefront collector.
//
// IMPORTANT:
// - `name` must match a registered adapter ("cafe24", "naver", "coupang")
// - `cache_path` is owned exclusively by this storefront's collector
//
#[derive(Debug, Deserialize, Clone)]
pub struct StorefrontConfig {
    /// Storefront identifier
    pub name: String,

    /// Enables or disables this storefront at runtime
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Overrides the adapter's default admin URL pattern
    pub url_pattern: Option<String>,

    /// Channel-scoped cache file (ChannelSnapshot JSON)
    pub cache_path: PathBuf,
}

// ------------------------------------------------------------
// Output configuration
// ------------------------------------------------------------
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Shared combined snapshot read by the dashboard API
    pub combined_path: PathBuf,

    /// Inventory list produced outside the pipeline
    pub inventory_path: Option<PathBuf>,
}

// ------------------------------------------------------------
// Debug configuration
// ------------------------------------------------------------
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    /// Raises the default log level to `debug`
    pub log: Option<bool>,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:18800".to_string()
}

fn default_execution_timeout_ms() -> u64 {
    15_000
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_cycle_timeout_secs() -> u64 {
    60
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let raw = r#"{
            "storefronts": [
                { "name": "cafe24", "cache_path": "data/cafe24/orders.json" }
            ],
            "output": { "combined_path": "data/combined/latest.json" }
        }"#;

        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.devtools.endpoint, "http://127.0.0.1:18800");
        assert_eq!(cfg.devtools.execution_timeout_ms, 15_000);
        assert_eq!(cfg.cycle_timeout_secs, 60);
        assert!(cfg.refresh_interval_secs.is_none());
        assert!(cfg.storefronts[0].enabled);
        assert!(cfg.storefronts[0].url_pattern.is_none());
        assert!(!cfg.debug_log());
    }

    #[test]
    fn test_debug_log_flag() {
        let raw = r#"{
            "storefronts": [],
            "output": { "combined_path": "latest.json" },
            "debug": { "log": true }
        }"#;

        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert!(cfg.debug_log());
    }
}
