use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::StorefrontConfig,
    devtools::{ScriptExecutor, SessionDirectory},
    error::{CacheError, ExecutionError, ExecutionKind},
    metrics::{METRICS, add, incr},
    schema::{Channel, ChannelSnapshot},
    storefronts::adapter::StorefrontAdapter,
    store,
};

use super::normalize::{ExtractionResult, normalize};

/// Why live collection did not produce a snapshot.
///
/// Recorded in logs and metrics; never returned to the caller.
#[derive(Debug)]
pub enum FallbackReason {
    SessionNotFound { pattern: String },
    Execution(ExecutionError),
    EmptyExtraction { script: &'static str },
    /// The cycle bound expired before collection finished
    CycleTimeout,
}

impl FallbackReason {
    fn record(&self) {
        match self {
            FallbackReason::SessionNotFound { .. } => incr(&METRICS.sessions_not_found),
            FallbackReason::Execution(e) => match e.kind {
                ExecutionKind::Timeout => incr(&METRICS.execution_timeouts),
                ExecutionKind::Transport => incr(&METRICS.transport_errors),
                ExecutionKind::ScriptException => incr(&METRICS.script_exceptions),
            },
            FallbackReason::EmptyExtraction { .. } => incr(&METRICS.empty_extractions),
            FallbackReason::CycleTimeout => incr(&METRICS.collector_timeouts),
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::SessionNotFound { pattern } => {
                write!(f, "no open tab matching '{pattern}'")
            }
            FallbackReason::Execution(e) => write!(f, "{e}"),
            FallbackReason::EmptyExtraction { script } => {
                write!(f, "{script} script returned no usable data")
            }
            FallbackReason::CycleTimeout => f.write_str("cycle timeout"),
        }
    }
}

/// Collector for one storefront.
///
/// Fallback tiers, in order:
/// 1. live extraction from the storefront's admin tab
/// 2. the channel cache file, returned unmodified
/// 3. an empty snapshot with zero counters
///
/// GUARANTEES:
/// - `collect` never fails
/// - The cache file is only written after a successful live collection
///
/// Directory and executor are passed per call; the collector keeps no
/// connection state between cycles.
pub struct Collector {
    adapter: Arc<dyn StorefrontAdapter>,
    url_pattern: String,
    cache_path: PathBuf,
}

impl Collector {
    pub fn new(adapter: Arc<dyn StorefrontAdapter>, cfg: &StorefrontConfig) -> Self {
        let url_pattern = cfg
            .url_pattern
            .clone()
            .unwrap_or_else(|| adapter.default_url_pattern().to_string());

        Self {
            adapter,
            url_pattern,
            cache_path: cfg.cache_path.clone(),
        }
    }

    pub fn channel(&self) -> Channel {
        self.adapter.channel()
    }

    pub async fn collect(
        &self,
        directory: &dyn SessionDirectory,
        executor: &dyn ScriptExecutor,
    ) -> ChannelSnapshot {
        match self.collect_live(directory, executor).await {
            Ok(snapshot) => {
                incr(&METRICS.live_collections);
                self.store(&snapshot).await;
                snapshot
            }
            Err(reason) => self.fallback(reason).await,
        }
    }

    async fn collect_live(
        &self,
        directory: &dyn SessionDirectory,
        executor: &dyn ScriptExecutor,
    ) -> Result<ChannelSnapshot, FallbackReason> {
        let channel = self.channel();

        let session = directory
            .find_session(&self.url_pattern)
            .await
            .ok_or_else(|| FallbackReason::SessionNotFound {
                pattern: self.url_pattern.clone(),
            })?;

        let script = self.adapter.select_script(&session.url);
        log::info!(
            "[{channel}] tab '{}' found, running {} script",
            session.title,
            script.label
        );

        let value = executor
            .execute(&session, script.expression)
            .await
            .map_err(FallbackReason::Execution)?;

        let normalized = ExtractionResult::from_value(script.kind, value)
            .and_then(|extraction| {
                normalize(extraction, channel, script.default_status, Utc::now())
            })
            .ok_or(FallbackReason::EmptyExtraction {
                script: script.label,
            })?;

        if normalized.dropped > 0 {
            log::warn!(
                "[{channel}] skipped {} records without a usable order_id",
                normalized.dropped
            );
            add(&METRICS.records_dropped, normalized.dropped);
        }

        log::info!(
            "[{channel}] collected {} orders, revenue {}",
            normalized.snapshot.orders.len(),
            normalized.snapshot.summary.total_revenue
        );

        Ok(normalized.snapshot)
    }

    /// Replace the channel cache with a fresh live snapshot.
    ///
    /// A failed write is logged; the live snapshot is still used.
    async fn store(&self, snapshot: &ChannelSnapshot) {
        if let Err(e) = store::write_atomic(&self.cache_path, snapshot).await {
            incr(&METRICS.cache_write_errors);
            log::warn!(
                "[{}] cache write to {} failed: {e:#}",
                self.channel(),
                self.cache_path.display()
            );
        }
    }

    /// Degrade to the cached snapshot, or to an empty one.
    pub async fn fallback(&self, reason: FallbackReason) -> ChannelSnapshot {
        let channel = self.channel();
        reason.record();

        match store::read_snapshot::<ChannelSnapshot>(&self.cache_path).await {
            Ok(cached) if cached.channel == channel => {
                incr(&METRICS.cache_fallbacks);
                log::warn!(
                    "[{channel}] {reason}; using cache from {} ({} orders)",
                    cached.collected_at,
                    cached.orders.len()
                );
                return cached;
            }
            Ok(cached) => {
                incr(&METRICS.cache_corrupt);
                log::warn!(
                    "[{channel}] cache {} holds a {} snapshot, ignoring it",
                    self.cache_path.display(),
                    cached.channel
                );
            }
            Err(CacheError::Miss { .. }) => {}
            Err(e) => {
                if matches!(e, CacheError::Corrupt { .. }) {
                    incr(&METRICS.cache_corrupt);
                }
                log::warn!("[{channel}] {e}");
            }
        }

        incr(&METRICS.zeroed_fallbacks);
        log::warn!("[{channel}] {reason}; no usable cache, reporting empty snapshot");
        ChannelSnapshot::empty(channel, Utc::now())
    }
}
