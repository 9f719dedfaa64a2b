use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use tokio::task::JoinSet;

use crate::{
    collector::{Collector, FallbackReason},
    combiner,
    config::Config,
    devtools::{DevToolsChannel, DevToolsDirectory, ScriptExecutor, SessionDirectory},
    inventory,
    metrics::{METRICS, incr},
    schema::{Channel, ChannelSnapshot, CombinedSnapshot},
    storefronts::get_adapter,
};

/// Runs one full collection cycle against the configured browser.
///
/// Directory and channel are created here, once per cycle, and shared
/// by the collectors of this cycle only.
///
/// FAILURE:
/// - Only publishing the combined snapshot can fail the cycle. The
///   previously published file is then left in place.
///
/// CANCELLATION:
/// - Dropping the returned future aborts the collector tasks, which
///   closes their DevTools connections. Nothing is published.
pub async fn run_cycle(config: &Config) -> anyhow::Result<CombinedSnapshot> {
    let directory: Arc<dyn SessionDirectory> = Arc::new(DevToolsDirectory::new(
        &config.devtools.endpoint,
        Duration::from_millis(config.devtools.request_timeout_ms),
    ));
    let executor: Arc<dyn ScriptExecutor> = Arc::new(DevToolsChannel::new(Duration::from_millis(
        config.devtools.execution_timeout_ms,
    )));

    run_cycle_with(config, directory, executor, Local::now().date_naive()).await
}

pub async fn run_cycle_with(
    config: &Config,
    directory: Arc<dyn SessionDirectory>,
    executor: Arc<dyn ScriptExecutor>,
    today: NaiveDate,
) -> anyhow::Result<CombinedSnapshot> {
    let collectors = build_collectors(config);
    let bound = Duration::from_secs(config.cycle_timeout_secs);

    let snapshots = collect_all(collectors, directory, executor, bound).await;
    let inventory = inventory::load_inventory(config.output.inventory_path.as_deref()).await;
    let combined = combiner::combine(&snapshots, inventory, today, Utc::now());

    if let Err(e) = combiner::publish(&config.output.combined_path, &combined).await {
        incr(&METRICS.cycles_failed);
        return Err(e.context(format!(
            "publish combined snapshot to {}",
            config.output.combined_path.display()
        )));
    }

    incr(&METRICS.cycles_completed);
    log::info!(
        "combined snapshot written to {} (orders={} revenue={} pending={})",
        config.output.combined_path.display(),
        combined.summary.total_orders,
        combined.summary.total_revenue,
        combined.summary.pending_shipments
    );

    Ok(combined)
}

/// Resolve enabled storefronts to collectors.
///
/// Unknown names and repeated channels are skipped with a warning.
pub fn build_collectors(config: &Config) -> Vec<Collector> {
    let mut collectors: Vec<Collector> = Vec::new();

    for cfg in config.storefronts.iter().filter(|s| s.enabled) {
        let Some(adapter) = get_adapter(&cfg.name) else {
            log::warn!("storefront '{}' is not supported", cfg.name);
            continue;
        };

        if collectors.iter().any(|c| c.channel() == adapter.channel()) {
            log::warn!("storefront '{}' configured twice, keeping the first", cfg.name);
            continue;
        }

        collectors.push(Collector::new(adapter, cfg));
    }

    collectors
}

/// Run every collector on its own task and wait for all of them.
///
/// Each collector is bounded by `bound`; one that does not finish in
/// time is cut off and degrades to its cache. The result always has
/// one snapshot per channel, in `Channel::ALL` order. Channels without
/// a collector (disabled, or a task that panicked) get an empty one.
pub async fn collect_all(
    collectors: Vec<Collector>,
    directory: Arc<dyn SessionDirectory>,
    executor: Arc<dyn ScriptExecutor>,
    bound: Duration,
) -> Vec<ChannelSnapshot> {
    let mut tasks = JoinSet::new();

    for collector in collectors {
        let directory = directory.clone();
        let executor = executor.clone();

        tasks.spawn(async move {
            let live = tokio::time::timeout(bound, collector.collect(&*directory, &*executor)).await;
            match live {
                Ok(snapshot) => snapshot,
                Err(_) => collector.fallback(FallbackReason::CycleTimeout).await,
            }
        });
    }

    let mut by_channel: HashMap<Channel, ChannelSnapshot> = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(snapshot) => {
                by_channel.insert(snapshot.channel, snapshot);
            }
            Err(e) => log::error!("collector task failed: {e}"),
        }
    }

    Channel::ALL
        .iter()
        .map(|channel| {
            by_channel
                .remove(channel)
                .unwrap_or_else(|| ChannelSnapshot::empty(*channel, Utc::now()))
        })
        .collect()
}
