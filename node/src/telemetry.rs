// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const MESSAGES_RECEIVED: &str = "graffiti_messages_received_total";
pub const MESSAGES_DROPPED: &str = "graffiti_messages_dropped_total";
pub const WRITES: &str = "graffiti_writes_total";
pub const COLLISIONS: &str = "graffiti_collisions_total";
pub const POLL_TICKS: &str = "graffiti_poll_ticks_total";
pub const REACTION_SNAPSHOTS: &str = "graffiti_reaction_snapshots_total";
pub const MESSAGE_TIP: &str = "graffiti_message_tip";
pub const REACTION_TIP: &str = "graffiti_reaction_tip";

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() {
    init_logging("graffiti_node=debug,tower_http=debug");

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROM_HANDLE.set(handle).is_err() {
                tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
            }
        }
        Err(e) => tracing::warn!("Failed to install Prometheus recorder: {}", e),
    }

    metrics::describe_counter!(MESSAGES_RECEIVED, "Messages delivered to subscribers");
    metrics::describe_counter!(MESSAGES_DROPPED, "Entries dropped for failing decode or signature checks");
    metrics::describe_counter!(WRITES, "Verified slot writes");
    metrics::describe_counter!(COLLISIONS, "Writes lost to a concurrent writer on the same slot");
    metrics::describe_counter!(POLL_TICKS, "Completed poll ticks");
    metrics::describe_counter!(REACTION_SNAPSHOTS, "Reaction snapshots adopted from the stream");
    metrics::describe_gauge!(MESSAGE_TIP, "Locally known tip of the message stream");
    metrics::describe_gauge!(REACTION_TIP, "Locally known tip of the reaction stream");
}

/// Logs only; used by the CLI, which has no metrics endpoint.
pub fn init_logging(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Get the Prometheus handle to render metrics
pub fn render_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
