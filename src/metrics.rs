//! Pipeline metrics.
//!
//! Counters are recorded through the `metrics` facade. Without an installed recorder
//! they are no-ops; `init_metrics` installs a Prometheus exporter when an address is
//! configured.

use crate::pipeline::outcome::{FileOutcome, Phase};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Once;
use tracing::{debug, info, warn};

static INIT: Once = Once::new();

/// Naming convention: report_pipeline_{name}_total
macro_rules! phase_metric {
    (counter, $name:literal) => {
        concat!("report_pipeline_", $name, "_total")
    };
}

const FILES_PROCESSED: &str = phase_metric!(counter, "files_processed");
const RECORDS_WRITTEN: &str = phase_metric!(counter, "records_written");
const OVERWRITES: &str = phase_metric!(counter, "overwrites");

/// Install the Prometheus exporter (if `addr` is set) and describe all metrics. Idempotent.
pub fn init_metrics(addr: Option<SocketAddr>) {
    INIT.call_once(|| {
        let Some(addr) = addr else {
            debug!("No metrics address configured, metrics are not exported");
            return;
        };
        match PrometheusBuilder::new().with_http_listener(addr).install() {
            Ok(()) => {
                info!("Prometheus HTTP exporter started at http://{}/metrics", addr);
                register_all_metrics();
            }
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        }
    });
}

pub fn register_all_metrics() {
    describe_counter!(
        FILES_PROCESSED,
        "Report files handled, labelled by phase and outcome (done, skipped, failed)"
    );
    describe_counter!(
        RECORDS_WRITTEN,
        "Entries written to sanitized files or inserted into the record store"
    );
    describe_counter!(
        OVERWRITES,
        "Existing sanitized files, archives or public files replaced during a run"
    );
}

pub fn record_file_outcome(phase: Phase, outcome: &FileOutcome) {
    counter!(FILES_PROCESSED, "phase" => phase.as_str(), "outcome" => outcome.label()).increment(1);
    if let FileOutcome::Done { entries } = outcome {
        counter!(RECORDS_WRITTEN, "phase" => phase.as_str()).increment(*entries as u64);
    }
}

pub fn record_overwrite(kind: &'static str) {
    counter!(OVERWRITES, "kind" => kind).increment(1);
}
