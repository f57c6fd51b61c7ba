//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Write operations, labelled by `operation` (store | verify | initialize)
    pub writes_attempted: IntCounterVec,
    pub writes_confirmed: IntCounterVec,
    /// Labelled by `operation` and error `category`
    pub writes_failed: IntCounterVec,
    pub duplicates_rejected: IntCounter,

    // Reads
    pub reports_read: IntCounter,
    pub reports_missing: IntCounter,

    pub rpc_errors: IntCounter,

    // Histograms
    pub rpc_latency: Histogram,
    pub confirm_latency: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let writes_attempted = IntCounterVec::new(
            Opts::new("attest_writes_attempted_total", "Attestation writes attempted"),
            &["operation"],
        )?;

        let writes_confirmed = IntCounterVec::new(
            Opts::new("attest_writes_confirmed_total", "Attestation writes confirmed on the ledger"),
            &["operation"],
        )?;

        let writes_failed = IntCounterVec::new(
            Opts::new("attest_writes_failed_total", "Attestation writes that failed"),
            &["operation", "category"],
        )?;

        let duplicates_rejected = IntCounter::with_opts(Opts::new(
            "attest_duplicates_rejected_total",
            "Stores rejected because the job already has a record",
        ))?;

        let reports_read = IntCounter::with_opts(Opts::new(
            "attest_reports_read_total",
            "Attestation records decoded from the ledger",
        ))?;

        let reports_missing = IntCounter::with_opts(Opts::new(
            "attest_reports_missing_total",
            "Lookups that found no decodable attestation",
        ))?;

        let rpc_errors =
            IntCounter::with_opts(Opts::new("attest_rpc_errors_total", "Failed RPC calls"))?;

        let rpc_latency = Histogram::with_opts(
            HistogramOpts::new("attest_rpc_latency_seconds", "RPC call latency")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        )?;

        let confirm_latency = Histogram::with_opts(
            HistogramOpts::new(
                "attest_confirm_latency_seconds",
                "Broadcast to confirmation latency",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        )?;

        registry.register(Box::new(writes_attempted.clone()))?;
        registry.register(Box::new(writes_confirmed.clone()))?;
        registry.register(Box::new(writes_failed.clone()))?;
        registry.register(Box::new(duplicates_rejected.clone()))?;
        registry.register(Box::new(reports_read.clone()))?;
        registry.register(Box::new(reports_missing.clone()))?;
        registry.register(Box::new(rpc_errors.clone()))?;
        registry.register(Box::new(rpc_latency.clone()))?;
        registry.register(Box::new(confirm_latency.clone()))?;

        Ok(Self {
            registry,
            writes_attempted,
            writes_confirmed,
            writes_failed,
            duplicates_rejected,
            reports_read,
            reports_missing,
            rpc_errors,
            rpc_latency,
            confirm_latency,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_attempt(&self, operation: &str) {
        self.writes_attempted.with_label_values(&[operation]).inc();
    }

    pub fn record_confirmed(&self, operation: &str) {
        self.writes_confirmed.with_label_values(&[operation]).inc();
    }

    pub fn record_failure(&self, operation: &str, category: &str) {
        self.writes_failed
            .with_label_values(&[operation, category])
            .inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_text_includes_labelled_counters() {
        let m = Metrics::new().unwrap();
        m.record_attempt("store");
        m.record_failure("store", "network");
        m.duplicates_rejected.inc();

        let text = m.gather_text().unwrap();
        assert!(text.contains("attest_writes_attempted_total{operation=\"store\"} 1"));
        assert!(text.contains("category=\"network\""));
        assert!(text.contains("attest_duplicates_rejected_total 1"));
    }

    #[test]
    fn test_separate_instances_do_not_share_state() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_confirmed("verify");
        assert_eq!(a.writes_confirmed.with_label_values(&["verify"]).get(), 1);
        assert_eq!(b.writes_confirmed.with_label_values(&["verify"]).get(), 0);
    }
}
