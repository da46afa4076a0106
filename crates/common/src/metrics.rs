use std::sync::{Arc, OnceLock};

use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

#[derive(Clone, Debug)]
pub struct IoMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    records_read: CounterVec,
    records_written: CounterVec,
    row_groups_read: CounterVec,
    row_groups_skipped: CounterVec,
    task_commits: CounterVec,
    task_aborts: CounterVec,
}

impl IoMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::new()),
        }
    }

    pub fn record_read(&self, scheme: &str, records: u64) {
        self.inner
            .records_read
            .with_label_values(&[scheme])
            .inc_by(records as f64);
    }

    pub fn record_written(&self, scheme: &str, records: u64) {
        self.inner
            .records_written
            .with_label_values(&[scheme])
            .inc_by(records as f64);
    }

    pub fn record_row_groups(&self, scheme: &str, read: u64, skipped: u64) {
        self.inner
            .row_groups_read
            .with_label_values(&[scheme])
            .inc_by(read as f64);
        self.inner
            .row_groups_skipped
            .with_label_values(&[scheme])
            .inc_by(skipped as f64);
    }

    pub fn inc_task_commits(&self, committer: &str) {
        self.inner
            .task_commits
            .with_label_values(&[committer])
            .inc();
    }

    pub fn inc_task_aborts(&self, committer: &str) {
        self.inner
            .task_aborts
            .with_label_values(&[committer])
            .inc();
    }

    pub fn render_prometheus(&self) -> String {
        let metric_families = self.inner.registry.gather();
        let mut out = Vec::new();
        let enc = TextEncoder::new();
        if enc.encode(&metric_families, &mut out).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&out).to_string()
    }
}

impl Default for IoMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsInner {
    fn new() -> Self {
        let registry = Registry::new();
        let records_read = counter_vec(
            &registry,
            "taps_records_read_total",
            "Records produced by scheme sources",
            &["scheme"],
        );
        let records_written = counter_vec(
            &registry,
            "taps_records_written_total",
            "Records consumed by scheme sinks",
            &["scheme"],
        );
        let row_groups_read = counter_vec(
            &registry,
            "taps_row_groups_read_total",
            "Row groups selected for decoding",
            &["scheme"],
        );
        let row_groups_skipped = counter_vec(
            &registry,
            "taps_row_groups_skipped_total",
            "Row groups pruned by predicate statistics",
            &["scheme"],
        );
        let task_commits = counter_vec(
            &registry,
            "taps_task_commits_total",
            "Committed task attempts",
            &["committer"],
        );
        let task_aborts = counter_vec(
            &registry,
            "taps_task_aborts_total",
            "Aborted task attempts",
            &["committer"],
        );

        Self {
            registry,
            records_read,
            records_written,
            row_groups_read,
            row_groups_skipped,
            task_commits,
            task_aborts,
        }
    }
}

fn counter_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let c = CounterVec::new(Opts::new(name, help), labels).expect("counter vec");
    registry
        .register(Box::new(c.clone()))
        .expect("register counter");
    c
}

static GLOBAL_METRICS: OnceLock<IoMetrics> = OnceLock::new();

pub fn global_metrics() -> &'static IoMetrics {
    GLOBAL_METRICS.get_or_init(IoMetrics::new)
}

#[cfg(test)]
mod tests {
    use super::IoMetrics;

    #[test]
    fn renders_all_metric_families() {
        let m = IoMetrics::new();
        m.record_read("KeyValueByteScheme", 3);
        m.record_written("ParquetTBaseScheme", 2);
        m.record_row_groups("ParquetTBaseScheme", 1, 4);
        m.inc_task_commits("FileOutputCommitter");
        m.inc_task_aborts("FileOutputCommitter");
        let text = m.render_prometheus();

        assert!(text.contains("taps_records_read_total"));
        assert!(text.contains("taps_records_written_total"));
        assert!(text.contains("taps_row_groups_read_total"));
        assert!(text.contains("taps_row_groups_skipped_total"));
        assert!(text.contains("taps_task_commits_total"));
        assert!(text.contains("taps_task_aborts_total"));
        assert!(text.contains("KeyValueByteScheme"));
    }
}
