use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct ManagerMetrics {
    pub queries_total: AtomicU64,
    pub queries_slow_total: AtomicU64,
    pub single_results_total: AtomicU64,
    pub non_unique_total: AtomicU64,
    pub writes_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queries_total: u64,
    pub queries_slow_total: u64,
    pub single_results_total: u64,
    pub non_unique_total: u64,
    pub writes_total: u64,
}

impl ManagerMetrics {
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_total: self.queries_total.load(Ordering::Relaxed),
            queries_slow_total: self.queries_slow_total.load(Ordering::Relaxed),
            single_results_total: self.single_results_total.load(Ordering::Relaxed),
            non_unique_total: self.non_unique_total.load(Ordering::Relaxed),
            writes_total: self.writes_total.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_query(&self, collection: &str, duration_ms: u64, slow_query_ms: u64) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        if slow_query_ms > 0 && duration_ms >= slow_query_ms {
            self.queries_slow_total.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                target: crate::logger::METRICS_TARGET,
                "slow query on {collection}: {duration_ms}ms (threshold {slow_query_ms}ms)"
            );
        }
    }

    pub(crate) fn record_writes(&self, n: u64) {
        self.writes_total.fetch_add(n, Ordering::Relaxed);
    }

    /// OpenMetrics-style exposition (no TYPE/HELP lines).
    #[must_use]
    pub fn metrics_text(&self) -> String {
        let m = self.snapshot();
        format!(
            "nexus_column_queries_total {}\n\
             nexus_column_queries_slow_total {}\n\
             nexus_column_single_results_total {}\n\
             nexus_column_non_unique_total {}\n\
             nexus_column_writes_total {}\n",
            m.queries_total,
            m.queries_slow_total,
            m.single_results_total,
            m.non_unique_total,
            m.writes_total,
        )
    }
}
