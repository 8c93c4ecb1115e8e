//! In-process request metrics
//!
//! Per-operation request/error counters and a latency histogram, updated by
//! the RPC handler on every call. There is no exporter; the server logs a
//! summary when it shuts down.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Histogram bucket boundaries for latency measurements (in microseconds)
const LATENCY_BUCKETS_US: [u64; 8] = [10, 50, 100, 500, 1_000, 5_000, 10_000, 100_000];

/// Operations tracked by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Heartbeat,
    Get,
    Set,
    Delete,
}

impl Op {
    pub const ALL: [Op; 4] = [Op::Heartbeat, Op::Get, Op::Set, Op::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Heartbeat => "heartbeat",
            Op::Get => "get",
            Op::Set => "set",
            Op::Delete => "delete",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter for tracking request counts
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A fixed-bucket latency histogram
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<AtomicU64>,
    sum_us: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            buckets: (0..=LATENCY_BUCKETS_US.len())
                .map(|_| AtomicU64::new(0))
                .collect(),
            sum_us: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record one observation
    pub fn observe(&self, elapsed: Duration) {
        let us = elapsed.as_micros().min(u64::MAX as u128) as u64;
        let idx = LATENCY_BUCKETS_US
            .iter()
            .position(|&bound| us <= bound)
            .unwrap_or(LATENCY_BUCKETS_US.len());

        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
        self.sum_us.fetch_add(us, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Cumulative bucket counts; the last entry is the +Inf bucket.
    pub fn cumulative_buckets(&self) -> Vec<(Option<u64>, u64)> {
        let mut cumulative = 0;
        self.buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| {
                cumulative += bucket.load(Ordering::Relaxed);
                (LATENCY_BUCKETS_US.get(i).copied(), cumulative)
            })
            .collect()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Upper bound of the bucket holding quantile `q` (0.0..=1.0).
    ///
    /// `None` when nothing was observed or the quantile falls in the +Inf
    /// bucket.
    pub fn quantile(&self, q: f64) -> Option<Duration> {
        let buckets = self.cumulative_buckets();
        let total = buckets.last().map_or(0, |&(_, count)| count);
        if total == 0 {
            return None;
        }
        let rank = ((q.clamp(0.0, 1.0) * total as f64).ceil() as u64).max(1);
        buckets
            .into_iter()
            .find(|&(_, count)| count >= rank)
            .and_then(|(bound, _)| bound)
            .map(Duration::from_micros)
    }

    /// Mean latency, zero when nothing was observed
    pub fn mean(&self) -> Duration {
        match self.count() {
            0 => Duration::ZERO,
            n => Duration::from_micros(self.sum_us.load(Ordering::Relaxed) / n),
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics for one operation
#[derive(Debug, Default)]
pub struct OpMetrics {
    pub requests: Counter,
    pub errors: Counter,
    pub latency: Histogram,
}

/// Point-in-time view of one operation's metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpSummary {
    pub op: Op,
    pub requests: u64,
    pub errors: u64,
    pub mean_latency: Duration,
    /// Bucket upper bound; `None` if empty or beyond the largest bucket
    pub p99_latency: Option<Duration>,
}

/// Registry shared by every clone of the RPC handler
#[derive(Debug)]
pub struct MetricsRegistry {
    heartbeat: OpMetrics,
    get: OpMetrics,
    set: OpMetrics,
    delete: OpMetrics,
    start_time: Instant,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            heartbeat: OpMetrics::default(),
            get: OpMetrics::default(),
            set: OpMetrics::default(),
            delete: OpMetrics::default(),
            start_time: Instant::now(),
        }
    }

    pub fn op(&self, op: Op) -> &OpMetrics {
        match op {
            Op::Heartbeat => &self.heartbeat,
            Op::Get => &self.get,
            Op::Set => &self.set,
            Op::Delete => &self.delete,
        }
    }

    /// Record a finished request
    pub fn record(&self, op: Op, elapsed: Duration, success: bool) {
        let metrics = self.op(op);
        metrics.requests.inc();
        metrics.latency.observe(elapsed);
        if !success {
            metrics.errors.inc();
        }
    }

    pub fn total_requests(&self) -> u64 {
        Op::ALL.iter().map(|&op| self.op(op).requests.get()).sum()
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn summary(&self) -> Vec<OpSummary> {
        Op::ALL
            .iter()
            .map(|&op| {
                let m = self.op(op);
                OpSummary {
                    op,
                    requests: m.requests.get(),
                    errors: m.errors.get(),
                    mean_latency: m.latency.mean(),
                    p99_latency: m.latency.quantile(0.99),
                }
            })
            .collect()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
