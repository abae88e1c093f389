//! Fixed-horizon, per-metric sample history (C5).
//!
//! One deque per metric, pruned from the front on every push. A single
//! store-wide `RwLock` serializes writers; readers take a shared lock and
//! binary-search each deque for the first sample at or after `since_ms`.

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use serde_json::{Map, Value};

use ucc_protocol::{decode_monitor_blocks, encode_monitor_blocks, MetricId, MonitorBlock, Sample, ALL_METRICS};

use crate::constants::metrics::{DEFAULT_HORIZON_SECS, MAX_HORIZON_SECS, MIN_HORIZON_SECS};

struct Inner {
    rings: HashMap<MetricId, VecDeque<Sample>>,
    horizon_ms: i64,
}

/// Shared metrics store. Clone-free: always held behind an `Arc` by
/// callers that need to share it across workers and the RPC layer.
pub struct MetricsStore {
    inner: RwLock<Inner>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::with_horizon_secs(DEFAULT_HORIZON_SECS)
    }

    pub fn with_horizon_secs(horizon_secs: i64) -> Self {
        let horizon_secs = horizon_secs.clamp(MIN_HORIZON_SECS, MAX_HORIZON_SECS);
        let mut rings = HashMap::with_capacity(ALL_METRICS.len());
        for metric in ALL_METRICS {
            rings.insert(metric, VecDeque::new());
        }
        Self { inner: RwLock::new(Inner { rings, horizon_ms: horizon_secs * 1000 }) }
    }

    /// Pushes one sample and prunes everything in that ring older than the
    /// horizon relative to `sample.timestamp_ms`.
    pub fn push(&self, metric: MetricId, sample: Sample) {
        let mut inner = self.inner.write();
        let horizon_ms = inner.horizon_ms;
        let ring = inner.rings.entry(metric).or_default();
        ring.push_back(sample);
        let cutoff = sample.timestamp_ms - horizon_ms;
        while matches!(ring.front(), Some(s) if s.timestamp_ms < cutoff) {
            ring.pop_front();
        }
    }

    /// Binary-searches each ring for the first sample with
    /// `timestamp_ms >= since_ms`; metrics with nothing at or after that
    /// point are omitted entirely.
    fn since(&self, since_ms: i64) -> Vec<MonitorBlock> {
        let inner = self.inner.read();
        let mut blocks = Vec::new();
        for metric in ALL_METRICS {
            let Some(ring) = inner.rings.get(&metric) else { continue };
            if ring.is_empty() {
                continue;
            }
            let start = ring.partition_point(|s| s.timestamp_ms < since_ms);
            if start >= ring.len() {
                continue;
            }
            let samples: Vec<Sample> = ring.iter().skip(start).copied().collect();
            if !samples.is_empty() {
                blocks.push(MonitorBlock { metric, samples });
            }
        }
        blocks
    }

    pub fn query_binary(&self, since_ms: i64) -> Vec<u8> {
        encode_monitor_blocks(&self.since(since_ms))
    }

    pub fn query_json(&self, since_ms: i64) -> Value {
        let mut map = Map::new();
        for block in self.since(since_ms) {
            let samples: Vec<Value> = block
                .samples
                .iter()
                .map(|s| Value::Array(vec![Value::from(s.timestamp_ms), Value::from(s.value)]))
                .collect();
            map.insert(block.metric.as_str().to_string(), Value::Array(samples));
        }
        Value::Object(map)
    }

    /// Round-trips through the wire binary format; used by integration
    /// tests that exercise the RPC path end to end.
    #[cfg(test)]
    fn query_binary_decoded(&self, since_ms: i64) -> Vec<MonitorBlock> {
        decode_monitor_blocks(&self.query_binary(since_ms)).unwrap()
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_query_correctness() {
        let store = MetricsStore::new();
        store.push(MetricId::CpuTemp, Sample { timestamp_ms: 1000, value: 55.0 });
        store.push(MetricId::CpuTemp, Sample { timestamp_ms: 2000, value: 56.0 });
        store.push(MetricId::DGpuTemp, Sample { timestamp_ms: 1500, value: 60.0 });

        let blocks = store.query_binary_decoded(1500);
        assert_eq!(blocks.len(), 2);

        let cpu = blocks.iter().find(|b| b.metric == MetricId::CpuTemp).unwrap();
        assert_eq!(cpu.samples, vec![Sample { timestamp_ms: 2000, value: 56.0 }]);

        let gpu = blocks.iter().find(|b| b.metric == MetricId::DGpuTemp).unwrap();
        assert_eq!(gpu.samples, vec![Sample { timestamp_ms: 1500, value: 60.0 }]);
    }

    #[test]
    fn horizon_prunes_old_samples() {
        let store = MetricsStore::with_horizon_secs(60);
        store.push(MetricId::CpuTemp, Sample { timestamp_ms: 0, value: 10.0 });
        store.push(MetricId::CpuTemp, Sample { timestamp_ms: 61_000, value: 20.0 });
        let blocks = store.query_binary_decoded(0);
        let cpu = blocks.iter().find(|b| b.metric == MetricId::CpuTemp).unwrap();
        assert_eq!(cpu.samples.len(), 1);
        assert_eq!(cpu.samples[0].value, 20.0);
    }

    #[test]
    fn empty_metrics_omitted_from_json() {
        let store = MetricsStore::new();
        store.push(MetricId::CpuTemp, Sample { timestamp_ms: 100, value: 1.0 });
        let json = store.query_json(0);
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj.contains_key("cpu_temp"));
    }
}
