//! Binary encoding for `GetMonitorDataSince` (§4.5): the primary channel for
//! metrics history because GUI clients poll every 1-5 s and the JSON form's
//! per-sample object overhead adds up to real kilobytes at that rate.
//!
//! Format: concatenation of per-metric blocks, each
//! `{u8 metric_id, u32 count, count x {i64 ts_ms, f64 value}}`, all native
//! endian. Metrics with no samples since the query horizon are omitted.

use crate::metrics::{MetricId, Sample};

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorBlock {
    pub metric: MetricId,
    pub samples: Vec<Sample>,
}

/// Encode non-empty metric blocks into the wire format.
pub fn encode_monitor_blocks(blocks: &[MonitorBlock]) -> Vec<u8> {
    let mut out = Vec::new();
    for block in blocks {
        if block.samples.is_empty() {
            continue;
        }
        out.push(block.metric.wire_tag());
        out.extend_from_slice(&(block.samples.len() as u32).to_ne_bytes());
        for sample in &block.samples {
            out.extend_from_slice(&sample.timestamp_ms.to_ne_bytes());
            out.extend_from_slice(&sample.value.to_ne_bytes());
        }
    }
    out
}

/// Decode the wire format back into blocks. Returns `None` on truncation or
/// an unrecognized metric tag so callers can distinguish a malformed payload
/// from an empty one.
pub fn decode_monitor_blocks(bytes: &[u8]) -> Option<Vec<MonitorBlock>> {
    let mut blocks = Vec::new();
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        let tag = *bytes.get(cursor)?;
        cursor += 1;
        let metric = MetricId::from_wire_tag(tag)?;

        let count_bytes: [u8; 4] = bytes.get(cursor..cursor + 4)?.try_into().ok()?;
        let count = u32::from_ne_bytes(count_bytes) as usize;
        cursor += 4;

        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            let ts_bytes: [u8; 8] = bytes.get(cursor..cursor + 8)?.try_into().ok()?;
            cursor += 8;
            let val_bytes: [u8; 8] = bytes.get(cursor..cursor + 8)?.try_into().ok()?;
            cursor += 8;
            samples.push(Sample {
                timestamp_ms: i64::from_ne_bytes(ts_bytes),
                value: f64::from_ne_bytes(val_bytes),
            });
        }
        blocks.push(MonitorBlock { metric, samples });
    }

    Some(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_multiple_metrics() {
        let blocks = vec![
            MonitorBlock {
                metric: MetricId::CpuTemp,
                samples: vec![Sample { timestamp_ms: 2000, value: 56.0 }],
            },
            MonitorBlock {
                metric: MetricId::DGpuTemp,
                samples: vec![Sample { timestamp_ms: 1500, value: 60.0 }],
            },
        ];
        let wire = encode_monitor_blocks(&blocks);
        let decoded = decode_monitor_blocks(&wire).unwrap();
        assert_eq!(decoded, blocks);
    }

    #[test]
    fn empty_metrics_are_omitted() {
        let blocks = vec![MonitorBlock { metric: MetricId::CpuTemp, samples: vec![] }];
        assert!(encode_monitor_blocks(&blocks).is_empty());
    }

    #[test]
    fn truncated_payload_rejected() {
        assert_eq!(decode_monitor_blocks(&[MetricId::CpuTemp.wire_tag(), 1, 2]), None);
    }
}
