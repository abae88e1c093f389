use serde::{Deserialize, Serialize};

/// The 13 metrics the history store (C5) carries, one ring each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    CpuTemp,
    CpuDuty,
    CpuPower,
    CpuFreq,
    DGpuTemp,
    DGpuDuty,
    DGpuPower,
    DGpuFreq,
    IGpuTemp,
    IGpuPower,
    IGpuFreq,
    WcFanDuty,
    WcPumpLevel,
}

/// All 13 variants, in wire order. Indices here are the `u8 metric_id`
/// tags used by the binary monitor-history encoding (§4.5).
pub const ALL_METRICS: [MetricId; 13] = [
    MetricId::CpuTemp,
    MetricId::CpuDuty,
    MetricId::CpuPower,
    MetricId::CpuFreq,
    MetricId::DGpuTemp,
    MetricId::DGpuDuty,
    MetricId::DGpuPower,
    MetricId::DGpuFreq,
    MetricId::IGpuTemp,
    MetricId::IGpuPower,
    MetricId::IGpuFreq,
    MetricId::WcFanDuty,
    MetricId::WcPumpLevel,
];

impl MetricId {
    pub fn wire_tag(self) -> u8 {
        ALL_METRICS.iter().position(|m| *m == self).expect("MetricId missing from ALL_METRICS") as u8
    }

    pub fn from_wire_tag(tag: u8) -> Option<Self> {
        ALL_METRICS.get(tag as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricId::CpuTemp => "cpu_temp",
            MetricId::CpuDuty => "cpu_duty",
            MetricId::CpuPower => "cpu_power",
            MetricId::CpuFreq => "cpu_freq",
            MetricId::DGpuTemp => "dgpu_temp",
            MetricId::DGpuDuty => "dgpu_duty",
            MetricId::DGpuPower => "dgpu_power",
            MetricId::DGpuFreq => "dgpu_freq",
            MetricId::IGpuTemp => "igpu_temp",
            MetricId::IGpuPower => "igpu_power",
            MetricId::IGpuFreq => "igpu_freq",
            MetricId::WcFanDuty => "wc_fan_duty",
            MetricId::WcPumpLevel => "wc_pump_level",
        }
    }
}

/// A single timestamped observation pushed into one metric's ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tag_round_trips() {
        for m in ALL_METRICS {
            assert_eq!(MetricId::from_wire_tag(m.wire_tag()), Some(m));
        }
    }
}
