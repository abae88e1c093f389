//! Package power draw via Intel RAPL's cumulative energy counter. Like
//! the fan curve evaluator, this is stateful (it needs the previous
//! reading to compute a rate) and the state belongs to whichever worker
//! samples it, not to the HAL itself.

use std::time::Instant;

use crate::sysfs::SysfsAttr;

const RAPL_ROOT: &str = "/sys/class/powercap/intel-rapl:0";

pub struct RaplPowerSampler {
    energy_uj: SysfsAttr,
    max_range_uj: Option<u64>,
    last: Option<(Instant, u64)>,
}

impl RaplPowerSampler {
    pub fn detect() -> Self {
        let max_range = SysfsAttr::new(format!("{RAPL_ROOT}/max_energy_range_uj"))
            .read_string()
            .and_then(|s| s.trim().parse().ok());
        Self { energy_uj: SysfsAttr::new(format!("{RAPL_ROOT}/energy_uj")), max_range_uj: max_range, last: None }
    }

    pub fn is_available(&self) -> bool {
        self.energy_uj.is_available()
    }

    /// Returns `None` on the first call (no prior sample to diff against)
    /// or if the counter is unavailable. Handles a single wraparound of
    /// the counter using `max_energy_range_uj`.
    pub fn sample_watts(&mut self) -> Option<f32> {
        let raw = self.energy_uj.read_string()?.trim().parse::<u64>().ok()?;
        let now = Instant::now();

        let watts = self.last.map(|(last_time, last_energy)| {
            let elapsed = now.duration_since(last_time).as_secs_f64();
            if elapsed <= 0.0 {
                return 0.0;
            }
            let delta_uj = if raw >= last_energy {
                raw - last_energy
            } else {
                let range = self.max_range_uj.unwrap_or(u64::MAX);
                (range - last_energy) + raw
            };
            ((delta_uj as f64) / 1_000_000.0 / elapsed) as f32
        });

        self.last = Some((now, raw));
        watts
    }
}
