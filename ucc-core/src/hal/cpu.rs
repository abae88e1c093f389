//! CPU cpufreq controller: per-core governor, EPP, frequency bounds, and
//! boost, over `/sys/devices/system/cpu`.

use std::path::PathBuf;

use tracing::debug;

use ucc_error::Result;

use crate::constants::paths::CPU_SYSFS_ROOT;
use crate::sysfs::SysfsAttr;

/// Use the median of `scaling_available_frequencies` instead of a literal
/// target; selected when the driver doesn't expose hardware-max directly.
pub const SENTINEL_REDUCED: i64 = -1;
/// Reset `scaling_max` back to `cpuinfo_max` (hardware max).
pub const SENTINEL_HW_MAX: i64 = -2;
/// Lower `scaling_min` back to `cpuinfo_min`.
pub const SENTINEL_TO_MAX: i64 = -2;

fn core_dir(core: u32) -> PathBuf {
    PathBuf::from(CPU_SYSFS_ROOT).join(format!("cpu{core}/cpufreq"))
}

/// Pure resolution logic for [`CpuController::set_max_freq`], split out so
/// the sentinel handling is unit-testable without touching `/sys`. Returns
/// the resolved `scaling_max` value in kHz and whether REDUCED forced
/// boost off on this core's driver.
fn resolve_max_freq(target_khz: i64, driver: &str, hw_max: i32, scaling_min: i32, median_at_least: Option<i32>) -> (i32, bool) {
    if target_khz == SENTINEL_HW_MAX {
        (hw_max, false)
    } else if target_khz == SENTINEL_REDUCED {
        if driver == "acpi-cpufreq" {
            (hw_max, true)
        } else {
            (median_at_least.unwrap_or(hw_max), false)
        }
    } else {
        ((target_khz as i32).clamp(scaling_min, hw_max), false)
    }
}

/// One logical core's cpufreq attribute set.
pub struct CoreAttrs {
    pub core: u32,
    online: SysfsAttr,
    scaling_min: SysfsAttr,
    scaling_max: SysfsAttr,
    cpuinfo_min: SysfsAttr,
    cpuinfo_max: SysfsAttr,
    scaling_cur: SysfsAttr,
    available_freqs: SysfsAttr,
    available_governors: SysfsAttr,
    governor: SysfsAttr,
    epp: SysfsAttr,
    driver: SysfsAttr,
    boost: SysfsAttr,
    no_turbo: SysfsAttr,
}

impl CoreAttrs {
    fn new(core: u32) -> Self {
        let dir = core_dir(core);
        let cpu_dir = PathBuf::from(CPU_SYSFS_ROOT).join(format!("cpu{core}"));
        Self {
            core,
            online: SysfsAttr::new(cpu_dir.join("online")),
            scaling_min: SysfsAttr::new(dir.join("scaling_min_freq")),
            scaling_max: SysfsAttr::new(dir.join("scaling_max_freq")),
            cpuinfo_min: SysfsAttr::new(dir.join("cpuinfo_min_freq")),
            cpuinfo_max: SysfsAttr::new(dir.join("cpuinfo_max_freq")),
            scaling_cur: SysfsAttr::new(dir.join("scaling_cur_freq")),
            available_freqs: SysfsAttr::new(dir.join("scaling_available_frequencies")),
            available_governors: SysfsAttr::new(dir.join("scaling_available_governors")),
            governor: SysfsAttr::new(dir.join("scaling_governor")),
            epp: SysfsAttr::new(dir.join("energy_performance_preference")),
            driver: SysfsAttr::new(dir.join("scaling_driver")),
            boost: SysfsAttr::new(PathBuf::from(CPU_SYSFS_ROOT).join("cpufreq/boost")),
            no_turbo: SysfsAttr::new(PathBuf::from(CPU_SYSFS_ROOT).join("intel_pstate/no_turbo")),
        }
    }

    pub fn is_online(&self) -> bool {
        // core 0 has no `online` attribute and is always online.
        self.online.read_bool().unwrap_or(true)
    }

    pub fn driver_name(&self) -> Option<String> {
        self.driver.read_string()
    }

    fn available_frequencies(&self) -> Vec<i32> {
        self.available_freqs
            .read_string()
            .map(|s| {
                let mut v: Vec<i32> = s.split_whitespace().filter_map(|t| t.parse().ok()).collect();
                v.sort_unstable();
                v
            })
            .unwrap_or_default()
    }

    fn median_frequency_at_least(&self, freqs: &[i32], floor: i32) -> Option<i32> {
        let eligible: Vec<i32> = freqs.iter().copied().filter(|f| *f >= floor).collect();
        if eligible.is_empty() {
            return None;
        }
        Some(eligible[eligible.len() / 2])
    }

    fn snap_to_available(&self, target: i32, at_least: bool) -> i32 {
        let freqs = self.available_frequencies();
        if freqs.is_empty() {
            return target;
        }
        if at_least {
            freqs.iter().copied().find(|f| *f >= target).unwrap_or(*freqs.last().unwrap())
        } else {
            freqs.iter().copied().rev().find(|f| *f <= target).unwrap_or(freqs[0])
        }
    }
}

/// Enumerates logical cores from `possible`/`present`/`online` and exposes
/// the per-core write operations the profile engine drives.
pub struct CpuController {
    cores: Vec<CoreAttrs>,
}

impl CpuController {
    pub fn detect() -> Self {
        let list_attr = SysfsAttr::new(PathBuf::from(CPU_SYSFS_ROOT).join("possible"));
        let ids = list_attr.read_list_i32().unwrap_or_default();
        let cores = ids.into_iter().map(|id| CoreAttrs::new(id as u32)).collect();
        Self { cores }
    }

    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    /// Brings cores `[0..n)` online, offlines the rest. Core 0 is never
    /// taken offline. Cores without an `online` node are skipped.
    pub fn use_cores(&self, n: usize) -> Result<()> {
        let n = n.min(self.cores.len());
        for core in &self.cores {
            if core.core == 0 || !core.online.is_available() {
                continue;
            }
            let want_online = (core.core as usize) < n;
            core.online.write_bool(want_online)?;
        }
        Ok(())
    }

    /// Applied to every online core for which `name` is in that core's
    /// available governors; cores lacking it are silently skipped.
    pub fn set_governor(&self, name: &str) {
        for core in &self.cores {
            if !core.is_online() {
                continue;
            }
            let Some(available) = core.available_governors.read_list_string() else { continue };
            if available.iter().any(|g| g == name) {
                if let Err(e) = core.governor.write_string(name) {
                    debug!(core = core.core, error = %e, "failed to set governor");
                }
            }
        }
    }

    pub fn set_energy_performance_preference(&self, name: &str) {
        for core in &self.cores {
            if !core.is_online() {
                continue;
            }
            if let Err(e) = core.epp.write_string(name) {
                debug!(core = core.core, error = %e, "failed to set EPP");
            }
        }
    }

    /// `target = SENTINEL_HW_MAX` resets `scaling_max` to hardware max.
    /// `target = SENTINEL_REDUCED` selects a conservative cap instead of a
    /// literal frequency: on `acpi-cpufreq` this means "leave scaling_max
    /// at hardware max, toggle boost off instead"; on other drivers it
    /// means "use the median of the available frequencies at or above
    /// scaling_min". Returns whether REDUCED forced boost off on any core,
    /// so the caller can fold that into its own `set_boost` call.
    pub fn set_max_freq(&self, target_khz: i64) -> bool {
        let mut forced_boost_off = false;
        for core in &self.cores {
            if !core.is_online() {
                continue;
            }
            let Some(hw_max) = core.cpuinfo_max.read_i32() else { continue };
            let scaling_min = core.scaling_min.read_i32().unwrap_or(hw_max);
            let driver = core.driver_name().unwrap_or_default();

            let median_at_least = if target_khz == SENTINEL_REDUCED && driver != "acpi-cpufreq" {
                let freqs = core.available_frequencies();
                core.median_frequency_at_least(&freqs, scaling_min)
            } else {
                None
            };

            let (resolved, forced_off) = resolve_max_freq(target_khz, &driver, hw_max, scaling_min, median_at_least);
            forced_boost_off |= forced_off;

            let snapped = core.snap_to_available(resolved, true);
            if let Err(e) = core.scaling_max.write_i32(snapped) {
                debug!(core = core.core, error = %e, "failed to set max freq");
            }
        }
        forced_boost_off
    }

    pub fn set_min_freq(&self, target_khz: i64) {
        for core in &self.cores {
            if !core.is_online() {
                continue;
            }
            let Some(hw_min) = core.cpuinfo_min.read_i32() else { continue };
            let scaling_max = core.scaling_max.read_i32().unwrap_or(hw_min);

            let resolved = if target_khz == SENTINEL_TO_MAX {
                scaling_max
            } else {
                (target_khz as i32).clamp(hw_min, scaling_max)
            };

            let snapped = core.snap_to_available(resolved, false);
            if let Err(e) = core.scaling_min.write_i32(snapped) {
                debug!(core = core.core, error = %e, "failed to set min freq");
            }
        }
    }

    /// On `acpi-cpufreq`, writes `boost` directly. On `intel_pstate`,
    /// `no_turbo` is the inverse knob.
    pub fn set_boost(&self, enabled: bool) {
        for core in &self.cores {
            let driver = core.driver_name().unwrap_or_default();
            if driver == "acpi-cpufreq" && core.boost.is_available() {
                let _ = core.boost.write_bool(enabled);
            } else if driver == "intel_pstate" && core.no_turbo.is_available() {
                let _ = core.no_turbo.write_bool(!enabled);
            }
        }
    }

    pub fn current_frequency_khz(&self, core: u32) -> Option<i32> {
        self.cores.iter().find(|c| c.core == core)?.scaling_cur.read_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_at_least_floor() {
        let attrs = CoreAttrs::new(0);
        let freqs = vec![800_000, 1_600_000, 2_400_000, 3_200_000];
        assert_eq!(attrs.median_frequency_at_least(&freqs, 1_600_000), Some(2_400_000));
        assert_eq!(attrs.median_frequency_at_least(&freqs, 10_000_000), None);
    }

    #[test]
    fn hw_max_sentinel_resets_to_hardware_max_regardless_of_driver() {
        let (resolved, forced_off) = resolve_max_freq(SENTINEL_HW_MAX, "acpi-cpufreq", 3_200_000, 800_000, None);
        assert_eq!(resolved, 3_200_000);
        assert!(!forced_off);

        let (resolved, forced_off) = resolve_max_freq(SENTINEL_HW_MAX, "intel_pstate", 3_200_000, 800_000, None);
        assert_eq!(resolved, 3_200_000);
        assert!(!forced_off);
    }

    #[test]
    fn reduced_on_acpi_cpufreq_keeps_hardware_max_and_forces_boost_off() {
        let (resolved, forced_off) = resolve_max_freq(SENTINEL_REDUCED, "acpi-cpufreq", 3_200_000, 800_000, None);
        assert_eq!(resolved, 3_200_000);
        assert!(forced_off);
    }

    #[test]
    fn reduced_on_intel_pstate_uses_median_and_leaves_boost_alone() {
        let (resolved, forced_off) = resolve_max_freq(SENTINEL_REDUCED, "intel_pstate", 3_200_000, 1_600_000, Some(2_400_000));
        assert_eq!(resolved, 2_400_000);
        assert!(!forced_off);
    }

    #[test]
    fn literal_target_clamps_between_scaling_min_and_hardware_max() {
        let (resolved, forced_off) = resolve_max_freq(2_000_000, "acpi-cpufreq", 3_200_000, 800_000, None);
        assert_eq!(resolved, 2_000_000);
        assert!(!forced_off);

        let (resolved, _) = resolve_max_freq(100, "acpi-cpufreq", 3_200_000, 800_000, None);
        assert_eq!(resolved, 800_000);
    }
}
