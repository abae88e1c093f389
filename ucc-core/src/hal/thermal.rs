//! CPU package temperature, discovered once from the standard hwmon class
//! rather than the EC — `coretemp`/`k10temp` already expose this without a
//! vendor-specific register.

use std::fs;
use std::path::PathBuf;

use crate::constants::paths::HWMON_BASE;
use crate::sysfs::{read_millidegree_c, SysfsAttr};

const CANDIDATE_CHIP_NAMES: [&str; 2] = ["coretemp", "k10temp"];

fn find_package_temp_input() -> Option<PathBuf> {
    let entries = fs::read_dir(HWMON_BASE).ok()?;
    for entry in entries.flatten() {
        let dir = entry.path();
        let Ok(name) = fs::read_to_string(dir.join("name")) else { continue };
        if !CANDIDATE_CHIP_NAMES.contains(&name.trim()) {
            continue;
        }
        for input_index in 1..=8 {
            let label_path = dir.join(format!("temp{input_index}_label"));
            let input_path = dir.join(format!("temp{input_index}_input"));
            if !input_path.exists() {
                continue;
            }
            let label = fs::read_to_string(&label_path).unwrap_or_default();
            if label.trim().eq_ignore_ascii_case("package id 0") || label.trim().eq_ignore_ascii_case("tctl") || input_index == 1 {
                return Some(input_path);
            }
        }
    }
    None
}

/// CPU package/die temperature sensor. `detect()` probes hwmon once at
/// startup; if no candidate chip is found, reads return `None` forever
/// rather than re-probing every tick.
pub struct CpuThermal {
    input: Option<SysfsAttr>,
}

impl CpuThermal {
    pub fn detect() -> Self {
        Self { input: find_package_temp_input().map(SysfsAttr::new) }
    }

    pub fn read_celsius(&self) -> Option<f32> {
        read_millidegree_c(self.input.as_ref()?)
    }
}
