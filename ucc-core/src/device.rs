//! Device identity (C4): DMI + PCI probe, mapped to a static capability
//! record. Runs once at startup; the result is immutable for the process
//! lifetime.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::paths;

fn read_trim(path: &str) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Known device models. Real deployments carry a much larger table; this
/// covers the shapes the capability record needs to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniwillDeviceId {
    Polaris15I,
    Polaris17I,
    Meerkat14,
    Unknown,
}

/// Per-device-model description of which features the daemon exposes.
/// Created once at startup from [`UniwillDeviceId`]; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRecord {
    pub id: UniwillDeviceId,
    pub gpu_fans: u8,
    pub water_cooler_supported: bool,
    pub keyboard_zones: u32,
    pub charging_profiles_supported: bool,
    pub odm_modes: Vec<String>,
    pub power_limit_slots: Vec<PowerLimitSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerLimitSlot {
    pub label: String,
    pub min_watts: u32,
    pub max_watts: u32,
}

impl CapabilityRecord {
    fn for_device(id: UniwillDeviceId) -> Self {
        match id {
            UniwillDeviceId::Polaris15I | UniwillDeviceId::Polaris17I => CapabilityRecord {
                id,
                gpu_fans: 2,
                water_cooler_supported: true,
                keyboard_zones: 3,
                charging_profiles_supported: true,
                odm_modes: vec!["quiet".into(), "balanced".into(), "performance".into()],
                power_limit_slots: vec![
                    PowerLimitSlot { label: "PL1".into(), min_watts: 15, max_watts: 45 },
                    PowerLimitSlot { label: "PL2".into(), min_watts: 45, max_watts: 90 },
                ],
            },
            UniwillDeviceId::Meerkat14 => CapabilityRecord {
                id,
                gpu_fans: 1,
                water_cooler_supported: false,
                keyboard_zones: 1,
                charging_profiles_supported: true,
                odm_modes: vec!["quiet".into(), "balanced".into(), "performance".into()],
                power_limit_slots: vec![PowerLimitSlot { label: "PL1".into(), min_watts: 10, max_watts: 28 }],
            },
            UniwillDeviceId::Unknown => CapabilityRecord {
                id,
                gpu_fans: 0,
                water_cooler_supported: false,
                keyboard_zones: 0,
                charging_profiles_supported: false,
                odm_modes: Vec::new(),
                power_limit_slots: Vec::new(),
            },
        }
    }
}

/// Static `{board_name, product_sku}` lookup. Real installs ship a much
/// longer table maintained alongside vendor releases.
fn lookup_device_id(board_name: &str, product_sku: &str) -> UniwillDeviceId {
    match (board_name, product_sku) {
        ("PD50SNx", _) | (_, "PD50SN") => UniwillDeviceId::Polaris15I,
        ("PD70PNx", _) | (_, "PD70PN") => UniwillDeviceId::Polaris17I,
        ("PF4NU1x", _) | (_, "PF4NU1") => UniwillDeviceId::Meerkat14,
        _ => UniwillDeviceId::Unknown,
    }
}

/// DMI fields read at startup, kept around for `GetSystemInfoJSON`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DmiInfo {
    pub sys_vendor: String,
    pub board_vendor: String,
    pub product_name: String,
    pub product_sku: String,
    pub board_name: String,
    pub cpu_model: String,
}

fn read_dmi() -> DmiInfo {
    let root = Path::new(paths::DMI_ROOT);
    let field = |name: &str| read_trim(root.join(name).to_str().unwrap_or_default()).unwrap_or_default();
    DmiInfo {
        sys_vendor: field("sys_vendor"),
        board_vendor: field("board_vendor"),
        product_name: field("product_name"),
        product_sku: field("product_sku"),
        board_name: field("board_name"),
        cpu_model: read_cpu_model(),
    }
}

fn read_cpu_model() -> String {
    let Ok(contents) = fs::read_to_string("/proc/cpuinfo") else {
        return String::new();
    };
    for line in contents.lines() {
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("model name") {
                return value.trim().to_string();
            }
        }
    }
    String::new()
}

/// Enumerates PCI display/3D-controller devices (class 0x03xxxx) under
/// `/sys/bus/pci/devices`. Used only to confirm a discrete GPU is present;
/// detailed GPU enumeration is [`ucc_gpu`]'s job.
pub fn enumerate_pci_display_devices() -> Vec<String> {
    let root = Path::new(paths::PCI_ROOT);
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for entry in entries.flatten() {
        let class_path = entry.path().join("class");
        if let Some(class) = read_trim(class_path.to_str().unwrap_or_default()) {
            let class = class.trim_start_matches("0x");
            if class.starts_with("03") {
                found.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    found
}

/// Result of device identification: DMI snapshot plus the resolved
/// capability record. `Unknown` devices still carry a (mostly empty)
/// record so the caller can decide to publish `IsDeviceSupported=false`.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub dmi: DmiInfo,
    pub pci_display_devices: Vec<String>,
    pub capabilities: CapabilityRecord,
}

impl DeviceIdentity {
    pub fn detect() -> Self {
        let dmi = read_dmi();
        let device_id = lookup_device_id(&dmi.board_name, &dmi.product_sku);
        DeviceIdentity {
            pci_display_devices: enumerate_pci_display_devices(),
            capabilities: CapabilityRecord::for_device(device_id),
            dmi,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.capabilities.id != UniwillDeviceId::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_board_maps_to_unsupported_record() {
        let id = lookup_device_id("Some Random Board", "XYZ");
        assert_eq!(id, UniwillDeviceId::Unknown);
        let record = CapabilityRecord::for_device(id);
        assert_eq!(record.gpu_fans, 0);
        assert!(!record.water_cooler_supported);
    }

    #[test]
    fn known_board_resolves_capabilities() {
        let id = lookup_device_id("PD50SNx", "");
        assert_eq!(id, UniwillDeviceId::Polaris15I);
        let record = CapabilityRecord::for_device(id);
        assert_eq!(record.gpu_fans, 2);
        assert!(record.water_cooler_supported);
    }
}
