//! Wire shapes for the profile catalog (§3), as exchanged over
//! `GetActiveProfileJSON`, `ApplyFanProfiles`, `SetKeyboardBacklightStatesJSON`
//! and friends. The profile engine (C7) works with these directly; there is
//! no separate internal representation to keep in sync.

use serde::{Deserialize, Serialize};

/// Either a concrete value or "leave the hardware state unchanged" — used
/// for display brightness, webcam, and fn-lock, which a profile may not
/// want to touch at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebcamSetting {
    On,
    Off,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FnLockSetting {
    On,
    Off,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargingProfileName {
    HighCapacity,
    Balanced,
    Stationary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargingPriority {
    Battery,
    Performance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingSettings {
    pub profile: ChargingProfileName,
    pub priority: ChargingPriority,
    pub threshold_start_percent: u8,
    pub threshold_stop_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSettings {
    pub governor: String,
    pub energy_performance_preference: String,
    pub scaling_min_freq_khz: u32,
    pub scaling_max_freq_khz: u32,
    pub online_core_count: u32,
    pub boost_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanBinding {
    /// Empty string means "no fan profile bound".
    #[serde(default)]
    pub fan_profile_id: String,
    pub auto_control_water_cooler: bool,
}

/// A keyboard profile is referenced either by id or by name; the engine
/// canonicalizes to id on write and accepts either on read (open question
/// resolved in DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileIdRef {
    Id(String),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileWire {
    pub id: String,
    pub name: String,
    pub builtin: bool,
    pub cpu: CpuSettings,
    /// `None` means "unchanged".
    pub display_brightness_percent: Option<u8>,
    pub webcam: WebcamSetting,
    pub fn_lock: FnLockSetting,
    pub charging: ChargingSettings,
    /// Opaque vendor ODM performance-mode name.
    pub odm_mode: String,
    pub fan_binding: FanBinding,
    #[serde(default)]
    pub keyboard_profile: Option<ProfileIdRef>,
    /// Fields this build doesn't know about yet, preserved verbatim so a
    /// hand-edited entry from a newer daemon isn't silently truncated on
    /// the next save.
    #[serde(flatten)]
    pub unknown_fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePointWire {
    pub temp_c: f32,
    pub duty_pct: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanProfileWire {
    pub id: String,
    pub name: String,
    pub builtin: bool,
    pub table_cpu: Vec<CurvePointWire>,
    pub table_gpu: Vec<CurvePointWire>,
    pub table_pump: Vec<CurvePointWire>,
    pub table_water_cooler_fan: Vec<CurvePointWire>,
    #[serde(flatten)]
    pub unknown_fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyboardZoneState {
    pub mode: u8,
    pub brightness: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardProfileWire {
    pub id: String,
    pub name: String,
    pub brightness: u8,
    pub states: Vec<KeyboardZoneState>,
    #[serde(flatten)]
    pub unknown_fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerLimitSlot {
    pub label: String,
    pub min_watts: u32,
    pub max_watts: u32,
}
