//! Shared wire types for the control daemon's RPC surface (component C10).
//!
//! These are the DTOs that cross the IPC bus: the enumerated metrics and
//! power states from the data model (§3), the binary monitor-history
//! encoding (§4.5), and the three authorization action classes (§4.9).
//! The RPC method signatures themselves live in the daemon's `zbus`
//! interface; this crate only carries the shapes both sides agree on.

mod metrics;
mod monitor;
mod power;
mod profile;

pub use metrics::{MetricId, Sample, ALL_METRICS};
pub use monitor::{decode_monitor_blocks, encode_monitor_blocks, MonitorBlock};
pub use power::PowerState;
pub use profile::{
    ChargingPriority, ChargingProfileName, ChargingSettings, CpuSettings, FanBinding,
    FanProfileWire, FnLockSetting, KeyboardProfileWire, KeyboardZoneState, PowerLimitSlot,
    ProfileIdRef, ProfileWire, WebcamSetting,
};

/// The three authorization action classes an RPC method is tagged with (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionClass {
    Read,
    Control,
    ManageHardware,
}

impl ActionClass {
    /// The Polkit action id string this class maps to, namespaced under the
    /// daemon's reverse-DNS bus name so distinct daemons don't collide.
    pub fn polkit_action_id(self, daemon_bus_name: &str) -> String {
        let suffix = match self {
            ActionClass::Read => "read",
            ActionClass::Control => "control",
            ActionClass::ManageHardware => "manage-hardware",
        };
        format!("{daemon_bus_name}.{suffix}")
    }
}
