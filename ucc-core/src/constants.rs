//! Constants and configuration values for the control daemon core.
//!
//! Centralizes magic numbers, paths, and defaults. Single source of truth —
//! never hardcode a tick interval, path, or limit anywhere else.

use std::time::Duration;

/// Filesystem paths the daemon reads and writes.
pub mod paths {
    /// Root-writable configuration directory (persisted profiles, state map).
    pub const CONFIG_DIR: &str = "/etc/uccd";

    /// Subdirectory holding rotating last-known-good copies.
    pub const AUTOSAVE_DIR: &str = "autosave";

    pub const PROFILES_FILE: &str = "profiles.json";
    pub const FAN_PROFILES_FILE: &str = "fan_profiles.json";
    pub const KEYBOARD_PROFILES_FILE: &str = "keyboard_profiles.json";
    pub const STATE_MAP_FILE: &str = "state_map.json";

    pub const CPU_SYSFS_ROOT: &str = "/sys/devices/system/cpu";
    pub const DMI_ROOT: &str = "/sys/class/dmi/id";
    pub const PCI_ROOT: &str = "/sys/bus/pci/devices";
    pub const HWMON_BASE: &str = "/sys/class/hwmon";
    pub const POWER_SUPPLY_AC_ONLINE: &str = "/sys/class/power_supply/AC/online";

    pub const EC_CHAR_DEVICE: &str = "/dev/uniwill";
}

/// Worker tick intervals (component C6).
pub mod timing {
    use super::Duration;

    pub const HARDWARE_MONITOR_TICK: Duration = Duration::from_millis(800);
    pub const FAN_CONTROL_TICK: Duration = Duration::from_millis(500);
    pub const POWER_STATE_TICK: Duration = Duration::from_millis(1000);

    /// Consecutive identical power-source readings required before acting.
    pub const POWER_STATE_DEBOUNCE_READINGS: u32 = 2;

    /// Join timeout when the scheduler cancels every worker at shutdown.
    pub const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

    /// Every Nth HardwareMonitor tick does the more expensive work.
    pub const CPU_POWER_SAMPLE_EVERY_N_TICKS: u32 = 3;
    pub const NVIDIA_PRIME_RECHECK_EVERY_N_TICKS: u32 = 12;

    /// Bound on the round-trip to the system policy service (C9).
    pub const AUTH_CHECK_TIMEOUT: Duration = Duration::from_secs(60);

    /// Grace period an unsupported-device daemon instance stays up to answer
    /// `IsDeviceSupported` before exiting, so the bus activator doesn't loop.
    pub const UNSUPPORTED_DEVICE_GRACE_PERIOD: Duration = Duration::from_secs(30);
}

/// Fan curve evaluator constants (component C8).
pub mod curve {
    /// Minimum duty delta that forces a hardware write outside the time window.
    pub const HYSTERESIS_DUTY_DELTA: f32 = 2.0;

    /// Maximum time a stale duty value may stand without a forced refresh.
    pub const HYSTERESIS_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(5);

    /// Duty written when a curve is empty or otherwise invalid. Fail safe, not fail silent.
    pub const FALLBACK_DUTY_PERCENT: f32 = 100.0;

    pub const MIN_TEMP_C: f32 = 20.0;
    pub const MAX_TEMP_C: f32 = 100.0;
    pub const MIN_DUTY_PERCENT: f32 = 0.0;
    pub const MAX_DUTY_PERCENT: f32 = 100.0;
    pub const MAX_PUMP_LEVEL: u8 = 3;

    pub const FLOAT_EPSILON: f32 = 1e-4;
}

/// Metrics history store limits (component C5).
pub mod metrics {
    pub const DEFAULT_HORIZON_SECS: i64 = 1800;
    pub const MIN_HORIZON_SECS: i64 = 60;
    pub const MAX_HORIZON_SECS: i64 = 7200;
}

/// Persisted-data size and name limits shared by validation.
pub mod limits {
    pub const MAX_PROFILE_NAME_LEN: usize = 128;
    pub const MAX_CURVE_POINTS: usize = 32;
    pub const MAX_PROFILE_FILE_BYTES: u64 = 4 * 1024 * 1024;
}
