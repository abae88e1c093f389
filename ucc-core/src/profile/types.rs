//! Built-in profile catalogs. These are static: the engine never mutates
//! or persists them, only custom entries layered on top.

use ucc_protocol::{
    ChargingPriority, ChargingProfileName, ChargingSettings, CpuSettings, CurvePointWire, FanBinding,
    FanProfileWire, ProfileWire, WebcamSetting, FnLockSetting,
};

fn charging(profile: ChargingProfileName, priority: ChargingPriority, start: u8, stop: u8) -> ChargingSettings {
    ChargingSettings { profile, priority, threshold_start_percent: start, threshold_stop_percent: stop }
}

pub fn builtin_profiles() -> Vec<ProfileWire> {
    vec![
        ProfileWire {
            id: "builtin-quiet".into(),
            name: "Quiet".into(),
            builtin: true,
            cpu: CpuSettings {
                governor: "powersave".into(),
                energy_performance_preference: "power".into(),
                scaling_min_freq_khz: 0,
                scaling_max_freq_khz: i32::MAX as u32 / 4,
                online_core_count: u32::MAX,
                boost_enabled: false,
            },
            display_brightness_percent: None,
            webcam: WebcamSetting::Unchanged,
            fn_lock: FnLockSetting::Unchanged,
            charging: charging(ChargingProfileName::Stationary, ChargingPriority::Battery, 50, 80),
            odm_mode: "quiet".into(),
            fan_binding: FanBinding { fan_profile_id: "builtin-quiet".into(), auto_control_water_cooler: true },
            keyboard_profile: None,
            unknown_fields: Default::default(),
        },
        ProfileWire {
            id: "builtin-balanced".into(),
            name: "Balanced".into(),
            builtin: true,
            cpu: CpuSettings {
                governor: "schedutil".into(),
                energy_performance_preference: "balance_performance".into(),
                scaling_min_freq_khz: 0,
                scaling_max_freq_khz: u32::MAX,
                online_core_count: u32::MAX,
                boost_enabled: true,
            },
            display_brightness_percent: None,
            webcam: WebcamSetting::Unchanged,
            fn_lock: FnLockSetting::Unchanged,
            charging: charging(ChargingProfileName::Balanced, ChargingPriority::Battery, 0, 100),
            odm_mode: "balanced".into(),
            fan_binding: FanBinding { fan_profile_id: "builtin-balanced".into(), auto_control_water_cooler: true },
            keyboard_profile: None,
            unknown_fields: Default::default(),
        },
        ProfileWire {
            id: "builtin-performance".into(),
            name: "Performance".into(),
            builtin: true,
            cpu: CpuSettings {
                governor: "performance".into(),
                energy_performance_preference: "performance".into(),
                scaling_min_freq_khz: 0,
                scaling_max_freq_khz: u32::MAX,
                online_core_count: u32::MAX,
                boost_enabled: true,
            },
            display_brightness_percent: None,
            webcam: WebcamSetting::Unchanged,
            fn_lock: FnLockSetting::Unchanged,
            charging: charging(ChargingProfileName::HighCapacity, ChargingPriority::Performance, 0, 100),
            odm_mode: "performance".into(),
            fan_binding: FanBinding { fan_profile_id: "builtin-performance".into(), auto_control_water_cooler: true },
            keyboard_profile: None,
            unknown_fields: Default::default(),
        },
    ]
}

fn curve(points: &[(f32, f32)]) -> Vec<CurvePointWire> {
    points.iter().map(|(t, d)| CurvePointWire { temp_c: *t, duty_pct: *d }).collect()
}

pub fn builtin_fan_profiles() -> Vec<FanProfileWire> {
    vec![
        FanProfileWire {
            id: "builtin-quiet".into(),
            name: "Quiet".into(),
            builtin: true,
            table_cpu: curve(&[(40.0, 0.0), (60.0, 20.0), (75.0, 45.0), (90.0, 80.0)]),
            table_gpu: curve(&[(40.0, 0.0), (65.0, 25.0), (80.0, 60.0), (90.0, 90.0)]),
            table_pump: curve(&[(40.0, 0.0), (70.0, 1.0), (85.0, 2.0)]),
            table_water_cooler_fan: curve(&[(40.0, 0.0), (65.0, 20.0), (80.0, 50.0)]),
            unknown_fields: Default::default(),
        },
        FanProfileWire {
            id: "builtin-balanced".into(),
            name: "Balanced".into(),
            builtin: true,
            table_cpu: curve(&[(40.0, 10.0), (60.0, 35.0), (75.0, 65.0), (90.0, 100.0)]),
            table_gpu: curve(&[(40.0, 10.0), (65.0, 40.0), (80.0, 75.0), (90.0, 100.0)]),
            table_pump: curve(&[(40.0, 0.0), (65.0, 1.0), (80.0, 2.0), (90.0, 3.0)]),
            table_water_cooler_fan: curve(&[(40.0, 10.0), (65.0, 40.0), (80.0, 75.0)]),
            unknown_fields: Default::default(),
        },
        FanProfileWire {
            id: "builtin-performance".into(),
            name: "Performance".into(),
            builtin: true,
            table_cpu: curve(&[(40.0, 30.0), (60.0, 55.0), (75.0, 80.0), (90.0, 100.0)]),
            table_gpu: curve(&[(40.0, 30.0), (65.0, 60.0), (80.0, 90.0), (90.0, 100.0)]),
            table_pump: curve(&[(40.0, 1.0), (65.0, 2.0), (80.0, 3.0)]),
            table_water_cooler_fan: curve(&[(40.0, 30.0), (65.0, 60.0), (80.0, 100.0)]),
            unknown_fields: Default::default(),
        },
    ]
}
