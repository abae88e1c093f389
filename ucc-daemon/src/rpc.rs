//! D-Bus RPC surface (C10): one interface exposing the full Query/Control/
//! Manage-hardware method namespace over the HAL and profile engine. Every
//! mutating method resolves the caller's pid from the message header and
//! runs it through [`crate::auth::check_authorization`] before touching
//! hardware; query methods skip the round trip entirely.

use serde_json::{json, Value};
use tracing::{info, warn};
use ucc_core::hal::fan::FanChannel;
use ucc_core::hal::watercooler::PumpVoltage;
use ucc_error::UccError;
use ucc_protocol::{
    ActionClass, ChargingSettings, FanProfileWire, KeyboardProfileWire, KeyboardZoneState, PowerState, ProfileWire,
};
use zbus::message::Header;
use zbus::SignalContext;

use crate::auth;
use crate::state::SharedState;

pub struct UccInterface {
    pub state: SharedState,
    pub connection: zbus::Connection,
}

/// Stand-in interface registered under the same bus name and object path
/// on unsupported hardware (§4.11 step 4). Every other method would just
/// return "absent" data anyway; publishing only this one avoids building
/// a HAL against a capability record that has nothing in it.
pub struct UnsupportedInterface;

#[zbus::interface(name = "com.uccd.ControlCenter")]
impl UnsupportedInterface {
    async fn is_device_supported(&self) -> bool {
        false
    }
}

fn to_fdo(e: UccError) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(e.to_string())
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str) -> zbus::fdo::Result<T> {
    serde_json::from_str(raw).map_err(|e| zbus::fdo::Error::InvalidArgs(format!("invalid JSON: {e}")))
}

fn parse_power_state(raw: &str) -> zbus::fdo::Result<PowerState> {
    raw.parse().map_err(|_| zbus::fdo::Error::InvalidArgs(format!("unknown power state '{raw}'")))
}

/// One metric's most recent `{timestamp_ms, value}` pair, or `(0, 0.0)` if
/// nothing has been sampled yet — the wire convention for "absent" (§4.10).
fn latest(state: &SharedState, metric: ucc_protocol::MetricId) -> (i64, f64) {
    let series = state.metrics.query_json(0);
    series
        .get(metric.as_str())
        .and_then(|arr| arr.as_array())
        .and_then(|arr| arr.last())
        .and_then(|pair| pair.as_array())
        .map(|pair| (pair[0].as_i64().unwrap_or(0), pair[1].as_f64().unwrap_or(0.0)))
        .unwrap_or((0, 0.0))
}

fn fan_channel_data(state: &SharedState, channel: FanChannel, speed_metric: ucc_protocol::MetricId, temp_metric: ucc_protocol::MetricId) -> Value {
    // RPM is a live EC read (cheap, always current); duty and temperature
    // come from the sampled history so they share the "absent until first
    // sample" convention with every other metric-backed query.
    let rpm = state.hal.fan().get_rpm(channel);
    let (speed_ts, speed_val) = latest(state, speed_metric);
    let (temp_ts, temp_val) = latest(state, temp_metric);
    json!({
        "speed": {"timestamp": speed_ts, "data": speed_val, "rpm": rpm},
        "temp": {"timestamp": temp_ts, "data": temp_val},
    })
}

#[zbus::interface(name = "com.uccd.ControlCenter")]
impl UccInterface {
    // ---- Query -----------------------------------------------------

    async fn is_device_supported(&self) -> bool {
        self.state.device.is_supported()
    }

    #[zbus(out_args("json"))]
    async fn get_system_info_json(&self) -> String {
        json!({
            "dmi": self.state.device.dmi,
            "capabilities": self.state.device.capabilities,
            "pci_display_devices": self.state.device.pci_display_devices,
            "is_supported": self.state.device.is_supported(),
        })
        .to_string()
    }

    #[zbus(out_args("json"))]
    async fn get_default_profiles_json(&self) -> String {
        let builtins: Vec<ProfileWire> = self.state.profiles.list_profiles().into_iter().filter(|p| p.builtin).collect();
        json!(builtins).to_string()
    }

    #[zbus(out_args("json"))]
    async fn get_custom_profiles_json(&self) -> String {
        let custom: Vec<ProfileWire> = self.state.profiles.list_profiles().into_iter().filter(|p| !p.builtin).collect();
        json!(custom).to_string()
    }

    #[zbus(out_args("json"))]
    async fn get_active_profile_json(&self) -> String {
        json!(self.state.profiles.get_active_profile()).to_string()
    }

    #[zbus(out_args("state"))]
    async fn get_power_state(&self) -> String {
        self.state.power_state.lock().as_str().to_string()
    }

    async fn get_fan_profile_names(&self) -> Vec<String> {
        self.state.profiles.list_fan_profiles().into_iter().map(|p| p.name).collect()
    }

    #[zbus(out_args("json"))]
    async fn get_fan_profile(&self, id: &str) -> zbus::fdo::Result<String> {
        let profile = self.state.profiles.get_fan_profile(id).ok_or_else(|| zbus::fdo::Error::UnknownObject(id.to_string()))?;
        Ok(json!(profile).to_string())
    }

    #[zbus(out_args("json"))]
    async fn get_fan_profiles_json(&self) -> String {
        json!(self.state.profiles.list_fan_profiles()).to_string()
    }

    async fn get_water_cooler_supported(&self) -> bool {
        self.state.hal.water_cooler_supported
    }

    async fn get_water_cooler_connected(&self) -> bool {
        self.state.hal.water_cooler().map(|wc| wc.get_connected()).unwrap_or(false)
    }

    async fn is_water_cooler_enabled(&self) -> bool {
        self.state.hal.water_cooler().map(|wc| wc.is_enabled()).unwrap_or(false)
    }

    #[zbus(out_args("json"))]
    async fn get_fan_data_cpu(&self) -> String {
        fan_channel_data(&self.state, FanChannel::Cpu, ucc_protocol::MetricId::CpuDuty, ucc_protocol::MetricId::CpuTemp).to_string()
    }

    #[zbus(out_args("json"))]
    async fn get_fan_data_gpu1(&self) -> String {
        fan_channel_data(&self.state, FanChannel::Gpu1, ucc_protocol::MetricId::DGpuDuty, ucc_protocol::MetricId::DGpuTemp).to_string()
    }

    #[zbus(out_args("json"))]
    async fn get_fan_data_gpu2(&self) -> String {
        fan_channel_data(&self.state, FanChannel::Gpu2, ucc_protocol::MetricId::DGpuDuty, ucc_protocol::MetricId::DGpuTemp).to_string()
    }

    #[zbus(out_args("mhz"))]
    async fn get_cpu_frequency_mhz(&self) -> f64 {
        self.state.hal.cpu.current_frequency_khz(0).map(|khz| khz as f64 / 1000.0).unwrap_or(0.0)
    }

    #[zbus(out_args("json"))]
    async fn get_cpu_power_values_json(&self) -> String {
        let (timestamp, value) = latest(&self.state, ucc_protocol::MetricId::CpuPower);
        json!({"timestamp": timestamp, "data": value}).to_string()
    }

    #[zbus(out_args("json"))]
    async fn get_dgpu_info_values_json(&self) -> String {
        let gpu = self.state.hal.gpu.snapshot().ok().and_then(|s| s.gpus.into_iter().find(|g| g.vendor != ucc_gpu::GpuVendor::Intel));
        json!(gpu).to_string()
    }

    #[zbus(out_args("json"))]
    async fn get_igpu_info_values_json(&self) -> String {
        let gpu = self.state.hal.gpu.snapshot().ok().and_then(|s| s.gpus.into_iter().find(|g| g.vendor == ucc_gpu::GpuVendor::Intel));
        json!(gpu).to_string()
    }

    async fn get_monitor_data_since(&self, since_ms: i64) -> Vec<u8> {
        self.state.metrics.query_binary(since_ms)
    }

    async fn odm_profiles_available(&self) -> Vec<String> {
        self.state.hal.odm().available_modes().to_vec()
    }

    #[zbus(out_args("mode"))]
    async fn get_odm_performance_profile(&self) -> String {
        self.state.hal.odm().get_mode().unwrap_or_default()
    }

    #[zbus(out_args("json"))]
    async fn get_odm_power_limits(&self) -> String {
        json!(self.state.device.capabilities.power_limit_slots).to_string()
    }

    /// No dedicated EC register distinguishes an NVIDIA-specific power-control
    /// ceiling from the board's general power-limit table; this reports the
    /// highest `max_watts` among the device's declared slots.
    async fn get_nvidia_power_ctrl_max_power_limit(&self) -> u32 {
        self.state.device.capabilities.power_limit_slots.iter().map(|s| s.max_watts).max().unwrap_or(0)
    }

    async fn get_webcam_sw_status(&self) -> bool {
        self.state.hal.webcam().get_enabled()
    }

    async fn get_fn_lock_status(&self) -> bool {
        self.state.hal.fn_lock().get_enabled()
    }

    async fn get_display_brightness(&self) -> u8 {
        self.state.hal.display.get_percent().unwrap_or(0)
    }

    #[zbus(out_args("json"))]
    async fn get_keyboard_backlight_info(&self) -> String {
        let info = self.state.hal.keyboard().get_info();
        json!({
            "zones": info.zones,
            "max_brightness": info.max_brightness,
            "max_r": info.max_r,
            "max_g": info.max_g,
            "max_b": info.max_b,
        })
        .to_string()
    }

    #[zbus(out_args("json"))]
    async fn get_keyboard_backlight_states(&self) -> String {
        json!(self.state.last_keyboard_states.lock().clone()).to_string()
    }

    async fn get_water_cooler_fan_speed(&self) -> u8 {
        self.state.hal.water_cooler().and_then(|wc| wc.get_fan_duty()).unwrap_or(0)
    }

    async fn get_water_cooler_pump_level(&self) -> u8 {
        self.state.hal.water_cooler().and_then(|wc| wc.get_pump_level()).unwrap_or(0)
    }

    // ---- Control -----------------------------------------------------

    async fn set_active_profile(
        &self,
        id: &str,
        #[zbus(header)] header: Header<'_>,
        #[zbus(signal_context)] ctx: SignalContext<'_>,
    ) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        self.state.profiles.set_active_profile(&self.state.hal, id).map_err(to_fdo)?;
        Self::active_profile_changed(&ctx, id).await?;
        Ok(())
    }

    async fn apply_fan_profiles(&self, json: &str, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        let profiles: Vec<FanProfileWire> = parse_json(json)?;
        self.state.profiles.apply_fan_profiles(profiles).map_err(to_fdo)
    }

    async fn set_keyboard_backlight_states_json(&self, json: &str, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        let states: Vec<KeyboardZoneState> = parse_json(json)?;
        self.state.hal.keyboard().set_states(&states).map_err(to_fdo)?;
        *self.state.last_keyboard_states.lock() = Some(states);
        Ok(())
    }

    async fn set_webcam(&self, enabled: bool, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        self.state.hal.webcam().set_enabled(enabled).map_err(to_fdo)
    }

    async fn set_fn_lock_status(&self, enabled: bool, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        self.state.hal.fn_lock().set_enabled(enabled).map_err(to_fdo)
    }

    async fn set_display_brightness(&self, percent: u8, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        self.state.hal.display.set_percent(percent).map_err(to_fdo)
    }

    async fn set_water_cooler_fan_speed(&self, percent: u8, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        let wc = self.state.hal.water_cooler().ok_or_else(|| zbus::fdo::Error::NotSupported("no water cooler present".into()))?;
        wc.set_fan_duty(percent).map_err(to_fdo)
    }

    async fn set_water_cooler_pump_voltage(&self, code: i32, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        let voltage = match code {
            0 => PumpVoltage::V11,
            2 => PumpVoltage::V7,
            3 => PumpVoltage::V8,
            4 => PumpVoltage::Off,
            _ => return Err(zbus::fdo::Error::InvalidArgs(format!("unknown pump voltage code {code}"))),
        };
        let wc = self.state.hal.water_cooler().ok_or_else(|| zbus::fdo::Error::NotSupported("no water cooler present".into()))?;
        wc.set_pump_voltage(voltage).map_err(to_fdo)
    }

    async fn set_water_cooler_led_color(&self, r: u8, g: u8, b: u8, mode: u8, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        let wc = self.state.hal.water_cooler().ok_or_else(|| zbus::fdo::Error::NotSupported("no water cooler present".into()))?;
        wc.set_led(r, g, b, mode).map_err(to_fdo)
    }

    async fn turn_off_water_cooler_led(&self, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        let wc = self.state.hal.water_cooler().ok_or_else(|| zbus::fdo::Error::NotSupported("no water cooler present".into()))?;
        wc.turn_off_led().map_err(to_fdo)
    }

    async fn enable_water_cooler(&self, enabled: bool, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        let wc = self.state.hal.water_cooler().ok_or_else(|| zbus::fdo::Error::NotSupported("no water cooler present".into()))?;
        wc.enable(enabled).map_err(to_fdo)
    }

    async fn set_odm_performance_profile(&self, name: &str, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::Control).await?;
        self.state.hal.odm().set_mode(name).map_err(to_fdo)
    }

    // ---- Manage-hardware ----------------------------------------------

    async fn create_custom_profile_json(&self, json: &str, #[zbus(header)] header: Header<'_>, #[zbus(signal_context)] ctx: SignalContext<'_>) -> zbus::fdo::Result<String> {
        self.authorize(&header, ActionClass::ManageHardware).await?;
        let profile: ProfileWire = parse_json(json)?;
        let created = self.state.profiles.create_custom(profile).map_err(to_fdo)?;
        Self::profile_catalog_changed(&ctx).await?;
        Ok(json!(created).to_string())
    }

    async fn update_custom_profile_json(&self, id: &str, json: &str, #[zbus(header)] header: Header<'_>, #[zbus(signal_context)] ctx: SignalContext<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::ManageHardware).await?;
        let profile: ProfileWire = parse_json(json)?;
        self.state.profiles.update_custom(id, profile).map_err(to_fdo)?;
        Self::profile_catalog_changed(&ctx).await?;
        Ok(())
    }

    async fn delete_custom_profile(&self, id: &str, #[zbus(header)] header: Header<'_>, #[zbus(signal_context)] ctx: SignalContext<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::ManageHardware).await?;
        self.state.profiles.delete_custom(id).map_err(to_fdo)?;
        Self::profile_catalog_changed(&ctx).await?;
        Ok(())
    }

    async fn set_state_profile(&self, power: &str, id: &str, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::ManageHardware).await?;
        let power = parse_power_state(power)?;
        self.state.profiles.set_state_profile(power, id).map_err(to_fdo)
    }

    async fn set_charging_settings_json(&self, json: &str, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::ManageHardware).await?;
        let settings: ChargingSettings = parse_json(json)?;
        self.state.hal.charging().apply(&settings).map_err(to_fdo)
    }

    async fn set_power_limits(&self, pl1_watts: u32, pl2_watts: u32, pl4_watts: u32, ctgp_watts: u32, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::ManageHardware).await?;
        let power = self.state.hal.power();
        power.set_pl1_watts(pl1_watts).map_err(to_fdo)?;
        power.set_pl2_watts(pl2_watts).map_err(to_fdo)?;
        power.set_pl4_watts(pl4_watts).map_err(to_fdo)?;
        power.set_ctgp_watts(ctgp_watts).map_err(to_fdo)
    }

    async fn set_fan_mode_auto(&self, auto: bool, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::ManageHardware).await?;
        self.state.hal.fan().set_mode_auto(auto).map_err(to_fdo)
    }

    async fn save_keyboard_profile_json(&self, json: &str, #[zbus(header)] header: Header<'_>) -> zbus::fdo::Result<()> {
        self.authorize(&header, ActionClass::ManageHardware).await?;
        let profile: KeyboardProfileWire = parse_json(json)?;
        self.state.profiles.save_keyboard_profile(profile).map_err(to_fdo)
    }

    // ---- Signals -------------------------------------------------------

    #[zbus(signal)]
    async fn active_profile_changed(ctx: &SignalContext<'_>, id: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn power_state_changed(ctx: &SignalContext<'_>, state: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn connection_changed(ctx: &SignalContext<'_>, connected: bool) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn profile_catalog_changed(ctx: &SignalContext<'_>) -> zbus::Result<()>;
}

impl UccInterface {
    async fn authorize(&self, header: &Header<'_>, action: ActionClass) -> zbus::fdo::Result<()> {
        let pid = auth::caller_pid(&self.connection, header).await;
        auth::check_authorization(&self.connection, pid, action).await.map_err(|e| {
            info!(pid, "rejecting rpc call: {e}");
            to_fdo(e)
        })
    }
}

/// Drains [`crate::events::DaemonEvent`]s produced by worker threads and the
/// profile engine's synchronous callbacks and re-emits them as signals on
/// the bus. Runs as its own tokio task for the life of the process.
pub async fn run_event_bridge(
    mut rx: tokio::sync::mpsc::UnboundedReceiver<crate::events::DaemonEvent>,
    ctx: SignalContext<'_>,
) {
    use crate::events::DaemonEvent;
    while let Some(event) = rx.recv().await {
        let result = match event {
            DaemonEvent::ProfileChanged(id) => UccInterface::active_profile_changed(&ctx, &id).await,
            DaemonEvent::ProfileCatalogChanged => UccInterface::profile_catalog_changed(&ctx).await,
            DaemonEvent::PowerStateChanged(state) => UccInterface::power_state_changed(&ctx, state.as_str()).await,
            DaemonEvent::AccessoryConnectionChanged(connected) => UccInterface::connection_changed(&ctx, connected).await,
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to emit daemon event signal");
        }
    }
}
