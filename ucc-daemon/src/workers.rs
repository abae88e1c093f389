//! Concrete polling workers (§5). Each one implements [`ucc_core::Worker`]
//! and is handed to the [`ucc_core::WorkerScheduler`] with its own tick
//! interval; the scheduler owns the thread and the cancellation flag, a
//! worker only owns the state it needs between ticks.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use ucc_core::constants::curve::FALLBACK_DUTY_PERCENT;
use ucc_core::constants::timing::{CPU_POWER_SAMPLE_EVERY_N_TICKS, NVIDIA_PRIME_RECHECK_EVERY_N_TICKS};
use ucc_core::hal::fan::FanChannel;
use ucc_core::hal::rapl::RaplPowerSampler;
use ucc_core::hal::watercooler::PumpVoltage;
use ucc_core::profile::curve::{evaluate_pump_level, FanCurveEvaluator};
use ucc_core::{hal, Worker};
use ucc_gpu::GpuVendor;
use ucc_protocol::{MetricId, Sample};

use crate::events::DaemonEvent;
use crate::state::SharedState;

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}

fn push(state: &SharedState, metric: MetricId, value: f64) {
    state.metrics.push(metric, Sample { timestamp_ms: now_ms(), value });
}

/// dGPU/iGPU split by vendor: Intel is always integrated on these boards,
/// anything else (NVIDIA, AMD) is the discrete part. Boards with two
/// discrete GPUs do not exist in this product line.
fn is_discrete(vendor: GpuVendor) -> bool {
    vendor != GpuVendor::Intel
}

/// Samples GPU telemetry, CPU frequency/temperature/power, and occasionally
/// rechecks NVIDIA PRIME render-offload availability. Owns the only
/// [`RaplPowerSampler`] instance in the process, since the rate computation
/// needs a single consistent previous-sample baseline.
pub struct HardwareMonitorWorker {
    state: SharedState,
    rapl: RaplPowerSampler,
    tick: u64,
}

impl HardwareMonitorWorker {
    pub fn new(state: SharedState) -> Self {
        Self { state, rapl: RaplPowerSampler::detect(), tick: 0 }
    }

    fn sample_gpus(&self) {
        match self.state.hal.gpu.snapshot() {
            Ok(snapshot) => {
                for gpu in &snapshot.gpus {
                    let discrete = is_discrete(gpu.vendor);
                    let temp = gpu.temperatures.first().and_then(|t| t.current_temp);
                    let power_metric = if discrete { MetricId::DGpuPower } else { MetricId::IGpuPower };
                    let freq_metric = if discrete { MetricId::DGpuFreq } else { MetricId::IGpuFreq };
                    if let Some(t) = temp {
                        push(&self.state, if discrete { MetricId::DGpuTemp } else { MetricId::IGpuTemp }, t as f64);
                    }
                    // Only the discrete part has a daemon-writable fan duty metric;
                    // the integrated GPU shares the CPU package cooler and has none.
                    if discrete {
                        if let Some(d) = gpu.fans.first().and_then(|f| f.speed_percent) {
                            push(&self.state, MetricId::DGpuDuty, d as f64);
                        }
                    }
                    if let Some(p) = gpu.power_watts {
                        push(&self.state, power_metric, p as f64);
                    }
                    // Core clock isn't exposed by ucc-gpu's snapshot; utilization
                    // is the closest proxy currently available for the freq metric.
                    if let Some(u) = gpu.utilization_percent {
                        push(&self.state, freq_metric, u as f64);
                    }
                }
            }
            Err(e) => debug!(error = %e, "gpu snapshot unavailable"),
        }
    }

    fn sample_cpu(&mut self) {
        if let Some(khz) = self.state.hal.cpu.current_frequency_khz(0) {
            push(&self.state, MetricId::CpuFreq, (khz as f64) / 1000.0);
        }
        if let Some(celsius) = self.state.hal.cpu_thermal.read_celsius() {
            push(&self.state, MetricId::CpuTemp, celsius as f64);
        }
        if self.tick % CPU_POWER_SAMPLE_EVERY_N_TICKS as u64 == 0 {
            if let Some(watts) = self.rapl.sample_watts() {
                push(&self.state, MetricId::CpuPower, watts as f64);
            }
        }
    }

    fn recheck_nvidia_prime(&self) {
        match ucc_gpu::enumerate_gpus() {
            Ok(gpus) => {
                let nvidia_present = gpus.iter().any(|g| g.vendor == GpuVendor::Nvidia);
                debug!(nvidia_present, "nvidia prime recheck");
            }
            Err(e) => debug!(error = %e, "nvidia prime recheck failed"),
        }
    }
}

impl Worker for HardwareMonitorWorker {
    fn name(&self) -> &str {
        "hardware-monitor"
    }

    fn on_work(&mut self) {
        self.sample_gpus();
        self.sample_cpu();
        if self.tick % NVIDIA_PRIME_RECHECK_EVERY_N_TICKS as u64 == 0 {
            self.recheck_nvidia_prime();
        }
        self.tick = self.tick.wrapping_add(1);
    }
}

/// Drives the CPU and GPU fan channels, and the water cooler's fan/pump if
/// one is connected and bound for automatic control, from the active fan
/// profile's curves. Reads [`crate::state::FanBindingState`] fresh every
/// tick so a profile switch takes effect on the next tick, not the next
/// restart.
pub struct FanControlWorker {
    state: SharedState,
    cpu: FanCurveEvaluator,
    gpu1: FanCurveEvaluator,
    gpu2: FanCurveEvaluator,
    wc_fan: FanCurveEvaluator,
}

impl FanControlWorker {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            cpu: FanCurveEvaluator::new(),
            gpu1: FanCurveEvaluator::new(),
            gpu2: FanCurveEvaluator::new(),
            wc_fan: FanCurveEvaluator::new(),
        }
    }

    fn gpu_temp(&self) -> Option<f32> {
        let snapshot = self.state.hal.gpu.snapshot().ok()?;
        snapshot
            .gpus
            .iter()
            .find(|g| is_discrete(g.vendor))
            .and_then(|g| g.temperatures.first())
            .and_then(|t| t.current_temp)
    }
}

impl Worker for FanControlWorker {
    fn name(&self) -> &str {
        "fan-control"
    }

    fn on_work(&mut self) {
        let binding = self.state.fan_binding.lock().clone();
        if binding.fan_profile_id.is_empty() {
            return;
        }
        let Some(profile) = self.state.profiles.get_fan_profile(&binding.fan_profile_id) else {
            warn!(fan_profile_id = %binding.fan_profile_id, "bound fan profile no longer exists");
            return;
        };

        let fan = self.state.hal.fan();

        let cpu_temp = self.state.hal.cpu_thermal.read_celsius();
        let cpu_duty = match cpu_temp {
            Some(t) => self.cpu.evaluate(&profile.table_cpu, t),
            None => (self.cpu.last_duty().is_none()).then_some(FALLBACK_DUTY_PERCENT),
        };
        if let Some(duty) = cpu_duty {
            if let Err(e) = fan.set_duty(FanChannel::Cpu, duty as u8) {
                warn!(error = %e, "failed to write cpu fan duty");
            } else {
                push(&self.state, MetricId::CpuDuty, duty as f64);
            }
        }

        let gpu_temp = self.gpu_temp();
        let gpu1_duty = match gpu_temp {
            Some(t) => self.gpu1.evaluate(&profile.table_gpu, t),
            None => (self.gpu1.last_duty().is_none()).then_some(FALLBACK_DUTY_PERCENT),
        };
        if let Some(duty) = gpu1_duty {
            if let Err(e) = fan.set_duty(FanChannel::Gpu1, duty as u8) {
                warn!(error = %e, "failed to write gpu1 fan duty");
            } else {
                push(&self.state, MetricId::DGpuDuty, duty as f64);
            }
        }
        let gpu2_duty = match gpu_temp {
            Some(t) => self.gpu2.evaluate(&profile.table_gpu, t),
            None => (self.gpu2.last_duty().is_none()).then_some(FALLBACK_DUTY_PERCENT),
        };
        if let Some(duty) = gpu2_duty {
            if let Err(e) = fan.set_duty(FanChannel::Gpu2, duty as u8) {
                warn!(error = %e, "failed to write gpu2 fan duty");
            }
        }

        if !binding.auto_control_water_cooler || !self.state.hal.water_cooler_supported {
            return;
        }
        let Some(wc) = self.state.hal.water_cooler() else { return };
        if !wc.get_connected() {
            return;
        }
        let wc_temp = cpu_temp.or(gpu_temp).unwrap_or(FALLBACK_DUTY_PERCENT);
        if let Some(duty) = self.wc_fan.evaluate(&profile.table_water_cooler_fan, wc_temp) {
            if let Err(e) = wc.set_fan_duty(duty as u8) {
                warn!(error = %e, "failed to write water cooler fan duty");
            } else {
                push(&self.state, MetricId::WcFanDuty, duty as f64);
            }
        }
        let pump_level = evaluate_pump_level(&profile.table_pump, wc_temp);
        let voltage = match pump_level {
            0 => PumpVoltage::Off,
            1 => PumpVoltage::V7,
            2 => PumpVoltage::V8,
            _ => PumpVoltage::V11,
        };
        if let Err(e) = wc.set_pump_voltage(voltage) {
            warn!(error = %e, "failed to write water cooler pump voltage");
        } else {
            push(&self.state, MetricId::WcPumpLevel, pump_level as f64);
        }
    }
}

/// Resolves AC/water-cooler presence into a [`ucc_protocol::PowerState`],
/// debounced against a couple of flaky readings, and drives both the
/// power-state-changed signal and the state-map's profile switch.
pub struct PowerStateWorker {
    state: SharedState,
    events: UnboundedSender<DaemonEvent>,
    last_observed: Option<ucc_protocol::PowerState>,
    stable_count: u32,
}

impl PowerStateWorker {
    pub fn new(state: SharedState, events: UnboundedSender<DaemonEvent>) -> Self {
        Self { state, events, last_observed: None, stable_count: 0 }
    }
}

impl Worker for PowerStateWorker {
    fn name(&self) -> &str {
        "power-state"
    }

    fn on_work(&mut self) {
        let ac_online = hal::power::read_ac_online().unwrap_or(false);
        let wc_connected =
            self.state.hal.water_cooler_supported && self.state.hal.water_cooler().map(|w| w.get_connected()).unwrap_or(false);
        let observed = hal::power::resolve_power_state(ac_online, wc_connected);

        if self.last_observed == Some(observed) {
            self.stable_count += 1;
        } else {
            self.last_observed = Some(observed);
            self.stable_count = 1;
        }

        if self.stable_count != ucc_core::constants::timing::POWER_STATE_DEBOUNCE_READINGS {
            return;
        }

        let current = *self.state.power_state.lock();
        if current == observed {
            return;
        }

        *self.state.power_state.lock() = observed;
        if self.events.send(DaemonEvent::PowerStateChanged(observed)).is_err() {
            warn!("event channel closed while reporting power state change");
        }
        if let Err(e) = self.state.profiles.apply_state_for_power(&self.state.hal, observed) {
            warn!(error = %e, power_state = %observed, "failed to apply state-bound profile on power transition");
        }
    }
}

/// Polls water-cooler connectivity on a slower cadence than the power-state
/// worker and reports edge changes as a connection signal. Real accessory
/// pairing (BLE discovery/bonding) is out of scope; this only reflects
/// whether an already-paired accessory currently answers on the EC bus.
pub struct AccessoryDiscoveryWorker {
    state: SharedState,
    events: UnboundedSender<DaemonEvent>,
    last_connected: Option<bool>,
}

impl AccessoryDiscoveryWorker {
    pub fn new(state: SharedState, events: UnboundedSender<DaemonEvent>) -> Self {
        Self { state, events, last_connected: None }
    }
}

impl Worker for AccessoryDiscoveryWorker {
    fn name(&self) -> &str {
        "accessory-discovery"
    }

    fn on_work(&mut self) {
        let Some(wc) = self.state.hal.water_cooler() else { return };
        let connected = wc.get_connected();
        if self.last_connected == Some(connected) {
            return;
        }
        self.last_connected = Some(connected);
        if self.events.send(DaemonEvent::AccessoryConnectionChanged(connected)).is_err() {
            warn!("event channel closed while reporting accessory connection change");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intel_is_integrated_everything_else_discrete() {
        assert!(!is_discrete(GpuVendor::Intel));
        assert!(is_discrete(GpuVendor::Nvidia));
        assert!(is_discrete(GpuVendor::Amd));
    }
}
