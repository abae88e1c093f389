//! Hardware abstraction layer (C3): capability sub-interfaces, each only
//! constructed if its preconditions (sysfs paths, device capabilities)
//! are met. Owned by the daemon controller; workers and RPC handlers hold
//! borrows plus, where they mutate, a capability-scoped write path that
//! ultimately funnels through [`crate::ec::EcTransport`]'s single mutex.

pub mod charging;
pub mod cpu;
pub mod display;
pub mod fan;
pub mod fnlock;
pub mod gpu;
pub mod keyboard;
pub mod odm;
pub mod power;
pub mod rapl;
pub mod thermal;
pub mod watercooler;
pub mod webcam;

use crate::device::CapabilityRecord;
use crate::ec::EcTransport;

/// Aggregates every capability available on this device. Capabilities
/// gated on hardware presence (water cooler) are `Option`; the rest are
/// assumed universal (every supported device has a CPU, a display, a
/// webcam switch and an fn-lock switch, even if some report "absent" on
/// read).
pub struct Hal {
    pub ec: EcTransport,
    pub cpu: cpu::CpuController,
    pub cpu_thermal: thermal::CpuThermal,
    pub display: display::DisplayBrightness,
    pub gpu: gpu::GpuTelemetry,
    pub keyboard_zones: u32,
    pub water_cooler_supported: bool,
    pub odm_modes: Vec<String>,
}

impl Hal {
    pub fn build(ec: EcTransport, capabilities: &CapabilityRecord) -> Self {
        Self {
            ec,
            cpu: cpu::CpuController::detect(),
            cpu_thermal: thermal::CpuThermal::detect(),
            display: display::DisplayBrightness::detect(),
            gpu: gpu::GpuTelemetry::new(),
            keyboard_zones: capabilities.keyboard_zones,
            water_cooler_supported: capabilities.water_cooler_supported,
            odm_modes: capabilities.odm_modes.clone(),
        }
    }

    pub fn odm(&self) -> odm::OdmController<'_> {
        odm::OdmController::new(&self.ec, &self.odm_modes)
    }

    pub fn fan(&self) -> fan::FanController<'_> {
        fan::FanController::new(&self.ec)
    }

    pub fn keyboard(&self) -> keyboard::KeyboardBacklightController<'_> {
        keyboard::KeyboardBacklightController::new(&self.ec, self.keyboard_zones)
    }

    pub fn water_cooler(&self) -> Option<watercooler::WaterCoolerController<'_>> {
        self.water_cooler_supported.then(|| watercooler::WaterCoolerController::new(&self.ec))
    }

    pub fn charging(&self) -> charging::ChargingController<'_> {
        charging::ChargingController::new(&self.ec)
    }

    pub fn power(&self) -> power::PowerController<'_> {
        power::PowerController::new(&self.ec)
    }

    pub fn webcam(&self) -> webcam::WebcamSwitch<'_> {
        webcam::WebcamSwitch::new(&self.ec)
    }

    pub fn fn_lock(&self) -> fnlock::FnLockSwitch<'_> {
        fnlock::FnLockSwitch::new(&self.ec)
    }
}
