//! GPU telemetry: thin pass-through to [`ucc_gpu`], which already handles
//! the NVIDIA/AMD/Intel backend split.

use ucc_error::Result;
use ucc_gpu::GpuSnapshot;

pub struct GpuTelemetry;

impl GpuTelemetry {
    pub fn new() -> Self {
        Self
    }

    pub fn snapshot(&self) -> Result<GpuSnapshot> {
        ucc_gpu::capture_gpu_snapshot()
    }

    pub fn set_fan_speed(&self, controller_id: &str, percent: u32) -> Result<()> {
        ucc_gpu::set_gpu_fan_speed_by_id(controller_id, percent)
    }
}

impl Default for GpuTelemetry {
    fn default() -> Self {
        Self::new()
    }
}
