//! Display backlight brightness, over the standard `backlight` sysfs class.

use ucc_error::Result;

use crate::sysfs::SysfsAttr;

const BACKLIGHT_ROOT: &str = "/sys/class/backlight/intel_backlight";

pub struct DisplayBrightness {
    brightness: SysfsAttr,
    max_brightness: SysfsAttr,
}

impl DisplayBrightness {
    pub fn detect() -> Self {
        Self {
            brightness: SysfsAttr::new(format!("{BACKLIGHT_ROOT}/brightness")),
            max_brightness: SysfsAttr::new(format!("{BACKLIGHT_ROOT}/max_brightness")),
        }
    }

    pub fn is_available(&self) -> bool {
        self.brightness.is_available() && self.max_brightness.is_available()
    }

    pub fn get_percent(&self) -> Option<u8> {
        let max = self.max_brightness.read_i32()?;
        let cur = self.brightness.read_i32()?;
        if max == 0 {
            return None;
        }
        Some(((cur as f32 / max as f32) * 100.0).round() as u8)
    }

    pub fn set_percent(&self, percent: u8) -> Result<()> {
        let max = self.max_brightness.read_i32().unwrap_or(255);
        let raw = ((percent.min(100) as f32 / 100.0) * max as f32).round() as i32;
        self.brightness.write_i32(raw)
    }
}
