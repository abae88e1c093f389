//! Per-zone keyboard backlight control. Zone count is a device capability
//! (1, 3, or 126 for per-key) and is not re-derived here — the HAL is
//! handed the zone count from the capability record at construction.

use ucc_error::{Result, UccError};
use ucc_protocol::KeyboardZoneState;

use crate::ec::EcTransport;

const FIELD_KBD_BRIGHTNESS: u16 = 0x40;
const FIELD_KBD_ZONE_BASE: u16 = 0x41;
const FIELD_KBD_MAX_BRIGHTNESS: u16 = 0x42;

pub struct KeyboardInfo {
    pub zones: u32,
    pub max_brightness: u8,
    pub max_r: u8,
    pub max_g: u8,
    pub max_b: u8,
}

pub struct KeyboardBacklightController<'a> {
    ec: &'a EcTransport,
    zones: u32,
}

impl<'a> KeyboardBacklightController<'a> {
    pub fn new(ec: &'a EcTransport, zones: u32) -> Self {
        Self { ec, zones }
    }

    pub fn get_info(&self) -> KeyboardInfo {
        let max_brightness = self.ec.get_field(FIELD_KBD_MAX_BRIGHTNESS).unwrap_or(255) as u8;
        KeyboardInfo { zones: self.zones, max_brightness, max_r: 255, max_g: 255, max_b: 255 }
    }

    pub fn set_brightness(&self, value: u8) -> Result<()> {
        self.ec.set_field(FIELD_KBD_BRIGHTNESS, value as u16)
    }

    /// Writes one field group per zone, in order; rejects a states vector
    /// that does not match the device's zone count rather than silently
    /// truncating or padding.
    pub fn set_states(&self, states: &[KeyboardZoneState]) -> Result<()> {
        if states.len() as u32 != self.zones {
            return Err(UccError::InvalidArgument(format!(
                "expected {} keyboard zone states, got {}",
                self.zones,
                states.len()
            )));
        }
        for (i, state) in states.iter().enumerate() {
            let base = FIELD_KBD_ZONE_BASE + (i as u16) * 5;
            self.ec.set_field(base, state.mode as u16)?;
            self.ec.set_field(base + 1, state.brightness as u16)?;
            self.ec.set_field(base + 2, state.r as u16)?;
            self.ec.set_field(base + 3, state.g as u16)?;
            self.ec.set_field(base + 4, state.b as u16)?;
        }
        Ok(())
    }
}
