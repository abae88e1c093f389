//! External water-cooler accessory (optional capability). BLE connection
//! management is a pluggable provider out of scope here — this is only
//! the control surface once a connection exists.

use ucc_error::Result;

use crate::ec::EcTransport;

const FIELD_WC_ENABLED: u16 = 0x60;
const FIELD_WC_CONNECTED: u16 = 0x61;
const FIELD_WC_FAN_DUTY: u16 = 0x62;
const FIELD_WC_PUMP_VOLTAGE: u16 = 0x63;
const FIELD_WC_LED_R: u16 = 0x64;
const FIELD_WC_LED_G: u16 = 0x65;
const FIELD_WC_LED_B: u16 = 0x66;
const FIELD_WC_LED_MODE: u16 = 0x67;
const FIELD_WC_PUMP_LEVEL: u16 = 0x68;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpVoltage {
    Off = 4,
    V7 = 2,
    V8 = 3,
    V11 = 0,
}

pub struct WaterCoolerController<'a> {
    ec: &'a EcTransport,
}

impl<'a> WaterCoolerController<'a> {
    pub fn new(ec: &'a EcTransport) -> Self {
        Self { ec }
    }

    pub fn is_enabled(&self) -> bool {
        self.ec.get_field(FIELD_WC_ENABLED).map(|v| v != 0).unwrap_or(false)
    }

    pub fn enable(&self, enabled: bool) -> Result<()> {
        self.ec.set_field(FIELD_WC_ENABLED, enabled as u16)
    }

    pub fn get_connected(&self) -> bool {
        self.ec.get_field(FIELD_WC_CONNECTED).map(|v| v != 0).unwrap_or(false)
    }

    pub fn set_fan_duty(&self, percent: u8) -> Result<()> {
        self.ec.set_field(FIELD_WC_FAN_DUTY, percent as u16)
    }

    pub fn get_fan_duty(&self) -> Option<u8> {
        self.ec.get_field(FIELD_WC_FAN_DUTY).map(|v| v as u8)
    }

    pub fn set_pump_voltage(&self, code: PumpVoltage) -> Result<()> {
        self.ec.set_field(FIELD_WC_PUMP_VOLTAGE, code as u16)
    }

    pub fn get_pump_level(&self) -> Option<u8> {
        self.ec.get_field(FIELD_WC_PUMP_LEVEL).map(|v| v as u8)
    }

    pub fn set_led(&self, r: u8, g: u8, b: u8, mode: u8) -> Result<()> {
        self.ec.set_field(FIELD_WC_LED_R, r as u16)?;
        self.ec.set_field(FIELD_WC_LED_G, g as u16)?;
        self.ec.set_field(FIELD_WC_LED_B, b as u16)?;
        self.ec.set_field(FIELD_WC_LED_MODE, mode as u16)
    }

    pub fn turn_off_led(&self) -> Result<()> {
        self.set_led(0, 0, 0, 0)
    }
}
