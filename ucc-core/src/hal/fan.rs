//! Per-channel fan readout and duty control over the EC. Actual writes
//! happen only from the FanControlWorker (§5); this controller is the
//! narrow capability interface the worker and the profile engine drive it
//! through.

use ucc_error::Result;

use crate::ec::EcTransport;

const FIELD_FAN_MODE: u16 = 0x10;
const MODE_AUTO: u16 = 0;
const MODE_MANUAL: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanChannel {
    Cpu,
    Gpu1,
    Gpu2,
}

impl FanChannel {
    fn index(self) -> u8 {
        match self {
            FanChannel::Cpu => 0,
            FanChannel::Gpu1 => 1,
            FanChannel::Gpu2 => 2,
        }
    }
}

pub struct FanController<'a> {
    ec: &'a EcTransport,
}

impl<'a> FanController<'a> {
    pub fn new(ec: &'a EcTransport) -> Self {
        Self { ec }
    }

    pub fn get_rpm(&self, channel: FanChannel) -> Option<u16> {
        self.ec.get_fan_info(channel.index()).map(|info| info.rpm)
    }

    pub fn get_duty(&self, channel: FanChannel) -> Option<u8> {
        self.ec.get_fan_info(channel.index()).map(|info| info.duty_pct)
    }

    pub fn set_mode_auto(&self, auto: bool) -> Result<()> {
        self.ec.set_field(FIELD_FAN_MODE, if auto { MODE_AUTO } else { MODE_MANUAL })
    }

    /// Duty as a whole percent 0..=100.
    pub fn set_duty(&self, channel: FanChannel, percent: u8) -> Result<()> {
        let field = 0x20 + channel.index() as u16;
        self.ec.set_field(field, percent as u16)
    }
}
