//! Hardware webcam kill switch, backed by an EC field rather than a
//! sysfs node — the shutter itself is wired through the EC on these
//! boards.

use ucc_error::Result;

use crate::ec::EcTransport;

const FIELD_WEBCAM_ENABLED: u16 = 0x90;

pub struct WebcamSwitch<'a> {
    ec: &'a EcTransport,
}

impl<'a> WebcamSwitch<'a> {
    pub fn new(ec: &'a EcTransport) -> Self {
        Self { ec }
    }

    pub fn get_enabled(&self) -> Option<bool> {
        self.ec.get_field(FIELD_WEBCAM_ENABLED).map(|v| v != 0)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.ec.set_field(FIELD_WEBCAM_ENABLED, enabled as u16)
    }
}
