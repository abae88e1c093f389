//! Fn-lock toggle: swaps the default behavior of the F1-F12 row between
//! media keys and function keys.

use ucc_error::Result;

use crate::ec::EcTransport;

const FIELD_FN_LOCK: u16 = 0x91;

pub struct FnLockSwitch<'a> {
    ec: &'a EcTransport,
}

impl<'a> FnLockSwitch<'a> {
    pub fn new(ec: &'a EcTransport) -> Self {
        Self { ec }
    }

    pub fn get_enabled(&self) -> Option<bool> {
        self.ec.get_field(FIELD_FN_LOCK).map(|v| v != 0)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.ec.set_field(FIELD_FN_LOCK, enabled as u16)
    }
}
