//! Vendor ODM performance-mode switch: a single EC field holding an index
//! into the capability record's named mode list (e.g. "quiet", "balanced",
//! "performance"). Unlike the other EC fields, there is no fixed mode count
//! across models, so the index space is resolved against whatever list
//! [`crate::device::CapabilityRecord::odm_modes`] reported at startup.

use ucc_error::{Result, UccError};

use crate::ec::EcTransport;

const FIELD_ODM_MODE: u16 = 0x95;

pub struct OdmController<'a> {
    ec: &'a EcTransport,
    modes: &'a [String],
}

impl<'a> OdmController<'a> {
    pub fn new(ec: &'a EcTransport, modes: &'a [String]) -> Self {
        Self { ec, modes }
    }

    pub fn available_modes(&self) -> &[String] {
        self.modes
    }

    pub fn get_mode(&self) -> Option<String> {
        let idx = self.ec.get_field(FIELD_ODM_MODE)? as usize;
        self.modes.get(idx).cloned()
    }

    pub fn set_mode(&self, name: &str) -> Result<()> {
        let idx = self
            .modes
            .iter()
            .position(|m| m == name)
            .ok_or_else(|| UccError::InvalidArgument(format!("unknown odm mode '{name}'")))?;
        self.ec.set_field(FIELD_ODM_MODE, idx as u16)
    }
}
