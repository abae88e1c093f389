//! RAPL power-limit controller and power-source detection.

use ucc_error::Result;
use ucc_protocol::PowerState;

use crate::ec::EcTransport;
use crate::sysfs::SysfsAttr;

const FIELD_PL1: u16 = 0x80;
const FIELD_PL2: u16 = 0x81;
const FIELD_PL4: u16 = 0x82;
const FIELD_CTGP: u16 = 0x83;

const AC_ONLINE_PATH: &str = "/sys/class/power_supply/AC/online";

pub struct PowerController<'a> {
    ec: &'a EcTransport,
}

impl<'a> PowerController<'a> {
    pub fn new(ec: &'a EcTransport) -> Self {
        Self { ec }
    }

    pub fn set_pl1_watts(&self, watts: u32) -> Result<()> {
        self.ec.set_field(FIELD_PL1, watts as u16)
    }

    pub fn set_pl2_watts(&self, watts: u32) -> Result<()> {
        self.ec.set_field(FIELD_PL2, watts as u16)
    }

    pub fn set_pl4_watts(&self, watts: u32) -> Result<()> {
        self.ec.set_field(FIELD_PL4, watts as u16)
    }

    pub fn set_ctgp_watts(&self, watts: u32) -> Result<()> {
        self.ec.set_field(FIELD_CTGP, watts as u16)
    }
}

/// AC presence only; water-cooler connectivity is read separately by the
/// water-cooler controller. Resolving the full tri-state [`PowerState`]
/// (`ac` / `ac_wc` / `bat`) is the PowerStateWorker's job, since it also
/// needs water-cooler connectivity.
pub fn read_ac_online() -> Option<bool> {
    SysfsAttr::new(AC_ONLINE_PATH).read_bool()
}

pub fn resolve_power_state(ac_online: bool, water_cooler_connected: bool) -> PowerState {
    match (ac_online, water_cooler_connected) {
        (true, true) => PowerState::AcWc,
        (true, false) => PowerState::Ac,
        (false, _) => PowerState::Bat,
    }
}
