//! Battery charging profile, priority, and start/stop thresholds.

use ucc_error::{Result, UccError};
use ucc_protocol::{ChargingPriority, ChargingProfileName, ChargingSettings};

use crate::ec::EcTransport;

const FIELD_CHARGE_PROFILE: u16 = 0x70;
const FIELD_CHARGE_PRIORITY: u16 = 0x71;
const FIELD_CHARGE_START: u16 = 0x72;
const FIELD_CHARGE_STOP: u16 = 0x73;

fn profile_code(p: ChargingProfileName) -> u16 {
    match p {
        ChargingProfileName::HighCapacity => 0,
        ChargingProfileName::Balanced => 1,
        ChargingProfileName::Stationary => 2,
    }
}

fn priority_code(p: ChargingPriority) -> u16 {
    match p {
        ChargingPriority::Battery => 0,
        ChargingPriority::Performance => 1,
    }
}

pub struct ChargingController<'a> {
    ec: &'a EcTransport,
}

impl<'a> ChargingController<'a> {
    pub fn new(ec: &'a EcTransport) -> Self {
        Self { ec }
    }

    /// `start < stop` is a data-model invariant; callers validate before
    /// this is reached, but the check is repeated here since it is cheap
    /// and this is the last line of defense before an EC write.
    pub fn apply(&self, settings: &ChargingSettings) -> Result<()> {
        if settings.threshold_start_percent >= settings.threshold_stop_percent {
            return Err(UccError::InvalidArgument(
                "charging start threshold must be less than stop threshold".into(),
            ));
        }
        self.ec.set_field(FIELD_CHARGE_PROFILE, profile_code(settings.profile))?;
        self.ec.set_field(FIELD_CHARGE_PRIORITY, priority_code(settings.priority))?;
        self.ec.set_field(FIELD_CHARGE_START, settings.threshold_start_percent as u16)?;
        self.ec.set_field(FIELD_CHARGE_STOP, settings.threshold_stop_percent as u16)
    }
}
