use serde::{Deserialize, Serialize};

/// Power-source states recognized by the power-state worker (C6) and
/// resolved against the profile engine's state map (C7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    /// On AC power, no water-cooler accessory connected.
    Ac,
    /// On AC power with the water-cooler accessory connected.
    AcWc,
    /// Running on battery.
    Bat,
}

impl PowerState {
    pub const ALL: [PowerState; 3] = [PowerState::Ac, PowerState::AcWc, PowerState::Bat];

    pub fn as_str(self) -> &'static str {
        match self {
            PowerState::Ac => "ac",
            PowerState::AcWc => "ac_wc",
            PowerState::Bat => "bat",
        }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PowerState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ac" => Ok(PowerState::Ac),
            "ac_wc" => Ok(PowerState::AcWc),
            "bat" => Ok(PowerState::Bat),
            _ => Err(()),
        }
    }
}
