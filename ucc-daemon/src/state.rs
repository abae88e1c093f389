//! Shared state wired between the workers and the RPC surface. Every
//! field is already internally synchronized (the HAL's EC mutex, the
//! metrics store's reader-writer lock, the profile engine's own lock) so
//! `AppState` itself needs no additional locking beyond what each field
//! provides.

use std::sync::Arc;

use parking_lot::Mutex;
use ucc_core::{DeviceIdentity, Hal, MetricsStore, ProfileEngine};
use ucc_protocol::{KeyboardZoneState, PowerState};

/// Fan-profile binding the FanControlWorker reads at the top of every
/// tick. Updated by the profile engine's `fan_binding_changed` callback
/// and by `ApplyFanProfiles`, which only ever changes the catalog, not
/// this binding, so a profile switch and a curve edit compose correctly.
#[derive(Debug, Clone, Default)]
pub struct FanBindingState {
    pub fan_profile_id: String,
    pub auto_control_water_cooler: bool,
}

pub struct AppState {
    pub hal: Hal,
    pub device: DeviceIdentity,
    pub metrics: MetricsStore,
    pub profiles: ProfileEngine,
    pub power_state: Mutex<PowerState>,
    /// Shared with the [`crate::events::ChannelEvents`] callback handed to
    /// the profile engine at construction, so both the worker and the
    /// engine write through the same cell.
    pub fan_binding: Arc<Mutex<FanBindingState>>,
    /// The EC has no "read back keyboard state" register; the daemon is
    /// the only writer, so it is the source of truth for reads too.
    pub last_keyboard_states: Mutex<Option<Vec<KeyboardZoneState>>>,
}

pub type SharedState = Arc<AppState>;
