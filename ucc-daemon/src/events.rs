//! Bridges the profile engine's synchronous callbacks (fired from RPC
//! handler threads or worker threads) to the async signal emission the
//! zbus interface needs. A worker thread can call `UnboundedSender::send`
//! without an executor; the receiving end, run as a tokio task, is the
//! only place that touches a `SignalContext`.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;
use ucc_core::ProfileEvents;
use ucc_protocol::PowerState;

use crate::state::FanBindingState;

#[derive(Debug, Clone)]
pub enum DaemonEvent {
    ProfileChanged(String),
    ProfileCatalogChanged,
    PowerStateChanged(PowerState),
    AccessoryConnectionChanged(bool),
}

pub struct ChannelEvents {
    tx: UnboundedSender<DaemonEvent>,
    fan_binding: Arc<Mutex<FanBindingState>>,
}

impl ChannelEvents {
    pub fn new(tx: UnboundedSender<DaemonEvent>, fan_binding: Arc<Mutex<FanBindingState>>) -> Self {
        Self { tx, fan_binding }
    }

    fn send(&self, event: DaemonEvent) {
        if self.tx.send(event).is_err() {
            warn!("event channel closed, dropping daemon event");
        }
    }
}

impl ProfileEvents for ChannelEvents {
    fn profile_changed(&self, id: &str) {
        self.send(DaemonEvent::ProfileChanged(id.to_string()));
    }

    fn fan_binding_changed(&self, fan_profile_id: &str, auto_control_water_cooler: bool) {
        *self.fan_binding.lock() =
            FanBindingState { fan_profile_id: fan_profile_id.to_string(), auto_control_water_cooler };
    }
}
