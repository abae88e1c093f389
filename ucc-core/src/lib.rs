//! Control daemon core library.
//!
//! Everything the daemon binary needs that isn't wire format (`ucc-protocol`)
//! or process plumbing (`ucc-daemon`): sysfs/EC access, device identity,
//! the hardware abstraction layer, the metrics history store, the worker
//! scheduler, and the profile engine.
//!
//! # Module Structure
//!
//! - `sysfs` / `ec` - low-level hardware transports
//! - `device` - DMI/PCI identity and capability resolution
//! - `hal` - typed capability controllers built on `sysfs`/`ec`
//! - `metrics` - bounded per-metric history ring
//! - `worker` - OS-thread worker scheduler
//! - `profile` - built-in/custom profile catalogs and the curve evaluator
//! - `persistence` - atomic JSON persistence for custom catalogs

pub mod constants;
pub mod device;
pub mod ec;
pub mod hal;
pub mod metrics;
pub mod persistence;
pub mod profile;
pub mod sysfs;
pub mod worker;

// Re-export error types for convenience so downstream crates need only
// depend on `ucc-core` for the common path.
pub use ucc_error::{ErrorClass, Result, UccError};

// Re-export transport and identity types
pub use device::{CapabilityRecord, DeviceIdentity, DmiInfo, PowerLimitSlot, UniwillDeviceId};
pub use ec::EcTransport;
pub use sysfs::SysfsAttr;

// Re-export the HAL entry point
pub use hal::Hal;

// Re-export metrics store
pub use metrics::MetricsStore;

// Re-export worker scheduling
pub use worker::{CancelFlag, Worker, WorkerScheduler};

// Re-export the profile engine
pub use persistence::PersistenceStore;
pub use profile::{curve::FanCurveEvaluator, ProfileEngine, ProfileEvents};
