//! uccd — privileged control daemon (C11: daemon controller)
//!
//! Arbitrates access to embedded-controller and sysfs hardware on behalf
//! of unprivileged GUI clients, over a system-bus RPC surface gated by
//! Polkit. See `SPEC_FULL.md` for the full component breakdown.
//!
//! # Hardening measures (carried from the fan-control daemon this is
//! descended from)
//! - Environment sanitization (strip dangerous env vars, fix `PATH`)
//! - Resource limits (`RLIMIT_NOFILE`, `RLIMIT_CORE`, `RLIMIT_AS`, `RLIMIT_DATA`)
//! - Restrictive umask (0077) and working directory pinned to `/`
//! - No core dumps
//! - PID file with stale-instance detection

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use zbus::SignalContext;

use ucc_core::constants::{paths, timing};
use ucc_core::{DeviceIdentity, EcTransport, Hal, MetricsStore, PersistenceStore, ProfileEngine, WorkerScheduler};

use ucc_daemon::events::ChannelEvents;
use ucc_daemon::process::{self, Mode, PID_FILE, VERSION};
use ucc_daemon::state::{AppState, FanBindingState};
use ucc_daemon::workers::{AccessoryDiscoveryWorker, FanControlWorker, HardwareMonitorWorker, PowerStateWorker};
use ucc_daemon::{rpc, state};

const BUS_NAME: &str = "com.uccd.ControlCenter";
const OBJECT_PATH: &str = "/com/uccd/ControlCenter";

// ============================================================================
// Entry point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())).unwrap_or_default();
        eprintln!("PANIC at {location}: {info}");
    }));

    process::sanitize_environment();
    process::set_secure_umask();
    process::set_resource_limits();
    process::secure_working_directory();

    match process::parse_args() {
        Mode::Stop => {
            init_logging();
            process::signal_running_instance(Path::new(PID_FILE));
            return;
        }
        Mode::Start => {}
    }

    init_logging();
    info!(version = VERSION, "starting");

    if let Err(e) = process::verify_privileges() {
        error!("{e}");
        std::process::exit(1);
    }

    if let Err(e) = process::write_pid_file(Path::new(PID_FILE)) {
        error!(error = %e, "could not write pid file");
        std::process::exit(1);
    }

    if let Err(e) = run().await {
        error!(error = %e, "fatal error, shutting down");
        process::remove_pid_file(Path::new(PID_FILE));
        std::process::exit(1);
    }

    process::remove_pid_file(Path::new(PID_FILE));
}

/// Logging always goes to the system journal under the identifier `uccd`
/// (§4.11 step 2, §6: the daemon reads no environment variables that
/// alter behavior, so there is no log-level override here).
fn init_logging() {
    let use_journald = Path::new("/run/systemd/journal/socket").exists();
    if use_journald {
        match tracing_journald::layer() {
            Ok(layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry().with(layer).with(tracing_subscriber::EnvFilter::new("info")).init();
                return;
            }
            Err(e) => eprintln!("failed to open journald socket: {e}, falling back to stdout"),
        }
    }
    tracing_subscriber::fmt().with_target(false).with_env_filter("info").init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Step 3: open EC transport; failure means "unsupported", exit 0.
    let ec = match EcTransport::open(Path::new(paths::EC_CHAR_DEVICE)) {
        Ok(ec) => ec,
        Err(e) => {
            info!(error = %e, "embedded controller unavailable, treating as unsupported");
            return Ok(());
        }
    };

    // Step 4: detect device identity.
    let device = DeviceIdentity::detect();
    if !device.is_supported() {
        warn!(?device.dmi, "device not recognized, publishing IsDeviceSupported=false and exiting after grace period");
        return run_unsupported().await;
    }
    info!(device = ?device.capabilities.id, "device identity resolved");

    // Step 5: build HAL capability by capability.
    let hal = Hal::build(ec, &device.capabilities);

    // Step 6: load profiles, resolve initial active profile, apply it.
    let persistence = PersistenceStore::default_location();
    let fan_binding = Arc::new(Mutex::new(FanBindingState::default()));
    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
    let channel_events = ChannelEvents::new(event_tx.clone(), fan_binding.clone());
    let profiles = ProfileEngine::new(persistence, Box::new(channel_events))?;

    let ac_online = ucc_core::hal::power::read_ac_online().unwrap_or(false);
    let wc_connected = hal.water_cooler_supported && hal.water_cooler().map(|wc| wc.get_connected()).unwrap_or(false);
    let initial_power = ucc_core::hal::power::resolve_power_state(ac_online, wc_connected);

    let initial_id = profiles.resolve_initial_active(initial_power);
    if let Err(e) = profiles.set_active_profile(&hal, &initial_id) {
        warn!(error = %e, profile = initial_id, "failed to apply initial profile, continuing with HAL defaults");
    }

    let state: state::SharedState = Arc::new(AppState {
        hal,
        device,
        metrics: MetricsStore::new(),
        profiles,
        power_state: Mutex::new(initial_power),
        fan_binding,
        last_keyboard_states: Mutex::new(None),
    });

    // Step 7: start workers in order.
    let mut scheduler = WorkerScheduler::new();
    scheduler.spawn(Box::new(HardwareMonitorWorker::new(state.clone())), timing::HARDWARE_MONITOR_TICK);
    scheduler.spawn(Box::new(PowerStateWorker::new(state.clone(), event_tx.clone())), timing::POWER_STATE_TICK);
    scheduler.spawn(Box::new(FanControlWorker::new(state.clone())), timing::FAN_CONTROL_TICK);
    if state.hal.water_cooler_supported {
        scheduler.spawn(Box::new(AccessoryDiscoveryWorker::new(state.clone(), event_tx)), timing::POWER_STATE_TICK);
    } else {
        debug!("no water cooler on this device, skipping accessory discovery worker");
    }

    // Step 8: register the RPC endpoint and run until signalled.
    let connection = zbus::Connection::system().await?;
    let iface = rpc::UccInterface { state: state.clone(), connection: connection.clone() };
    connection.object_server().at(OBJECT_PATH, iface).await?;
    connection.request_name(BUS_NAME).await?;
    let ctx = SignalContext::new(&connection, OBJECT_PATH)?;
    info!(bus_name = BUS_NAME, object_path = OBJECT_PATH, "rpc endpoint registered");

    tokio::select! {
        _ = rpc::run_event_bridge(event_rx, ctx) => {
            warn!("event bridge exited unexpectedly");
        }
        _ = wait_for_shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    // Stop sequence: drop the bus name, cancel workers, close EC.
    // Persisted catalogs are already written atomically on every mutation
    // (see `ucc_core::persistence`), so there is nothing left to flush here.
    let _ = connection.release_name(BUS_NAME).await;
    scheduler.shutdown();
    drop(state);
    info!("shutdown complete");
    Ok(())
}

/// Registers only `IsDeviceSupported=false` and exits after the grace
/// period so the bus activator does not spin up a fresh instance in a
/// tight restart loop.
async fn run_unsupported() -> Result<(), Box<dyn std::error::Error>> {
    let connection = zbus::Connection::system().await?;
    connection.object_server().at(OBJECT_PATH, rpc::UnsupportedInterface).await?;
    connection.request_name(BUS_NAME).await?;
    tokio::select! {
        _ = tokio::time::sleep(timing::UNSUPPORTED_DEVICE_GRACE_PERIOD) => {}
        _ = wait_for_shutdown_signal() => {}
    }
    let _ = connection.release_name(BUS_NAME).await;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}
