//! Profile engine (C7): built-in + custom profile catalog, active profile,
//! per-power-source state map. Every mutating operation takes the
//! engine's exclusive lock for its full duration, including `apply`, so a
//! `set_active_profile` is atomic with respect to every other engine
//! operation.

pub mod curve;
mod types;

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{error, warn};
use ucc_protocol::{FanProfileWire, KeyboardProfileWire, PowerState, ProfileIdRef, ProfileWire, WebcamSetting, FnLockSetting};

use ucc_error::{Result, UccError};

use crate::hal::Hal;
use crate::hal::cpu::{SENTINEL_HW_MAX, SENTINEL_REDUCED, SENTINEL_TO_MAX};
use crate::persistence::PersistenceStore;

/// Callbacks the daemon wires up so the engine can notify the RPC layer
/// and the fan worker without either depending on the other's crate.
pub trait ProfileEvents: Send + Sync {
    fn profile_changed(&self, id: &str);
    fn fan_binding_changed(&self, fan_profile_id: &str, auto_control_water_cooler: bool);
}

struct Catalogs {
    builtin_profiles: Vec<ProfileWire>,
    custom_profiles: Vec<ProfileWire>,
    builtin_fan_profiles: Vec<FanProfileWire>,
    custom_fan_profiles: Vec<FanProfileWire>,
    custom_keyboard_profiles: Vec<KeyboardProfileWire>,
    active_profile_id: String,
    state_map: HashMap<PowerState, String>,
}

pub struct ProfileEngine {
    catalogs: RwLock<Catalogs>,
    persistence: PersistenceStore,
    events: Box<dyn ProfileEvents>,
}

fn validate_profile(profile: &ProfileWire, known_fan_profile_ids: &[String]) -> Result<()> {
    if profile.name.is_empty() || profile.name.len() > crate::constants::limits::MAX_PROFILE_NAME_LEN {
        return Err(UccError::InvalidArgument("profile name must be 1-128 bytes".into()));
    }
    if profile.cpu.scaling_min_freq_khz > profile.cpu.scaling_max_freq_khz {
        return Err(UccError::InvalidArgument("scaling min freq must be <= max freq".into()));
    }
    if profile.charging.threshold_start_percent >= profile.charging.threshold_stop_percent {
        return Err(UccError::InvalidArgument("charging start threshold must be < stop threshold".into()));
    }
    if !profile.fan_binding.fan_profile_id.is_empty()
        && !known_fan_profile_ids.iter().any(|id| id == &profile.fan_binding.fan_profile_id)
    {
        return Err(UccError::InvalidArgument(format!(
            "fan profile '{}' does not exist",
            profile.fan_binding.fan_profile_id
        )));
    }
    Ok(())
}

impl ProfileEngine {
    pub fn new(persistence: PersistenceStore, events: Box<dyn ProfileEvents>) -> Result<Self> {
        let builtin_profiles = types::builtin_profiles();
        let builtin_fan_profiles = types::builtin_fan_profiles();
        let custom_profiles = persistence.load_profiles()?;
        let custom_fan_profiles = persistence.load_fan_profiles()?;
        let custom_keyboard_profiles = persistence.load_keyboard_profiles()?;
        let state_map = persistence.load_state_map()?;

        let active_profile_id = builtin_profiles
            .first()
            .map(|p| p.id.clone())
            .unwrap_or_default();

        Ok(Self {
            catalogs: RwLock::new(Catalogs {
                builtin_profiles,
                custom_profiles,
                builtin_fan_profiles,
                custom_fan_profiles,
                custom_keyboard_profiles,
                active_profile_id,
                state_map,
            }),
            persistence,
            events,
        })
    }

    /// Resolves the startup-active profile: state-map entry for `power`,
    /// falling back to the first built-in if the mapped id no longer
    /// resolves.
    pub fn resolve_initial_active(&self, power: PowerState) -> String {
        let catalogs = self.catalogs.read();
        if let Some(id) = catalogs.state_map.get(&power) {
            if Self::find(&catalogs, id).is_some() {
                return id.clone();
            }
        }
        catalogs.builtin_profiles.first().map(|p| p.id.clone()).unwrap_or_default()
    }

    fn find<'a>(catalogs: &'a Catalogs, id: &str) -> Option<&'a ProfileWire> {
        catalogs.builtin_profiles.iter().chain(catalogs.custom_profiles.iter()).find(|p| p.id == id)
    }

    fn find_fan<'a>(catalogs: &'a Catalogs, id: &str) -> Option<&'a FanProfileWire> {
        catalogs.builtin_fan_profiles.iter().chain(catalogs.custom_fan_profiles.iter()).find(|p| p.id == id)
    }

    pub fn list_profiles(&self) -> Vec<ProfileWire> {
        let catalogs = self.catalogs.read();
        catalogs.builtin_profiles.iter().chain(catalogs.custom_profiles.iter()).cloned().collect()
    }

    pub fn get_active_profile(&self) -> Option<ProfileWire> {
        let catalogs = self.catalogs.read();
        Self::find(&catalogs, &catalogs.active_profile_id).cloned()
    }

    /// Applies the profile to the HAL in the order the data model
    /// dictates, logging (not aborting on) individual step failures, and
    /// reports the first error encountered, if any.
    fn apply(&self, hal: &Hal, profile: &ProfileWire) -> Result<()> {
        let mut first_error: Option<UccError> = None;
        let mut note = |label: &str, result: Result<()>| {
            if let Err(e) = result {
                error!(step = label, error = %e, "profile application step failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        };

        hal.cpu.set_governor(&profile.cpu.governor);
        hal.cpu.set_energy_performance_preference(&profile.cpu.energy_performance_preference);
        note("online_core_count", hal.cpu.use_cores(profile.cpu.online_core_count as usize));

        let min_target = if profile.cpu.scaling_min_freq_khz == 0 {
            SENTINEL_TO_MAX
        } else {
            profile.cpu.scaling_min_freq_khz as i64
        };
        hal.cpu.set_min_freq(min_target);

        let max_target = if profile.cpu.scaling_max_freq_khz == u32::MAX {
            SENTINEL_HW_MAX
        } else if profile.cpu.scaling_max_freq_khz == i32::MAX as u32 / 4 {
            SENTINEL_REDUCED
        } else {
            profile.cpu.scaling_max_freq_khz as i64
        };
        // REDUCED on acpi-cpufreq enforces boost-disabled as part of the cap
        // itself (there is no lower scaling_max to fall back on), regardless
        // of what the profile's own boost_enabled field says.
        let reduced_forces_boost_off = hal.cpu.set_max_freq(max_target);
        hal.cpu.set_boost(profile.cpu.boost_enabled && !reduced_forces_boost_off);

        note("odm_mode", hal.odm().set_mode(&profile.odm_mode));

        note("charging", hal.charging().apply(&profile.charging));

        self.events.fan_binding_changed(
            &profile.fan_binding.fan_profile_id,
            profile.fan_binding.auto_control_water_cooler,
        );

        if let Some(reference) = &profile.keyboard_profile {
            match self.resolve_keyboard_profile(reference) {
                Some(kbd) => note("keyboard_profile", hal.keyboard().set_states(&kbd.states)),
                None => warn!(?reference, "profile references a keyboard profile that no longer exists"),
            }
        }

        if let Some(percent) = profile.display_brightness_percent {
            note("display_brightness", hal.display.set_percent(percent));
        }
        match profile.webcam {
            WebcamSetting::On => note("webcam", hal.webcam().set_enabled(true)),
            WebcamSetting::Off => note("webcam", hal.webcam().set_enabled(false)),
            WebcamSetting::Unchanged => {}
        }
        match profile.fn_lock {
            FnLockSetting::On => note("fn_lock", hal.fn_lock().set_enabled(true)),
            FnLockSetting::Off => note("fn_lock", hal.fn_lock().set_enabled(false)),
            FnLockSetting::Unchanged => {}
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Resolves `id`, applies it, and on any HAL error rolls back to the
    /// previously active profile on a best-effort basis before surfacing
    /// the error. On success emits `ProfileChanged(id)`.
    pub fn set_active_profile(&self, hal: &Hal, id: &str) -> Result<()> {
        let (profile, previous_id) = {
            let catalogs = self.catalogs.read();
            let profile = Self::find(&catalogs, id)
                .cloned()
                .ok_or_else(|| UccError::NotFound(format!("profile '{id}' not found")))?;
            (profile, catalogs.active_profile_id.clone())
        };

        match self.apply(hal, &profile) {
            Ok(()) => {
                self.catalogs.write().active_profile_id = id.to_string();
                self.events.profile_changed(id);
                Ok(())
            }
            Err(e) => {
                if previous_id != id {
                    let previous = {
                        let catalogs = self.catalogs.read();
                        Self::find(&catalogs, &previous_id).cloned()
                    };
                    if let Some(previous) = previous {
                        warn!(failed_id = id, rollback_to = %previous_id, "rolling back after failed profile apply");
                        let _ = self.apply(hal, &previous);
                    }
                }
                Err(e)
            }
        }
    }

    pub fn create_custom(&self, mut profile: ProfileWire) -> Result<ProfileWire> {
        let mut catalogs = self.catalogs.write();
        let fan_ids: Vec<String> = catalogs
            .builtin_fan_profiles
            .iter()
            .chain(catalogs.custom_fan_profiles.iter())
            .map(|p| p.id.clone())
            .collect();
        if profile.id.is_empty() {
            profile.id = format!("{:016x}", fastrand_id());
        }
        validate_profile(&profile, &fan_ids)?;
        profile.builtin = false;
        catalogs.custom_profiles.push(profile.clone());
        self.persistence.save_profiles(&catalogs.custom_profiles)?;
        Ok(profile)
    }

    pub fn update_custom(&self, id: &str, mut profile: ProfileWire) -> Result<()> {
        let mut catalogs = self.catalogs.write();
        if catalogs.builtin_profiles.iter().any(|p| p.id == id) {
            return Err(UccError::Conflict("cannot update a built-in profile".into()));
        }
        let fan_ids: Vec<String> = catalogs
            .builtin_fan_profiles
            .iter()
            .chain(catalogs.custom_fan_profiles.iter())
            .map(|p| p.id.clone())
            .collect();
        profile.id = id.to_string();
        profile.builtin = false;
        validate_profile(&profile, &fan_ids)?;
        let slot = catalogs
            .custom_profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| UccError::NotFound(format!("profile '{id}' not found")))?;
        *slot = profile;
        self.persistence.save_profiles(&catalogs.custom_profiles)?;
        Ok(())
    }

    pub fn delete_custom(&self, id: &str) -> Result<()> {
        let mut catalogs = self.catalogs.write();
        if catalogs.builtin_profiles.iter().any(|p| p.id == id) {
            return Err(UccError::Conflict("cannot delete a built-in profile".into()));
        }
        if catalogs.active_profile_id == id {
            return Err(UccError::Conflict("cannot delete the active profile".into()));
        }
        if catalogs.state_map.values().any(|v| v == id) {
            return Err(UccError::Conflict(format!("profile '{id}' is referenced by the state map")));
        }
        let before = catalogs.custom_profiles.len();
        catalogs.custom_profiles.retain(|p| p.id != id);
        if catalogs.custom_profiles.len() == before {
            return Err(UccError::NotFound(format!("profile '{id}' not found")));
        }
        self.persistence.save_profiles(&catalogs.custom_profiles)?;
        Ok(())
    }

    pub fn set_state_profile(&self, power: PowerState, id: &str) -> Result<()> {
        let mut catalogs = self.catalogs.write();
        if Self::find(&catalogs, id).is_none() {
            return Err(UccError::NotFound(format!("profile '{id}' not found")));
        }
        catalogs.state_map.insert(power, id.to_string());
        self.persistence.save_state_map(&catalogs.state_map)?;
        Ok(())
    }

    /// Resolves the state map for `power` and applies the result,
    /// falling back to the first built-in if the mapped id does not
    /// resolve. Called by the power-state worker on every observed
    /// transition.
    pub fn apply_state_for_power(&self, hal: &Hal, power: PowerState) -> Result<()> {
        let id = self.resolve_initial_active(power);
        self.set_active_profile(hal, &id)
    }

    pub fn list_fan_profiles(&self) -> Vec<FanProfileWire> {
        let catalogs = self.catalogs.read();
        catalogs.builtin_fan_profiles.iter().chain(catalogs.custom_fan_profiles.iter()).cloned().collect()
    }

    pub fn get_fan_profile(&self, id: &str) -> Option<FanProfileWire> {
        let catalogs = self.catalogs.read();
        Self::find_fan(&catalogs, id).cloned()
    }

    pub fn apply_fan_profiles(&self, profiles: Vec<FanProfileWire>) -> Result<()> {
        for profile in &profiles {
            curve::validate_curve(&profile.table_cpu)?;
            curve::validate_curve(&profile.table_gpu)?;
            curve::validate_curve(&profile.table_pump)?;
            curve::validate_curve(&profile.table_water_cooler_fan)?;
        }
        let mut catalogs = self.catalogs.write();
        for profile in profiles {
            if catalogs.builtin_fan_profiles.iter().any(|p| p.id == profile.id) {
                continue;
            }
            if let Some(slot) = catalogs.custom_fan_profiles.iter_mut().find(|p| p.id == profile.id) {
                *slot = profile;
            } else {
                catalogs.custom_fan_profiles.push(profile);
            }
        }
        self.persistence.save_fan_profiles(&catalogs.custom_fan_profiles)?;
        Ok(())
    }

    pub fn list_keyboard_profiles(&self) -> Vec<KeyboardProfileWire> {
        self.catalogs.read().custom_keyboard_profiles.clone()
    }

    /// Resolves a keyboard profile reference to a concrete profile,
    /// accepting either id or name. Canonicalizes to id form wherever the
    /// resolved reference is persisted back.
    pub fn resolve_keyboard_profile(&self, reference: &ProfileIdRef) -> Option<KeyboardProfileWire> {
        let catalogs = self.catalogs.read();
        match reference {
            ProfileIdRef::Id(id) => catalogs.custom_keyboard_profiles.iter().find(|p| &p.id == id).cloned(),
            ProfileIdRef::Name(name) => catalogs.custom_keyboard_profiles.iter().find(|p| &p.name == name).cloned(),
        }
    }

    pub fn save_keyboard_profile(&self, profile: KeyboardProfileWire) -> Result<()> {
        let mut catalogs = self.catalogs.write();
        if let Some(slot) = catalogs.custom_keyboard_profiles.iter_mut().find(|p| p.id == profile.id) {
            *slot = profile;
        } else {
            catalogs.custom_keyboard_profiles.push(profile);
        }
        self.persistence.save_keyboard_profiles(&catalogs.custom_keyboard_profiles)?;
        Ok(())
    }
}

/// Lightweight id generator for freshly created custom profiles. Not
/// cryptographically random — collision odds over a daemon's lifetime of
/// a handful of custom profiles are negligible — just needs to avoid
/// colliding with the static built-in ids.
fn fastrand_id() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    (nanos as u64) ^ 0x9E37_79B9_7F4A_7C15
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopEvents;
    impl ProfileEvents for NoopEvents {
        fn profile_changed(&self, _id: &str) {}
        fn fan_binding_changed(&self, _fan_profile_id: &str, _auto_control_water_cooler: bool) {}
    }

    fn engine() -> (ProfileEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let persistence = PersistenceStore::new(dir.path());
        let engine = ProfileEngine::new(persistence, Box::new(NoopEvents)).unwrap();
        (engine, dir)
    }

    #[test]
    fn lists_builtins_first() {
        let (engine, _dir) = engine();
        let profiles = engine.list_profiles();
        assert!(profiles.iter().all(|p| p.builtin));
        assert_eq!(profiles.len(), 3);
    }

    #[test]
    fn delete_fails_when_referenced_by_state_map() {
        let (engine, _dir) = engine();
        let custom = engine
            .create_custom(types_test_profile())
            .unwrap();
        engine.set_state_profile(PowerState::Bat, &custom.id).unwrap();
        let err = engine.delete_custom(&custom.id).unwrap_err();
        assert_eq!(err.class(), ucc_error::ErrorClass::Conflict);
    }

    fn types_test_profile() -> ProfileWire {
        use ucc_protocol::{ChargingPriority, ChargingProfileName, ChargingSettings, CpuSettings, FanBinding};
        ProfileWire {
            id: String::new(),
            name: "Test".into(),
            builtin: false,
            cpu: CpuSettings {
                governor: "schedutil".into(),
                energy_performance_preference: "balance_performance".into(),
                scaling_min_freq_khz: 800_000,
                scaling_max_freq_khz: 3_000_000,
                online_core_count: 4,
                boost_enabled: true,
            },
            display_brightness_percent: None,
            webcam: WebcamSetting::Unchanged,
            fn_lock: FnLockSetting::Unchanged,
            charging: ChargingSettings {
                profile: ucc_protocol::ChargingProfileName::Balanced,
                priority: ChargingPriority::Battery,
                threshold_start_percent: 40,
                threshold_stop_percent: 80,
            },
            odm_mode: "balanced".into(),
            fan_binding: FanBinding { fan_profile_id: String::new(), auto_control_water_cooler: true },
            keyboard_profile: None,
            unknown_fields: Default::default(),
        }
    }
}
