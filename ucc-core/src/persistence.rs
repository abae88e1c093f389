//! Custom-profile persistence (C12): one JSON file per category under a
//! root-writable config directory, written atomically (temp file, fsync,
//! rename). Loads tolerate a missing file — treated as an empty catalog,
//! never an error.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use ucc_error::{Result, UccError};
use ucc_protocol::{KeyboardProfileWire, PowerState, ProfileWire};

use crate::constants::paths;

/// Versioned wrapper so the schema can evolve; unknown fields in `items`
/// round-trip untouched because `ProfileWire`/`FanProfileWire`/
/// `KeyboardProfileWire` each carry a `#[serde(flatten)]` catch-all map
/// that captures anything not named in the struct and serializes it back
/// out unchanged. Plain missing `#[serde(deny_unknown_fields)]` alone
/// would not do this — derived `Deserialize` drops unrecognized fields by
/// default, it only turns into a hard error with that attribute present.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Catalog<T> {
    #[serde(default = "current_version")]
    version: u32,
    #[serde(default)]
    items: Vec<T>,
}

fn current_version() -> u32 {
    1
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self { version: 1, items: Vec::new() }
    }
}

fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| UccError::hw_write(path, e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension("json.tmp");

    let mut file = fs::File::create(&temp_path).map_err(|e| UccError::hw_write(&temp_path, e.to_string()))?;
    file.write_all(json.as_bytes()).map_err(|e| UccError::hw_write(&temp_path, e.to_string()))?;
    file.sync_all().map_err(|e| UccError::hw_write(&temp_path, e.to_string()))?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| UccError::hw_write(path, e.to_string()))?;
    Ok(())
}

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        debug!(path = %path.display(), "no persisted file, starting empty");
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path).map_err(|e| UccError::hw_read(path, e.to_string()))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Owns the config directory and mediates every read/write of the four
/// persisted categories. One instance is shared by the profile engine.
pub struct PersistenceStore {
    config_dir: PathBuf,
}

impl PersistenceStore {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self { config_dir: config_dir.into() }
    }

    pub fn default_location() -> Self {
        Self::new(paths::CONFIG_DIR)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.config_dir.join(file)
    }

    pub fn load_profiles(&self) -> Result<Vec<ProfileWire>> {
        let catalog: Catalog<ProfileWire> = load_json(&self.path(paths::PROFILES_FILE))?;
        Ok(catalog.items)
    }

    pub fn save_profiles(&self, profiles: &[ProfileWire]) -> Result<()> {
        let catalog = Catalog { version: 1, items: profiles.to_vec() };
        self.autosave(paths::PROFILES_FILE, &catalog)?;
        atomic_write_json(&self.path(paths::PROFILES_FILE), &catalog)
    }

    pub fn load_fan_profiles(&self) -> Result<Vec<ucc_protocol::FanProfileWire>> {
        let catalog: Catalog<ucc_protocol::FanProfileWire> = load_json(&self.path(paths::FAN_PROFILES_FILE))?;
        Ok(catalog.items)
    }

    pub fn save_fan_profiles(&self, profiles: &[ucc_protocol::FanProfileWire]) -> Result<()> {
        let catalog = Catalog { version: 1, items: profiles.to_vec() };
        self.autosave(paths::FAN_PROFILES_FILE, &catalog)?;
        atomic_write_json(&self.path(paths::FAN_PROFILES_FILE), &catalog)
    }

    pub fn load_keyboard_profiles(&self) -> Result<Vec<KeyboardProfileWire>> {
        let catalog: Catalog<KeyboardProfileWire> = load_json(&self.path(paths::KEYBOARD_PROFILES_FILE))?;
        Ok(catalog.items)
    }

    pub fn save_keyboard_profiles(&self, profiles: &[KeyboardProfileWire]) -> Result<()> {
        let catalog = Catalog { version: 1, items: profiles.to_vec() };
        self.autosave(paths::KEYBOARD_PROFILES_FILE, &catalog)?;
        atomic_write_json(&self.path(paths::KEYBOARD_PROFILES_FILE), &catalog)
    }

    pub fn load_state_map(&self) -> Result<std::collections::HashMap<PowerState, String>> {
        let path = self.path(paths::STATE_MAP_FILE);
        if !path.exists() {
            return Ok(std::collections::HashMap::new());
        }
        let contents = fs::read_to_string(&path).map_err(|e| UccError::hw_read(&path, e.to_string()))?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save_state_map(&self, map: &std::collections::HashMap<PowerState, String>) -> Result<()> {
        self.autosave(paths::STATE_MAP_FILE, map)?;
        atomic_write_json(&self.path(paths::STATE_MAP_FILE), map)
    }

    /// Drops a rotating last-known-good copy under `autosave/` before the
    /// real write, so a crash mid-write still leaves a recoverable
    /// snapshot from before this change.
    fn autosave<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let src = self.path(file);
        if !src.exists() {
            return Ok(());
        }
        let autosave_dir = self.config_dir.join(paths::AUTOSAVE_DIR);
        if let Err(e) = fs::create_dir_all(&autosave_dir) {
            warn!(error = %e, "failed to create autosave directory");
            return Ok(());
        }
        let dest = autosave_dir.join(file);
        if let Err(e) = fs::copy(&src, &dest) {
            warn!(error = %e, file, "failed to write autosave copy");
        }
        let _ = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucc_protocol::{
        ChargingPriority, ChargingProfileName, ChargingSettings, CpuSettings, FanBinding, WebcamSetting,
        FnLockSetting,
    };

    fn sample_profile(id: &str) -> ProfileWire {
        ProfileWire {
            id: id.to_string(),
            name: "Custom".into(),
            builtin: false,
            cpu: CpuSettings {
                governor: "schedutil".into(),
                energy_performance_preference: "balance_performance".into(),
                scaling_min_freq_khz: 800_000,
                scaling_max_freq_khz: 3_500_000,
                online_core_count: 8,
                boost_enabled: true,
            },
            display_brightness_percent: Some(80),
            webcam: WebcamSetting::Unchanged,
            fn_lock: FnLockSetting::Unchanged,
            charging: ChargingSettings {
                profile: ChargingProfileName::Balanced,
                priority: ChargingPriority::Battery,
                threshold_start_percent: 50,
                threshold_stop_percent: 80,
            },
            odm_mode: "balanced".into(),
            fan_binding: FanBinding { fan_profile_id: String::new(), auto_control_water_cooler: true },
            keyboard_profile: None,
            unknown_fields: Default::default(),
        }
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path());
        assert!(store.load_profiles().unwrap().is_empty());
    }

    #[test]
    fn round_trips_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path());
        let profiles = vec![sample_profile("abc123")];
        store.save_profiles(&profiles).unwrap();
        let loaded = store.load_profiles().unwrap();
        assert_eq!(loaded, profiles);
    }

    #[test]
    fn unknown_fields_survive_a_load_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(paths::PROFILES_FILE);
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(
            &path,
            serde_json::json!({
                "version": 1,
                "items": [{
                    "id": "abc123",
                    "name": "Custom",
                    "builtin": false,
                    "cpu": {
                        "governor": "schedutil",
                        "energy_performance_preference": "balance_performance",
                        "scaling_min_freq_khz": 800_000,
                        "scaling_max_freq_khz": 3_500_000,
                        "online_core_count": 8,
                        "boost_enabled": true
                    },
                    "display_brightness_percent": 80,
                    "webcam": "unchanged",
                    "fn_lock": "unchanged",
                    "charging": {
                        "profile": "balanced",
                        "priority": "battery",
                        "threshold_start_percent": 50,
                        "threshold_stop_percent": 80
                    },
                    "odm_mode": "balanced",
                    "fan_binding": {"fan_profile_id": "", "auto_control_water_cooler": true},
                    "keyboard_profile": null,
                    "from_a_newer_daemon_build": {"nested": ["data", 1, 2]}
                }]
            })
            .to_string(),
        )
        .unwrap();

        let store = PersistenceStore::new(dir.path());
        let loaded = store.load_profiles().unwrap();
        assert_eq!(
            loaded[0].unknown_fields.get("from_a_newer_daemon_build"),
            Some(&serde_json::json!({"nested": ["data", 1, 2]}))
        );

        store.save_profiles(&loaded).unwrap();
        let reloaded = store.load_profiles().unwrap();
        assert_eq!(
            reloaded[0].unknown_fields.get("from_a_newer_daemon_build"),
            Some(&serde_json::json!({"nested": ["data", 1, 2]}))
        );
    }

    #[test]
    fn second_save_leaves_autosave_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path());
        store.save_profiles(&[sample_profile("a")]).unwrap();
        store.save_profiles(&[sample_profile("a"), sample_profile("b")]).unwrap();
        let autosave = dir.path().join(paths::AUTOSAVE_DIR).join(paths::PROFILES_FILE);
        assert!(autosave.exists());
    }
}
