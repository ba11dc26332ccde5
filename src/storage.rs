use crate::error::StoreError;
use crate::mapping::{
    default_analog_mappings, default_button_mappings, AnalogMapping, ButtonMapping, MappingStore,
    Settings, StickKeys,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "controllerConfig.json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredConfig<'a> {
    button_mappings: &'a [ButtonMapping],
    analog_mappings: &'a [AnalogMapping],
    settings: Settings,
    stick_keys: &'a StickKeys,
}

/// JSON copy of the [`MappingStore`]. Each top-level field decodes on its own.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_CONFIG_HOME/km2joy/controllerConfig.json`, or the working directory
    /// when no config directory is known.
    pub fn default_location() -> Self {
        let dir = dirs::config_dir()
            .map(|d| d.join("km2joy"))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the store, falling back to defaults for anything missing or unreadable.
    /// Never fails; problems are logged.
    pub fn load(&self) -> MappingStore {
        match self.try_load() {
            Ok(Some(store)) => store,
            Ok(None) => {
                log::debug!("No saved configuration at {}, using defaults", self.path.display());
                MappingStore::default()
            }
            Err(e) => {
                log::error!("Error loading saved configuration: {}", e);
                MappingStore::default()
            }
        }
    }

    /// `Ok(None)` when the file does not exist.
    pub fn try_load(&self) -> Result<Option<MappingStore>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut root: Map<String, Value> = serde_json::from_str(&text)?;
        let buttons = take_field(&mut root, "buttonMappings", default_button_mappings);
        let analog = take_field(&mut root, "analogMappings", default_analog_mappings);
        let settings = take_field(&mut root, "settings", Settings::default);
        let stick_keys = take_field(&mut root, "stickKeys", StickKeys::default);

        log::info!(
            "Loaded {} button mappings from {}",
            buttons.len(),
            self.path.display()
        );
        Ok(Some(
            MappingStore::from_parts(buttons, analog, settings).with_stick_keys(stick_keys),
        ))
    }

    pub fn save(&self, store: &MappingStore) -> Result<(), StoreError> {
        let stored = StoredConfig {
            button_mappings: store.list(),
            analog_mappings: store.analog_mappings(),
            settings: store.settings(),
            stick_keys: store.stick_keys(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }

    /// Best-effort save: failures are logged and otherwise ignored.
    pub fn persist(&self, store: &MappingStore) {
        if let Err(e) = self.save(store) {
            log::error!("Error saving configuration: {}", e);
        }
    }
}

fn take_field<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    name: &str,
    default: impl FnOnce() -> T,
) -> T {
    match root.remove(name) {
        None | Some(Value::Null) => default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("Ignoring saved {}: {}", name, e);
            default()
        }),
    }
}
