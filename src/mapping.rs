use crate::button::Button;
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

pub const DEFAULT_MOUSE_SENSITIVITY: u8 = 50;
pub const DEFAULT_DEADZONE: u8 = 10;

/// Stable identifier assigned when a mapping is created. Never reused within a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingId(pub u32);

impl fmt::Display for MappingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for MappingId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse().map(MappingId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonMapping {
    /// Zero means "not yet assigned"; the store replaces it on load.
    #[serde(default)]
    pub id: MappingId,
    pub key: String,
    pub button: Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalogInput {
    Mouse,
    Keys,
}

impl fmt::Display for AnalogInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalogInput::Mouse => f.pad("mouse"),
            AnalogInput::Keys => f.pad("keys"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickSide {
    Left,
    Right,
}

impl fmt::Display for StickSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StickSide::Left => f.pad("left"),
            StickSide::Right => f.pad("right"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalogMapping {
    pub input: AnalogInput,
    pub axis: StickSide,
    /// 1-100, 50 is unity gain.
    pub sensitivity: u8,
    /// 0-50, percent of full deflection.
    pub deadzone: u8,
    pub invert_x: bool,
    pub invert_y: bool,
}

impl AnalogMapping {
    /// Gain applied to raw mouse deltas.
    pub fn sensitivity_multiplier(&self) -> f32 {
        f32::from(self.sensitivity) / 50.0
    }

    pub fn deadzone_fraction(&self) -> f32 {
        f32::from(self.deadzone) / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub mouse_sensitivity: u8,
    pub deadzone: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mouse_sensitivity: DEFAULT_MOUSE_SENSITIVITY,
            deadzone: DEFAULT_DEADZONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Keys that push the left stick, one per direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickKeys {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
}

impl Default for StickKeys {
    fn default() -> Self {
        Self {
            up: "KeyW".into(),
            down: "KeyS".into(),
            left: "KeyA".into(),
            right: "KeyD".into(),
        }
    }
}

impl StickKeys {
    pub fn direction_of(&self, code: &str) -> Option<StickDirection> {
        [
            (&self.up, StickDirection::Up),
            (&self.down, StickDirection::Down),
            (&self.left, StickDirection::Left),
            (&self.right, StickDirection::Right),
        ]
        .into_iter()
        .find(|(key, _)| key.as_str() == code)
        .map(|(_, direction)| direction)
    }
}

pub fn default_button_mappings() -> Vec<ButtonMapping> {
    [
        ("Space", Button::A),
        ("ShiftLeft", Button::B),
        ("KeyE", Button::X),
        ("KeyQ", Button::Y),
        ("KeyR", Button::RB),
        ("KeyF", Button::LB),
    ]
    .into_iter()
    .zip(1..)
    .map(|((key, button), id)| ButtonMapping {
        id: MappingId(id),
        key: key.to_string(),
        button,
    })
    .collect()
}

/// The mouse drives the right stick, the [`StickKeys`] drive the left one.
pub fn default_analog_mappings() -> Vec<AnalogMapping> {
    vec![
        AnalogMapping {
            input: AnalogInput::Mouse,
            axis: StickSide::Right,
            sensitivity: DEFAULT_MOUSE_SENSITIVITY,
            deadzone: DEFAULT_DEADZONE,
            invert_x: false,
            invert_y: false,
        },
        AnalogMapping {
            input: AnalogInput::Keys,
            axis: StickSide::Left,
            sensitivity: 100,
            deadzone: 5,
            invert_x: false,
            invert_y: false,
        },
    ]
}

/// In-memory configuration. Performs no uniqueness validation; front ends use
/// [`MappingStore::is_button_mapped`] to keep buttons unique.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingStore {
    buttons: Vec<ButtonMapping>,
    analog: Vec<AnalogMapping>,
    settings: Settings,
    stick_keys: StickKeys,
    next_id: u32,
}

impl Default for MappingStore {
    fn default() -> Self {
        Self::from_parts(
            default_button_mappings(),
            default_analog_mappings(),
            Settings::default(),
        )
    }
}

impl MappingStore {
    /// Builds a store from loaded parts. Missing or duplicate ids are replaced
    /// with fresh ones so every mapping ends up uniquely addressable, and
    /// [`Settings`] is re-synced from the mouse mapping.
    pub fn from_parts(
        buttons: Vec<ButtonMapping>,
        analog: Vec<AnalogMapping>,
        settings: Settings,
    ) -> Self {
        let mut store = Self {
            buttons,
            analog,
            settings,
            stick_keys: StickKeys::default(),
            next_id: 1,
        };
        store.repair_ids();
        // The mouse mapping is what the listener reads, so it wins over a stale copy.
        if let Some(mouse) = store.mouse_mapping().copied() {
            store.settings.mouse_sensitivity = mouse.sensitivity;
            store.settings.deadzone = mouse.deadzone;
        }
        store
    }

    pub fn with_stick_keys(mut self, stick_keys: StickKeys) -> Self {
        self.stick_keys = stick_keys;
        self
    }

    /// Gives every mapping a unique non-zero id. When the id space above the
    /// largest id cannot hold the repairs, everything is renumbered from 1.
    fn repair_ids(&mut self) {
        let max = self.buttons.iter().map(|m| m.id.0).max().unwrap_or(0);
        let mut seen = Vec::with_capacity(self.buttons.len());
        let mut repairs = 0u32;
        for mapping in &self.buttons {
            if mapping.id.0 == 0 || seen.contains(&mapping.id) {
                repairs += 1;
            } else {
                seen.push(mapping.id);
            }
        }

        let Some(mut next_id) = max.checked_add(1).filter(|n| n.checked_add(repairs).is_some())
        else {
            log::warn!("Mapping ids exhausted, renumbering from 1");
            self.renumber();
            return;
        };

        let mut seen = Vec::with_capacity(self.buttons.len());
        for mapping in &mut self.buttons {
            if mapping.id.0 == 0 || seen.contains(&mapping.id) {
                mapping.id = MappingId(next_id);
                next_id += 1;
            }
            seen.push(mapping.id);
        }
        self.next_id = next_id;
    }

    fn renumber(&mut self) {
        for (mapping, id) in self.buttons.iter_mut().zip(1..) {
            mapping.id = MappingId(id);
        }
        self.next_id = self.buttons.len() as u32 + 1;
    }

    pub fn list(&self) -> &[ButtonMapping] {
        &self.buttons
    }

    pub fn get(&self, id: MappingId) -> Option<&ButtonMapping> {
        self.buttons.iter().find(|m| m.id == id)
    }

    /// Appends a mapping and returns its new id.
    pub fn add(&mut self, key: impl Into<String>, button: Button) -> MappingId {
        if self.next_id == u32::MAX {
            log::warn!("Mapping ids exhausted, renumbering from 1");
            self.renumber();
        }
        let id = MappingId(self.next_id);
        self.next_id += 1;
        self.buttons.push(ButtonMapping {
            id,
            key: key.into(),
            button,
        });
        id
    }

    pub fn update(
        &mut self,
        id: MappingId,
        key: impl Into<String>,
        button: Button,
    ) -> Result<(), StoreError> {
        let mapping = self
            .buttons
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::UnknownMapping(id))?;
        mapping.key = key.into();
        mapping.button = button;
        Ok(())
    }

    /// Removes a mapping; later entries move up one place, ids stay put.
    pub fn remove(&mut self, id: MappingId) -> Result<ButtonMapping, StoreError> {
        let pos = self
            .buttons
            .iter()
            .position(|m| m.id == id)
            .ok_or(StoreError::UnknownMapping(id))?;
        Ok(self.buttons.remove(pos))
    }

    /// First mapping bound to `key`.
    pub fn find_by_key(&self, key: &str) -> Option<&ButtonMapping> {
        self.buttons.iter().find(|m| m.key == key)
    }

    /// Whether `button` is already used, ignoring the mapping `except` (the one being edited).
    pub fn is_button_mapped(&self, button: Button, except: Option<MappingId>) -> bool {
        self.buttons
            .iter()
            .any(|m| m.button == button && Some(m.id) != except)
    }

    /// Buttons still free for a new mapping, or for re-targeting `except`.
    pub fn available_buttons(&self, except: Option<MappingId>) -> Vec<Button> {
        Button::ALL
            .into_iter()
            .filter(|b| !self.is_button_mapped(*b, except))
            .collect()
    }

    pub fn analog_mappings(&self) -> &[AnalogMapping] {
        &self.analog
    }

    pub fn analog(&self, input: AnalogInput, axis: StickSide) -> Option<&AnalogMapping> {
        self.analog
            .iter()
            .find(|m| m.input == input && m.axis == axis)
    }

    /// The mapping the mouse listener reads.
    pub fn mouse_mapping(&self) -> Option<&AnalogMapping> {
        self.analog(AnalogInput::Mouse, StickSide::Right)
    }

    /// Replaces the analog mapping with the same input and axis. Editing the
    /// mouse/right entry also updates [`Settings`].
    pub fn update_analog(&mut self, mapping: AnalogMapping) -> Result<(), StoreError> {
        let slot = self
            .analog
            .iter_mut()
            .find(|m| m.input == mapping.input && m.axis == mapping.axis)
            .ok_or(StoreError::UnknownAnalog {
                input: mapping.input,
                axis: mapping.axis,
            })?;
        *slot = mapping;

        if mapping.input == AnalogInput::Mouse && mapping.axis == StickSide::Right {
            self.settings.mouse_sensitivity = mapping.sensitivity;
            self.settings.deadzone = mapping.deadzone;
        }
        Ok(())
    }

    pub fn stick_keys(&self) -> &StickKeys {
        &self.stick_keys
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn set_mouse_sensitivity(&mut self, sensitivity: u8) {
        self.settings.mouse_sensitivity = sensitivity;
        if let Some(m) = self.mouse_mapping_mut() {
            m.sensitivity = sensitivity;
        }
    }

    pub fn set_deadzone(&mut self, deadzone: u8) {
        self.settings.deadzone = deadzone;
        if let Some(m) = self.mouse_mapping_mut() {
            m.deadzone = deadzone;
        }
    }

    pub fn set_inversion(&mut self, invert_x: bool, invert_y: bool) {
        if let Some(m) = self.mouse_mapping_mut() {
            m.invert_x = invert_x;
            m.invert_y = invert_y;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn mouse_mapping_mut(&mut self) -> Option<&mut AnalogMapping> {
        self.analog
            .iter_mut()
            .find(|m| m.input == AnalogInput::Mouse && m.axis == StickSide::Right)
    }
}
