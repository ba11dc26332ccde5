use crate::button::Button;
use crate::mapping::{MappingStore, StickDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Down,
    Up,
    /// Auto-repeat while held.
    Repeat,
}

impl KeyTransition {
    /// evdev key values: 0 release, 1 press, 2 autorepeat.
    pub fn from_evdev(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyTransition::Up),
            1 => Some(KeyTransition::Down),
            2 => Some(KeyTransition::Repeat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: String,
    pub transition: KeyTransition,
}

impl KeyEvent {
    pub fn new(code: impl Into<String>, transition: KeyTransition) -> Self {
        Self {
            code: code.into(),
            transition,
        }
    }
}

/// What a key event asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Toggle,
    Press(Button),
    Release(Button),
    /// A left-stick direction key went down (`held`) or up.
    Steer {
        direction: StickDirection,
        held: bool,
    },
    Ignore,
}

/// Decides what each key transition means. Holds no button state itself;
/// the controller applies the returned [`KeyAction`].
#[derive(Debug, Clone)]
pub struct KeyboardListener {
    toggle_key: String,
}

impl KeyboardListener {
    pub fn new(toggle_key: impl Into<String>) -> Self {
        Self {
            toggle_key: toggle_key.into(),
        }
    }

    pub fn classify(&self, event: &KeyEvent, active: bool, store: &MappingStore) -> KeyAction {
        if event.code == self.toggle_key {
            // Holding the toggle key must not flip the state on every repeat.
            return match event.transition {
                KeyTransition::Down => KeyAction::Toggle,
                KeyTransition::Up | KeyTransition::Repeat => KeyAction::Ignore,
            };
        }

        if !active {
            return KeyAction::Ignore;
        }

        let held = event.transition != KeyTransition::Up;
        if let Some(mapping) = store.find_by_key(&event.code) {
            return if held {
                KeyAction::Press(mapping.button)
            } else {
                KeyAction::Release(mapping.button)
            };
        }

        match store.stick_keys().direction_of(&event.code) {
            Some(direction) => KeyAction::Steer { direction, held },
            None => KeyAction::Ignore,
        }
    }
}
