use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Logical controller buttons, serialized by their short names ("A", "LB", "DPadUp", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Button {
    A,
    B,
    X,
    Y,
    LB,
    RB,
    LT,
    RT,
    Back,
    Start,
    LS,
    RS,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

pub const BUTTON_COUNT: usize = 16;

impl Button {
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::LB,
        Button::RB,
        Button::LT,
        Button::RT,
        Button::Back,
        Button::Start,
        Button::LS,
        Button::RS,
        Button::DPadUp,
        Button::DPadDown,
        Button::DPadLeft,
        Button::DPadRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::LB => "LB",
            Button::RB => "RB",
            Button::LT => "LT",
            Button::RT => "RT",
            Button::Back => "Back",
            Button::Start => "Start",
            Button::LS => "LS",
            Button::RS => "RS",
            Button::DPadUp => "DPadUp",
            Button::DPadDown => "DPadDown",
            Button::DPadLeft => "DPadLeft",
            Button::DPadRight => "DPadRight",
        }
    }

    /// Position in [`Button::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown button '{0}' (expected one of A, B, X, Y, LB, RB, LT, RT, Back, Start, LS, RS, DPadUp, DPadDown, DPadLeft, DPadRight)")]
pub struct ParseButtonError(pub String);

impl FromStr for Button {
    type Err = ParseButtonError;

    /// Case-insensitive, so `lb` and `dpadup` work on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Button::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseButtonError(s.to_string()))
    }
}

/// Fixed table of pressed flags, one per [`Button`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonStates([bool; BUTTON_COUNT]);

impl ButtonStates {
    pub fn get(&self, button: Button) -> bool {
        self.0[button.index()]
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        self.0[button.index()] = pressed;
    }

    pub fn release_all(&mut self) {
        self.0 = [false; BUTTON_COUNT];
    }

    pub fn iter(&self) -> impl Iterator<Item = (Button, bool)> + '_ {
        Button::ALL.into_iter().map(move |b| (b, self.get(b)))
    }

    pub fn pressed(&self) -> impl Iterator<Item = Button> + '_ {
        self.iter().filter_map(|(b, on)| on.then_some(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_ordered_by_index() {
        for (i, b) in Button::ALL.into_iter().enumerate() {
            assert_eq!(b.index(), i);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("dpadup".parse::<Button>(), Ok(Button::DPadUp));
        assert_eq!("Start".parse::<Button>(), Ok(Button::Start));
        assert!("Turbo".parse::<Button>().is_err());
    }

    #[test]
    fn serializes_by_short_name() {
        assert_eq!(serde_json::to_string(&Button::LB).unwrap(), "\"LB\"");
        let b: Button = serde_json::from_str("\"DPadLeft\"").unwrap();
        assert_eq!(b, Button::DPadLeft);
    }

    #[test]
    fn states_cover_every_button() {
        let mut states = ButtonStates::default();
        assert_eq!(states.iter().count(), BUTTON_COUNT);
        states.set(Button::RT, true);
        states.set(Button::A, true);
        assert_eq!(states.pressed().collect::<Vec<_>>(), vec![Button::A, Button::RT]);
        states.release_all();
        assert_eq!(states.pressed().count(), 0);
    }
}
