use crate::button::ButtonStates;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StickVector {
    pub x: f32,
    pub y: f32,
}

impl StickVector {
    pub const CENTER: StickVector = StickVector { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Scales the vector back onto the unit circle when it lies outside it.
    pub fn clamp_to_unit(self) -> Self {
        let magnitude = self.magnitude();
        if magnitude > 1.0 {
            Self::new(self.x / magnitude, self.y / magnitude)
        } else {
            self
        }
    }
}

/// Everything the virtual pad publishes. Owned by [`crate::controller::Controller`];
/// only its listeners and the toggle write it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    pub active: bool,
    pub left_stick: StickVector,
    pub right_stick: StickVector,
    pub buttons: ButtonStates,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} L({:+.2},{:+.2}) R({:+.2},{:+.2}) [",
            if self.active { "ACTIVE  " } else { "inactive" },
            self.left_stick.x,
            self.left_stick.y,
            self.right_stick.x,
            self.right_stick.y,
        )?;
        for (i, b) in self.buttons.pressed().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::Button;

    #[test]
    fn default_state_is_centered_and_released() {
        let state = ControllerState::default();
        assert!(!state.active);
        assert_eq!(state.left_stick, StickVector::CENTER);
        assert_eq!(state.right_stick, StickVector::CENTER);
        assert_eq!(state.buttons.pressed().count(), 0);
    }

    #[test]
    fn clamp_to_unit_only_shrinks() {
        let inside = StickVector::new(0.3, -0.4);
        assert_eq!(inside.clamp_to_unit(), inside);

        let corner = StickVector::new(1.0, 1.0).clamp_to_unit();
        assert!((corner.magnitude() - 1.0).abs() < 1e-5);
        assert!((corner.x - corner.y).abs() < 1e-6);
    }

    #[test]
    fn display_lists_pressed_buttons() {
        let mut state = ControllerState::default();
        state.active = true;
        state.right_stick = StickVector::new(0.5, -0.25);
        state.buttons.set(Button::A, true);
        state.buttons.set(Button::LB, true);
        assert_eq!(
            state.to_string(),
            "ACTIVE   L(+0.00,+0.00) R(+0.50,-0.25) [A LB]"
        );
    }
}
