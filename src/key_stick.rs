use crate::deadzone::normalize;
use crate::mapping::{AnalogMapping, StickDirection};
use crate::state::StickVector;

/// Turns held direction keys into a stick position.
///
/// Opposing keys cancel out. Diagonals keep the same reach as a single
/// direction, so the result stays on the unit disc.
#[derive(Debug, Clone, Default)]
pub struct KeyStickListener {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl KeyStickListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_key(
        &mut self,
        direction: StickDirection,
        held: bool,
        mapping: &AnalogMapping,
    ) -> StickVector {
        match direction {
            StickDirection::Up => self.up = held,
            StickDirection::Down => self.down = held,
            StickDirection::Left => self.left = held,
            StickDirection::Right => self.right = held,
        }

        let x = axis(self.left, self.right);
        let y = axis(self.up, self.down);
        if x == 0.0 && y == 0.0 {
            return StickVector::CENTER;
        }

        // Sensitivity is the share of full deflection a held key reaches.
        let reach = f32::from(mapping.sensitivity.min(100)) / 100.0;
        let length = (x * x + y * y).sqrt();
        let (mut x, mut y) = normalize(
            x / length * reach,
            y / length * reach,
            mapping.deadzone_fraction(),
        );

        if mapping.invert_x {
            x = -x;
        }
        if mapping.invert_y {
            y = -y;
        }

        StickVector::new(x, y)
    }

    /// Forgets every held key.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}
