use crate::deadzone::normalize;
use crate::mapping::AnalogMapping;
use crate::state::StickVector;

/// Accumulated mouse travel (after gain) that corresponds to full deflection.
pub const MOUSE_RANGE: f32 = 100.0;

/// Turns relative mouse motion into a stick position.
///
/// Deltas are integrated into a virtual cursor, so the stick stays where the
/// mouse left it until moved back or reset.
#[derive(Debug, Clone, Default)]
pub struct MouseListener {
    acc_x: f32,
    acc_y: f32,
}

impl MouseListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_motion(&mut self, dx: i32, dy: i32, mapping: &AnalogMapping) -> StickVector {
        let gain = mapping.sensitivity_multiplier();
        self.acc_x += dx as f32 * gain;
        self.acc_y += dy as f32 * gain;

        let x = (self.acc_x / MOUSE_RANGE).clamp(-1.0, 1.0);
        let y = (self.acc_y / MOUSE_RANGE).clamp(-1.0, 1.0);

        let (x, y) = normalize(x, y, mapping.deadzone_fraction());
        // Per-axis clamping lets corners reach sqrt(2).
        let StickVector { mut x, mut y } = StickVector::new(x, y).clamp_to_unit();

        if mapping.invert_x {
            x = -x;
        }
        if mapping.invert_y {
            y = -y;
        }

        StickVector::new(x, y)
    }

    pub fn reset(&mut self) {
        self.acc_x = 0.0;
        self.acc_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::default_analog_mappings;

    const EPS: f32 = 1e-5;

    fn mouse(sensitivity: u8, deadzone: u8) -> AnalogMapping {
        AnalogMapping {
            sensitivity,
            deadzone,
            ..default_analog_mappings()[0]
        }
    }

    #[test]
    fn unity_gain_without_deadzone() {
        let mut l = MouseListener::new();
        let v = l.on_motion(30, -40, &mouse(50, 0));
        assert!((v.x - 0.3).abs() < EPS);
        assert!((v.y + 0.4).abs() < EPS);
    }

    #[test]
    fn accumulates_across_events() {
        let mut l = MouseListener::new();
        let m = mouse(50, 0);
        l.on_motion(20, 0, &m);
        let v = l.on_motion(20, 0, &m);
        assert!((v.x - 0.4).abs() < EPS);
        let v = l.on_motion(-40, 0, &m);
        assert_eq!(v, StickVector::CENTER);
    }

    #[test]
    fn sensitivity_scales_deltas() {
        let mut l = MouseListener::new();
        let v = l.on_motion(10, 0, &mouse(100, 0));
        assert!((v.x - 0.2).abs() < EPS);
        let v = l.on_motion(40, 0, &mouse(25, 0));
        assert!((v.x - 0.4).abs() < EPS);
    }

    #[test]
    fn small_motion_stays_in_deadzone() {
        let mut l = MouseListener::new();
        assert_eq!(l.on_motion(5, 0, &mouse(50, 10)), StickVector::CENTER);
    }

    #[test]
    fn deadzone_rescales_past_threshold() {
        let mut l = MouseListener::new();
        let v = l.on_motion(55, 0, &mouse(50, 10));
        assert!((v.x - 0.5).abs() < EPS);
    }

    #[test]
    fn axes_clamp_and_stay_in_unit_disc() {
        let mut l = MouseListener::new();
        let v = l.on_motion(1000, 1000, &mouse(50, 10));
        assert!(v.magnitude() <= 1.0 + EPS);
        assert!((v.x - v.y).abs() < EPS);

        let v = l.on_motion(0, -5000, &mouse(50, 0));
        assert!(v.magnitude() <= 1.0 + EPS);
    }

    #[test]
    fn inversion_applies_after_normalization() {
        let mut l = MouseListener::new();
        let m = AnalogMapping {
            invert_x: true,
            invert_y: true,
            ..mouse(50, 0)
        };
        let v = l.on_motion(30, 40, &m);
        assert!((v.x + 0.3).abs() < EPS);
        assert!((v.y + 0.4).abs() < EPS);
    }

    #[test]
    fn reset_clears_accumulator() {
        let mut l = MouseListener::new();
        let m = mouse(50, 0);
        l.on_motion(80, 80, &m);
        l.reset();
        let v = l.on_motion(10, 0, &m);
        assert!((v.x - 0.1).abs() < EPS);
    }
}
