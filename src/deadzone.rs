/// Radial deadzone with rescale.
///
/// Magnitudes below `deadzone` collapse to zero; the rest of the range is
/// stretched so that `deadzone..1` maps onto `0..1` without changing
/// direction. Inputs are not clamped, callers pre-clamp to the unit square.
pub fn normalize(x: f32, y: f32, deadzone: f32) -> (f32, f32) {
    let magnitude = (x * x + y * y).sqrt();

    if magnitude < deadzone || magnitude == 0.0 || deadzone >= 1.0 {
        return (0.0, 0.0);
    }

    let scale = (magnitude - deadzone) / (1.0 - deadzone) / magnitude;
    (x * scale, y * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn inside_deadzone_is_centered() {
        assert_eq!(normalize(0.05, 0.0, 0.1), (0.0, 0.0));
        assert_eq!(normalize(0.03, -0.04, 0.1), (0.0, 0.0));
    }

    #[test]
    fn zero_input_with_zero_deadzone() {
        let (x, y) = normalize(0.0, 0.0, 0.0);
        assert!(x == 0.0 && y == 0.0);
        assert!(!x.is_nan() && !y.is_nan());
    }

    #[test]
    fn zero_deadzone_is_identity() {
        let (x, y) = normalize(0.6, 0.8, 0.0);
        assert!(close(x, 0.6) && close(y, 0.8));

        let once = normalize(0.3, -0.2, 0.0);
        let twice = normalize(once.0, once.1, 0.0);
        assert!(close(once.0, twice.0) && close(once.1, twice.1));
    }

    #[test]
    fn rescales_magnitude_and_keeps_direction() {
        let deadzone = 0.2;
        for &(x, y) in &[(0.5f32, 0.0f32), (0.3, 0.4), (-0.7, 0.1), (0.0, -1.0), (0.25, -0.25)] {
            let m = (x * x + y * y).sqrt();
            let (nx, ny) = normalize(x, y, deadzone);
            let nm = (nx * nx + ny * ny).sqrt();
            assert!(close(nm, (m - deadzone) / (1.0 - deadzone)), "({x}, {y})");
            // Same direction: cross product zero, dot product positive.
            assert!(close(x * ny - y * nx, 0.0));
            assert!(x * nx + y * ny > 0.0);
        }
    }

    #[test]
    fn edge_of_deadzone_is_zero_magnitude() {
        let (x, y) = normalize(0.1, 0.0, 0.1);
        assert!(close(x, 0.0) && close(y, 0.0));
    }

    #[test]
    fn full_deadzone_collapses_everything() {
        assert_eq!(normalize(1.0, 0.0, 1.0), (0.0, 0.0));
        assert_eq!(normalize(0.9, 0.9, 1.5), (0.0, 0.0));
    }
}
