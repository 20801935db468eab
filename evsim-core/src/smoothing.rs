//! Rate limiter shared by every displayed quantity
//!
//! Speed, power, RPM, voltage and temperatures all move toward their targets
//! through [`smooth_transition`], which bounds the change per tick to
//! `rate * dt`. This is what keeps telemetry free of discontinuous jumps.

/// Move `current` toward `target` by at most `rate * dt`.
///
/// A non-positive `rate` or `dt` leaves the value unchanged.
pub fn smooth_transition(current: f64, target: f64, rate: f64, dt: f64) -> f64 {
    let max_step = (rate * dt).max(0.0);
    current + (target - current).clamp(-max_step, max_step)
}

/// Returns true when `next` stays within `rate * dt` of `previous`, with a
/// small tolerance for float error.
pub fn within_rate(previous: f64, next: f64, rate: f64, dt: f64) -> bool {
    (next - previous).abs() <= rate * dt + 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_is_bounded() {
        assert_eq!(smooth_transition(0.0, 100.0, 5.0, 0.1), 0.5);
        assert_eq!(smooth_transition(100.0, 0.0, 5.0, 0.1), 99.5);
    }

    #[test]
    fn test_reaches_target_without_overshoot() {
        assert_eq!(smooth_transition(9.9, 10.0, 5.0, 0.1), 10.0);
        assert_eq!(smooth_transition(10.1, 10.0, 5.0, 0.1), 10.0);
    }

    #[test]
    fn test_zero_dt_is_identity() {
        assert_eq!(smooth_transition(42.0, 0.0, 5.0, 0.0), 42.0);
    }

    #[test]
    fn test_within_rate() {
        assert!(within_rate(0.0, 0.5, 5.0, 0.1));
        assert!(!within_rate(0.0, 0.6, 5.0, 0.1));
    }
}
