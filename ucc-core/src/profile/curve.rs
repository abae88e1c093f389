//! Fan curve evaluator (C8): piecewise-linear temperature -> duty, with
//! hysteresis against oscillation near curve knees.
//!
//! The interpolation shape mirrors the teacher's curve engine; the
//! hysteresis rule is simpler by design — write only when the output
//! actually needs to move or enough time has passed, rather than tracking
//! a rising/falling temperature band. State (`last_duty`, `last_write`)
//! is owned by the evaluator instance, and the evaluator instance is
//! owned by the worker — not the profile — so switching the active
//! profile does not reset the smoother discontinuously.

use std::time::{Duration, Instant};

use ucc_error::{Result, UccError};
use ucc_protocol::CurvePointWire;

use crate::constants::curve::{HYSTERESIS_DUTY_DELTA, HYSTERESIS_MAX_AGE, MAX_PUMP_LEVEL};

/// Validates the invariants from the data model: strictly ascending
/// temps, non-decreasing duty, temps in range, duty in range, at least
/// one point.
pub fn validate_curve(points: &[CurvePointWire]) -> Result<()> {
    if points.is_empty() {
        return Err(UccError::InvalidCurve("curve must have at least one point".into()));
    }
    let mut prev: Option<&CurvePointWire> = None;
    for point in points {
        if !(20.0..=100.0).contains(&point.temp_c) {
            return Err(UccError::InvalidCurve(format!(
                "temperature {} out of range [20, 100]",
                point.temp_c
            )));
        }
        if !(0.0..=100.0).contains(&point.duty_pct) {
            return Err(UccError::InvalidCurve(format!(
                "duty {} out of range [0, 100]",
                point.duty_pct
            )));
        }
        if let Some(prev) = prev {
            if point.temp_c <= prev.temp_c {
                return Err(UccError::InvalidCurve(
                    "curve temperatures must be strictly ascending".into(),
                ));
            }
            if point.duty_pct < prev.duty_pct {
                return Err(UccError::InvalidCurve("curve duty must be non-decreasing".into()));
            }
        }
        prev = Some(point);
    }
    Ok(())
}

/// Piecewise-linear interpolation, clamped outside the curve's domain.
pub fn interpolate(points: &[CurvePointWire], temp: f32) -> f32 {
    if points.is_empty() {
        return 100.0;
    }
    if points.len() == 1 {
        return points[0].duty_pct;
    }
    if temp <= points[0].temp_c {
        return points[0].duty_pct;
    }
    let last = points.len() - 1;
    if temp >= points[last].temp_c {
        return points[last].duty_pct;
    }
    for window in points.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        if temp >= a.temp_c && temp <= b.temp_c {
            let span = b.temp_c - a.temp_c;
            let frac = if span.abs() < f32::EPSILON { 0.0 } else { (temp - a.temp_c) / span };
            return a.duty_pct + (b.duty_pct - a.duty_pct) * frac;
        }
    }
    points[last].duty_pct
}

/// Stateful per-channel evaluator. One instance lives for the life of a
/// worker's channel, independent of which profile is currently active.
#[derive(Debug, Clone)]
pub struct FanCurveEvaluator {
    last_duty: Option<f32>,
    last_write: Option<Instant>,
}

impl FanCurveEvaluator {
    pub fn new() -> Self {
        Self { last_duty: None, last_write: None }
    }

    /// Evaluates `points` at `temp` and returns `Some(duty)` only if the
    /// hysteresis rule permits a write this tick: `|new - prev| >= 2` or
    /// more than 5 s have elapsed since the last write. Returns the
    /// rounded duty percentage.
    pub fn evaluate(&mut self, points: &[CurvePointWire], temp: f32) -> Option<f32> {
        let raw = interpolate(points, temp).round();
        let should_write = match (self.last_duty, self.last_write) {
            (None, _) => true,
            (Some(prev), Some(last_write)) => {
                (raw - prev).abs() >= HYSTERESIS_DUTY_DELTA || last_write.elapsed() >= HYSTERESIS_MAX_AGE
            }
            (Some(_), None) => true,
        };
        if should_write {
            self.last_duty = Some(raw);
            self.last_write = Some(Instant::now());
            Some(raw)
        } else {
            None
        }
    }

    pub fn last_duty(&self) -> Option<f32> {
        self.last_duty
    }
}

impl Default for FanCurveEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Same evaluator, quantized to pump levels `{0,1,2,3}` using the curve's
/// level column (`duty_pct` holds the level number for pump tables).
pub fn evaluate_pump_level(points: &[CurvePointWire], temp: f32) -> u8 {
    let raw = interpolate(points, temp).round();
    (raw as i32).clamp(0, MAX_PUMP_LEVEL as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(data: &[(f32, f32)]) -> Vec<CurvePointWire> {
        data.iter().map(|(t, d)| CurvePointWire { temp_c: *t, duty_pct: *d }).collect()
    }

    #[test]
    fn single_point_curve_is_constant() {
        let points = pts(&[(50.0, 40.0)]);
        assert_eq!(interpolate(&points, 20.0), 40.0);
        assert_eq!(interpolate(&points, 90.0), 40.0);
    }

    #[test]
    fn interpolates_linearly_between_points() {
        let points = pts(&[(40.0, 20.0), (60.0, 60.0)]);
        assert_eq!(interpolate(&points, 50.0), 40.0);
    }

    #[test]
    fn clamps_outside_domain() {
        let points = pts(&[(40.0, 20.0), (60.0, 60.0)]);
        assert_eq!(interpolate(&points, 10.0), 20.0);
        assert_eq!(interpolate(&points, 100.0), 60.0);
    }

    #[test]
    fn equal_temps_rejected() {
        let points = pts(&[(40.0, 20.0), (40.0, 30.0)]);
        assert!(validate_curve(&points).is_err());
    }

    #[test]
    fn decreasing_duty_rejected() {
        let points = pts(&[(40.0, 50.0), (60.0, 20.0)]);
        assert!(validate_curve(&points).is_err());
    }

    #[test]
    fn hysteresis_suppresses_small_changes() {
        let points = pts(&[(40.0, 20.0), (60.0, 22.0)]);
        let mut eval = FanCurveEvaluator::new();
        assert_eq!(eval.evaluate(&points, 40.0), Some(20.0));
        // 41C interpolates to ~20.1 -> rounds to 20, delta 0, suppressed.
        assert_eq!(eval.evaluate(&points, 41.0), None);
        assert_eq!(eval.last_duty(), Some(20.0));
    }

    #[test]
    fn pump_level_quantized_and_clamped() {
        let points = pts(&[(40.0, 0.0), (100.0, 5.0)]);
        assert_eq!(evaluate_pump_level(&points, 40.0), 0);
        assert_eq!(evaluate_pump_level(&points, 100.0), 3);
    }
}
