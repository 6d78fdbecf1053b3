//! Fade curve implementations for channel gain ramps
//!
//! A fade maps normalized progress (0.0 at ramp start, 1.0 at ramp end) to a
//! shape multiplier. The mixer uses an ease-in shape when gain rises
//! (channel enabled) and an ease-out shape when gain falls (channel disabled).
//!
//! Every curve here is monotonic on [0, 1] and never overshoots, so a ramp
//! built from one stays between its start and target gain.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Fade curve types
///
/// - Linear: Constant rate of change
/// - Exponential: Slow start, fast finish (ease-in, default for fade-in)
/// - Logarithmic: Fast start, slow finish (ease-out, default for fade-out)
/// - SCurve: Smooth acceleration and deceleration
/// - EqualPower: Constant perceived loudness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// v(t) = t
    Linear,

    /// v(t) = t² for rising gain
    Exponential,

    /// v(t) = (1-t)² for falling gain
    Logarithmic,

    /// v(t) = 0.5 × (1 - cos(π × t))
    #[serde(alias = "cosine", alias = "scurve")]
    SCurve,

    /// v(t) = sin(t × π/2)
    EqualPower,
}

impl FadeCurve {
    /// Calculate fade-in multiplier at given position
    ///
    /// # Arguments
    /// * `position` - Normalized position through fade (0.0 to 1.0)
    ///
    /// # Returns
    /// Multiplier rising from 0.0 (start) to 1.0 (end)
    pub fn calculate_fade_in(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            // Inverse of the quadratic when a logarithmic shape rises
            FadeCurve::Logarithmic => t.sqrt(),
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Calculate fade-out multiplier at given position
    ///
    /// # Arguments
    /// * `position` - Normalized position through fade (0.0 to 1.0)
    ///
    /// # Returns
    /// Multiplier falling from 1.0 (start) to 0.0 (end)
    pub fn calculate_fade_out(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::Exponential => 1.0 - t * t,
            FadeCurve::Logarithmic => {
                let inv = 1.0 - t;
                inv * inv
            }
            FadeCurve::SCurve => 0.5 * (1.0 + (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        }
    }

    /// Gain between `from` and `to` at normalized `position`
    ///
    /// Rising ramps use the fade-in shape, falling ramps the fade-out shape.
    /// The result always lies between `from` and `to` inclusive.
    pub fn interpolate(&self, from: f32, to: f32, position: f32) -> f32 {
        let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
        let value = if to >= from {
            from + (to - from) * self.calculate_fade_in(position)
        } else {
            to + (from - to) * self.calculate_fade_out(position)
        };
        value.clamp(lo, hi)
    }
}

impl Default for FadeCurve {
    fn default() -> Self {
        FadeCurve::Exponential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CURVES: [FadeCurve; 5] = [
        FadeCurve::Linear,
        FadeCurve::Exponential,
        FadeCurve::Logarithmic,
        FadeCurve::SCurve,
        FadeCurve::EqualPower,
    ];

    #[test]
    fn test_fade_in_bounds() {
        for curve in ALL_CURVES {
            let start_val = curve.calculate_fade_in(0.0);
            let end_val = curve.calculate_fade_in(1.0);
            assert!(
                start_val.abs() < 0.01,
                "{:?} fade-in at 0.0 should be ~0.0, got {}",
                curve,
                start_val
            );
            assert!(
                (end_val - 1.0).abs() < 0.01,
                "{:?} fade-in at 1.0 should be ~1.0, got {}",
                curve,
                end_val
            );
        }
    }

    #[test]
    fn test_fade_out_bounds() {
        for curve in ALL_CURVES {
            let start_val = curve.calculate_fade_out(0.0);
            let end_val = curve.calculate_fade_out(1.0);
            assert!((start_val - 1.0).abs() < 0.01, "{:?} got {}", curve, start_val);
            assert!(end_val.abs() < 0.01, "{:?} got {}", curve, end_val);
        }
    }

    #[test]
    fn test_curves_are_monotonic() {
        for curve in ALL_CURVES {
            let mut prev_in = curve.calculate_fade_in(0.0);
            let mut prev_out = curve.calculate_fade_out(0.0);
            for step in 1..=100 {
                let t = step as f32 / 100.0;
                let fade_in = curve.calculate_fade_in(t);
                let fade_out = curve.calculate_fade_out(t);
                assert!(fade_in >= prev_in, "{:?} fade-in decreased at {}", curve, t);
                assert!(fade_out <= prev_out, "{:?} fade-out increased at {}", curve, t);
                prev_in = fade_in;
                prev_out = fade_out;
            }
        }
    }

    #[test]
    fn test_interpolate_stays_within_endpoints() {
        for curve in ALL_CURVES {
            for step in 0..=20 {
                let t = step as f32 / 20.0;
                let rising = curve.interpolate(0.2, 0.6, t);
                let falling = curve.interpolate(0.6, 0.0, t);
                assert!((0.2..=0.6).contains(&rising), "{:?} rising {}", curve, rising);
                assert!((0.0..=0.6).contains(&falling), "{:?} falling {}", curve, falling);
            }
        }
    }

    #[test]
    fn test_exponential_eases_in() {
        // Slow start: a quarter of the way in at half time
        let gain = FadeCurve::Exponential.interpolate(0.0, 1.0, 0.5);
        assert!((gain - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_logarithmic_eases_out() {
        // Fast start: three quarters of the drop done at half time
        let gain = FadeCurve::Logarithmic.interpolate(1.0, 0.0, 0.5);
        assert!((gain - 0.25).abs() < 0.001);
    }
}
