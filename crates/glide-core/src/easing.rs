//! Timing curves for timing animations.
//!
//! Maps linear progress in `[0, 1]` to eased progress. Bezier curves are
//! solved with Newton-Raphson on the x polynomial, which is plenty for
//! per-frame evaluation.

use serde::{Deserialize, Serialize};

/// Where the jump happens in a stepped curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// Jump at the start of each interval.
    Start,
    /// Jump at the end of each interval.
    #[default]
    End,
}

/// Easing curve applied to a timing animation's progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    Linear,
    /// `cubic-bezier(0.25, 0.1, 0.25, 1.0)`
    Ease,
    /// `cubic-bezier(0.42, 0, 1, 1)`
    EaseIn,
    /// `cubic-bezier(0, 0, 0.58, 1)`
    EaseOut,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`; the default for timing animations.
    #[default]
    EaseInOut,
    /// Custom curve; x control points must lie in `[0, 1]`.
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Discrete jumps, `count >= 1`.
    Steps { count: u32, position: StepPosition },
}

impl EasingFunction {
    /// Evaluate the curve at `t` (clamped to `[0, 1]`).
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);

        match *self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
            Self::Steps { count, position } => stepped(count, position, t),
        }
    }

    /// Create a custom cubic bezier curve.
    ///
    /// # Panics
    /// Panics if `x1` or `x2` are outside `[0, 1]`.
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2),
            "Bezier x values must be in [0, 1]"
        );
        Self::CubicBezier { x1, y1, x2, y2 }
    }

    /// Create a stepped curve.
    ///
    /// # Panics
    /// Panics if `count` is 0.
    pub fn steps(count: u32, position: StepPosition) -> Self {
        assert!(count >= 1, "Steps must be at least 1");
        Self::Steps { count, position }
    }
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_component(y1, y2, t)
}

fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = bezier_component(x1, x2, t) - target_x;
        if x.abs() < 1e-7 {
            break;
        }

        let dx = bezier_derivative(x1, x2, t);
        if dx.abs() < 1e-7 {
            break;
        }

        t = (t - x / dx).clamp(0.0, 1.0);
    }

    t
}

/// `3(1-t)²t·p1 + 3(1-t)t²·p2 + t³`
#[inline]
fn bezier_component(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

#[inline]
fn bezier_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

fn stepped(count: u32, position: StepPosition, t: f64) -> f64 {
    if count == 0 {
        return t;
    }

    let steps = f64::from(count);
    match position {
        StepPosition::Start => (t * steps).ceil() / steps,
        StepPosition::End => (t * steps).floor() / steps,
    }
}
