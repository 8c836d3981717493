//! Interpolation between prop values.
//!
//! Numbers and colors interpolate component-wise. Discrete values (text,
//! booleans) hold the starting value and snap to the target once progress
//! reaches 1.

use crate::types::PropValue;

/// Types that can be interpolated between two values.
///
/// `t = 0.0` yields `self`, `t = 1.0` yields `to`. Eased progress may
/// overshoot either bound.
pub trait Interpolate: Sized {
    fn interpolate(&self, to: &Self, t: f64) -> Self;
}

#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp(*self, *to, t)
    }
}

impl Interpolate for [f32; 4] {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        let t = t as f32;
        [
            self[0] + (to[0] - self[0]) * t,
            self[1] + (to[1] - self[1]) * t,
            self[2] + (to[2] - self[2]) * t,
            self[3] + (to[3] - self[3]) * t,
        ]
    }
}

impl Interpolate for PropValue {
    /// Mismatched variants behave like discrete values.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        match (self, to) {
            (Self::Number(from), Self::Number(to)) => Self::Number(from.interpolate(to, t)),
            (Self::Color(from), Self::Color(to)) => Self::Color(from.interpolate(to, t)),
            _ if t >= 1.0 => to.clone(),
            _ => self.clone(),
        }
    }
}
