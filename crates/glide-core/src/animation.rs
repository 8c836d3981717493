//! Style animations built from per-property descriptors.
//!
//! An [`AnimationSpec`] maps property names to [`AnimationDescriptor`]s.
//! Specs compose by key: merging a newer spec overrides the properties it
//! names and keeps every other property's descriptor. A [`StyleAnimation`]
//! turns a spec into frames over a [`StyleProps`] value.
//!
//! # Example
//!
//! ```
//! use glide_core::{AnimationDescriptor, AnimationSpec, StyleAnimation};
//!
//! let spec = AnimationSpec::new()
//!     .with("opacity", AnimationDescriptor::timing(1.0, 300.0))
//!     .with("width", AnimationDescriptor::timing(120.0, 300.0).with_delay(50.0));
//! let animation = StyleAnimation::new(spec).with_callback(|finished| {
//!     println!("done: {finished}");
//! });
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::easing::EasingFunction;
use crate::interpolate::Interpolate;
use crate::types::{PropValue, StyleProps};

/// Completion callback; receives `true` when the animation ran to its end
/// and `false` when it was interrupted.
pub type AnimationCallback = Box<dyn FnOnce(bool)>;

/// Something that produces frames for a value of type `T`.
pub trait Animation<T>: 'static {
    /// Called once when the animation is attached, with the value it starts from.
    fn start(&mut self, current: &T);

    /// Write the frame for `timestamp` into `value`. Returns `true` on the final frame.
    fn step(&mut self, timestamp: f64, value: &mut T) -> bool;

    /// Detach the completion callback.
    fn take_callback(&mut self) -> Option<AnimationCallback>;
}

/// How a single property animates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationDescriptor {
    /// Interpolate from the current value to `to` over `duration_ms`.
    Timing {
        to: PropValue,
        duration_ms: f64,
        #[serde(default)]
        delay_ms: f64,
        #[serde(default)]
        easing: EasingFunction,
    },
    /// Jump to `to` on the first frame.
    Set { to: PropValue },
}

impl AnimationDescriptor {
    pub fn timing(to: impl Into<PropValue>, duration_ms: f64) -> Self {
        Self::Timing {
            to: to.into(),
            duration_ms,
            delay_ms: 0.0,
            easing: EasingFunction::default(),
        }
    }

    pub fn set(to: impl Into<PropValue>) -> Self {
        Self::Set { to: to.into() }
    }

    /// Set the delay (timing only).
    pub fn with_delay(mut self, delay: f64) -> Self {
        if let Self::Timing { delay_ms, .. } = &mut self {
            *delay_ms = delay;
        }
        self
    }

    /// Set the easing curve (timing only).
    pub fn with_easing(mut self, curve: EasingFunction) -> Self {
        if let Self::Timing { easing, .. } = &mut self {
            *easing = curve;
        }
        self
    }

    /// The value this descriptor ends on.
    pub fn target(&self) -> &PropValue {
        match self {
            Self::Timing { to, .. } | Self::Set { to } => to,
        }
    }

    /// Total running time including delay.
    pub fn total_ms(&self) -> f64 {
        match self {
            Self::Timing {
                duration_ms,
                delay_ms,
                ..
            } => duration_ms.max(0.0) + delay_ms.max(0.0),
            Self::Set { .. } => 0.0,
        }
    }

    /// Value at `elapsed` ms after start, and whether the descriptor is done.
    fn sample(&self, from: &PropValue, elapsed: f64) -> (PropValue, bool) {
        match self {
            Self::Set { to } => (to.clone(), true),
            Self::Timing {
                to,
                duration_ms,
                delay_ms,
                easing,
            } => {
                let local = elapsed - delay_ms;
                if local < 0.0 {
                    return (from.clone(), false);
                }
                let progress = if *duration_ms > 0.0 {
                    (local / duration_ms).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                if progress >= 1.0 {
                    (to.clone(), true)
                } else {
                    (from.interpolate(to, easing.evaluate(progress)), false)
                }
            }
        }
    }
}

/// Property name → descriptor, composed by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimationSpec {
    descriptors: BTreeMap<String, AnimationDescriptor>,
}

impl AnimationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: impl Into<String>, descriptor: AnimationDescriptor) -> Self {
        self.insert(property, descriptor);
        self
    }

    pub fn insert(&mut self, property: impl Into<String>, descriptor: AnimationDescriptor) {
        self.descriptors.insert(property.into(), descriptor);
    }

    pub fn get(&self, property: &str) -> Option<&AnimationDescriptor> {
        self.descriptors.get(property)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnimationDescriptor)> {
        self.descriptors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge a newer spec: its descriptors override same-named ones, all others are kept.
    pub fn merge(&mut self, newer: &AnimationSpec) {
        for (property, descriptor) in &newer.descriptors {
            self.descriptors.insert(property.clone(), descriptor.clone());
        }
    }

    pub fn merged(&self, newer: &AnimationSpec) -> AnimationSpec {
        let mut out = self.clone();
        out.merge(newer);
        out
    }
}

struct Track {
    property: String,
    from: PropValue,
    descriptor: AnimationDescriptor,
    done: bool,
}

/// Animation over a [`StyleProps`] value, one track per spec property.
///
/// Each property starts from its entry in the value being animated, or from
/// its own target when the value has no such entry. The clock starts on the
/// first frame, so the first frame always shows the starting values.
pub struct StyleAnimation {
    spec: AnimationSpec,
    tracks: Vec<Track>,
    start_time: Option<f64>,
    callback: Option<AnimationCallback>,
}

impl StyleAnimation {
    pub fn new(spec: AnimationSpec) -> Self {
        Self {
            spec,
            tracks: Vec::new(),
            start_time: None,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: impl FnOnce(bool) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn spec(&self) -> &AnimationSpec {
        &self.spec
    }
}

impl Animation<StyleProps> for StyleAnimation {
    fn start(&mut self, current: &StyleProps) {
        self.start_time = None;
        self.tracks = self
            .spec
            .iter()
            .map(|(property, descriptor)| Track {
                property: property.to_string(),
                from: current
                    .get(property)
                    .cloned()
                    .unwrap_or_else(|| descriptor.target().clone()),
                descriptor: descriptor.clone(),
                done: false,
            })
            .collect();
    }

    fn step(&mut self, timestamp: f64, value: &mut StyleProps) -> bool {
        let start = *self.start_time.get_or_insert(timestamp);
        let elapsed = timestamp - start;

        let mut all_done = true;
        for track in &mut self.tracks {
            if track.done {
                continue;
            }
            let (frame, done) = track.descriptor.sample(&track.from, elapsed);
            match value.get_mut(&track.property) {
                Some(slot) => *slot = frame,
                None => {
                    value.insert(track.property.clone(), frame);
                }
            }
            track.done = done;
            all_done &= done;
        }
        all_done
    }

    fn take_callback(&mut self) -> Option<AnimationCallback> {
        self.callback.take()
    }
}

impl fmt::Debug for StyleAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleAnimation")
            .field("spec", &self.spec)
            .field("start_time", &self.start_time)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(to: f64, duration_ms: f64) -> AnimationDescriptor {
        AnimationDescriptor::timing(to, duration_ms).with_easing(EasingFunction::Linear)
    }

    #[test]
    fn test_spec_merge_by_key() {
        let first = AnimationSpec::new()
            .with("opacity", linear(1.0, 100.0))
            .with("width", linear(100.0, 100.0));
        let second = AnimationSpec::new()
            .with("width", linear(200.0, 100.0))
            .with("height", linear(50.0, 100.0));

        let merged = first.merged(&second);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("opacity").unwrap().target(), &PropValue::Number(1.0));
        assert_eq!(merged.get("width").unwrap().target(), &PropValue::Number(200.0));
        assert_eq!(merged.get("height").unwrap().target(), &PropValue::Number(50.0));
    }

    #[test]
    fn test_style_animation_frames() {
        let mut animation = StyleAnimation::new(
            AnimationSpec::new()
                .with("opacity", linear(1.0, 100.0))
                .with("width", linear(100.0, 50.0).with_delay(50.0)),
        );
        let mut value = StyleProps::new().with("opacity", 0.0).with("width", 0.0);
        animation.start(&value);

        assert!(!animation.step(1000.0, &mut value));
        assert_eq!(value.get_f64("opacity"), Some(0.0));

        assert!(!animation.step(1050.0, &mut value));
        assert_eq!(value.get_f64("opacity"), Some(0.5));
        assert_eq!(value.get_f64("width"), Some(0.0));

        assert!(!animation.step(1075.0, &mut value));
        assert_eq!(value.get_f64("width"), Some(50.0));

        assert!(animation.step(1100.0, &mut value));
        assert_eq!(value.get_f64("opacity"), Some(1.0));
        assert_eq!(value.get_f64("width"), Some(100.0));
    }

    #[test]
    fn test_missing_property_starts_at_target() {
        let mut animation =
            StyleAnimation::new(AnimationSpec::new().with("height", linear(40.0, 100.0)));
        let mut value = StyleProps::new();
        animation.start(&value);

        animation.step(0.0, &mut value);
        assert_eq!(value.get_f64("height"), Some(40.0));
    }

    #[test]
    fn test_set_descriptor_finishes_immediately() {
        let mut animation = StyleAnimation::new(
            AnimationSpec::new().with("pointerEvents", AnimationDescriptor::set("none")),
        );
        let mut value = StyleProps::new().with("pointerEvents", "auto");
        animation.start(&value);

        assert!(animation.step(5.0, &mut value));
        assert_eq!(value.get("pointerEvents").and_then(PropValue::as_str), Some("none"));
    }

    #[test]
    fn test_callback_is_taken_once() {
        let mut animation = StyleAnimation::new(AnimationSpec::new()).with_callback(|_| {});
        assert!(animation.take_callback().is_some());
        assert!(animation.take_callback().is_none());
    }

    #[test]
    fn test_descriptor_serde() {
        let json = r#"{"type":"timing","to":{"type":"number","value":1.0},"duration_ms":300.0}"#;
        let descriptor: AnimationDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor, AnimationDescriptor::timing(1.0, 300.0));
        assert_eq!(descriptor.total_ms(), 300.0);
    }
}
