//! Core value types shared by the commit pipeline and layout animations.
//!
//! - `Tag`: identifier of one native view instance
//! - `PropValue`: a single style/prop value
//! - `StyleProps`: a property-name keyed snapshot with shallow-merge semantics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of one native view instance.
///
/// Stable for the lifetime of the view; reused only after the view has been
/// unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub u64);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for Tag {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A single style or prop value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropValue {
    /// Numeric value (width, opacity, translate, ...)
    Number(f64),
    /// RGBA color components.
    Color([f32; 4]),
    /// Free-form string value (pointer events, display, ...)
    Text(String),
    /// Boolean flag.
    Bool(bool),
}

impl PropValue {
    /// Try to extract a numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract a color value.
    pub fn as_color(&self) -> Option<[f32; 4]> {
        match self {
            Self::Color(rgba) => Some(*rgba),
            _ => None,
        }
    }

    /// Try to extract a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<[f32; 4]> for PropValue {
    fn from(c: [f32; 4]) -> Self {
        Self::Color(c)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Snapshot of style properties keyed by property name.
///
/// Merging is shallow: a later snapshot overwrites properties it names and
/// leaves every other property untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleProps {
    values: BTreeMap<String, PropValue>,
}

impl StyleProps {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Option<PropValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Get a property value.
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    /// Get a numeric property value.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(PropValue::as_f64)
    }

    /// Get a mutable reference to a property value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropValue> {
        self.values.get_mut(name)
    }

    /// Remove a property.
    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        self.values.remove(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all property-value pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over property names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Shallow-merge `other` over `self`.
    pub fn merge(&mut self, other: &StyleProps) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), value.clone());
        }
    }

    /// Return a copy of `self` with `other` shallow-merged over it.
    pub fn merged(&self, other: &StyleProps) -> StyleProps {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// True when every property in `self` is present in `other` with an equal value.
    pub fn is_subset_of(&self, other: &StyleProps) -> bool {
        self.values
            .iter()
            .all(|(name, value)| other.values.get(name) == Some(value))
    }
}

impl<K, V> FromIterator<(K, V)> for StyleProps
where
    K: Into<String>,
    V: Into<PropValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StyleProps {
    type Item = (&'a String, &'a PropValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, PropValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
