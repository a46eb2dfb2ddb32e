//! Target property sets and their CSS rendering

use super::VendorProfile;
use crate::{Error, Result};
use serde_json::Value;

/// Ordered map of CSS property name to target value.
///
/// Names may be camelCase (`backgroundColor`) or dashed (`background-color`).
/// Transform functions (`translateX`, `rotate`, `scale3d`, ...) are folded
/// into a single `transform` declaration when rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set `name`, replacing an earlier value in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Build from a JSON object; numbers are rendered without units.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::invalid_args("animate", "props must be an object"))?;
        let mut props = Properties::new();
        for (name, v) in map {
            let rendered = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(Error::invalid_args(
                        "animate",
                        format!("unsupported value for '{}': {}", name, other),
                    ))
                }
            };
            props.insert(name.as_str(), rendered);
        }
        Ok(props)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

/// `backgroundColor` -> `background-color`; dashed names pass through.
pub fn dasherize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '_' {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether `name` is a CSS transform function rather than a property
pub fn is_transform_function(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let with_axes = |base: &str, axes: &[&str]| {
        lower
            .strip_prefix(base)
            .is_some_and(|rest| axes.contains(&rest))
    };
    with_axes("translate", &["", "x", "y", "z", "3d"])
        || with_axes("rotate", &["", "x", "y", "z", "3d"])
        || with_axes("scale", &["", "x", "y", "z", "3d"])
        || with_axes("matrix", &["", "3d"])
        || with_axes("skew", &["", "x", "y"])
        || lower == "perspective"
}

/// Declarations to write and the property names that will animate
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CssPlan {
    pub(crate) values: Vec<(String, String)>,
    pub(crate) animated: Vec<String>,
}

pub(crate) fn plan(props: &Properties, profile: &VendorProfile) -> CssPlan {
    let mut values = Vec::with_capacity(props.len());
    let mut animated = Vec::with_capacity(props.len());
    let mut transforms: Vec<String> = Vec::new();

    for (name, value) in props.iter() {
        if is_transform_function(name) {
            transforms.push(format!("{}({})", name, value));
        } else {
            let key = dasherize(name);
            animated.push(key.clone());
            values.push((key, value.to_string()));
        }
    }

    if !transforms.is_empty() {
        let key = profile.transform().to_string();
        animated.push(key.clone());
        values.push((key, transforms.join(" ")));
    }

    CssPlan { values, animated }
}
