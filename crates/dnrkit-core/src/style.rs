//! Inline style maps produced by the engines.

use crate::dom::{Dom, DomResult, ElementId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CSS property → value map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleMap(BTreeMap<String, String>);

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(property.into(), value.into());
        self
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.0.remove(property)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.0.contains_key(property)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Layer `other` over `self`: keys present in both take `other`'s value.
    pub fn merge(&mut self, other: &StyleMap) -> &mut Self {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
        self
    }

    /// Return a new map with `other` layered over `self`.
    pub fn merged(&self, other: &StyleMap) -> StyleMap {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// Write every property as an inline style.
    pub fn apply(&self, dom: &mut dyn Dom, element: ElementId) -> DomResult<()> {
        for (k, v) in self.iter() {
            dom.set_style(element, k, v)?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Style maps layered on top of each other per interaction state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateStyles {
    pub default: StyleMap,
    pub active: StyleMap,
    pub dragging: StyleMap,
    pub resizing: StyleMap,
}
