//! Concrete parameter assignments

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::parameter::ParameterValue;

/// One value per tunable parameter.
///
/// Backed by an ordered map so that display, keys and serialisation are
/// deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    values: BTreeMap<String, ParameterValue>,
}

impl Configuration {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParameterValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    /// Float value of a parameter (ints are widened)
    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_float()
    }

    /// Integer value of a parameter
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_int()
    }

    /// String value of a qualitative parameter
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.values.iter()
    }

    /// Identity of the assignment tuple. Floats use their shortest exact
    /// representation, so equal keys mean equal configurations.
    pub fn key(&self) -> String {
        self.key_excluding(None)
    }

    /// Key of the configuration with one parameter left out; configurations
    /// sharing it differ only in that parameter.
    pub(crate) fn key_excluding(&self, skip: Option<&str>) -> String {
        self.values
            .iter()
            .filter(|(name, _)| Some(name.as_str()) != skip)
            .map(|(name, value)| match value {
                ParameterValue::Float(v) => format!("{name}={v:?}"),
                other => format!("{name}={other}"),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(name, value)| match value {
                ParameterValue::Float(v) => format!("{name}={v:.4}"),
                other => format!("{name}={other}"),
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl FromIterator<(String, ParameterValue)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (String, ParameterValue)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}
