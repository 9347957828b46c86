/**
 * File: /src/params.rs
 * Created Date: Tuesday, March 18th 2025
 * Author: Zihan
 * -----
 * Last Modified: Tuesday, 18th March 2025 3:21:09 pm
 * Modified By: Zihan Wu <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single hyperparameter value as the external engine understands it.
///
/// `Formula` is an opaque model-formula token (e.g. `y ~ m + a + b`) passed
/// through to the engine uninterpreted; this crate never parses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Str(String),
    Formula(String),
}

impl ParamValue {
    pub fn formula(expr: &str) -> Self {
        ParamValue::Formula(expr.to_string())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
            ParamValue::Formula(v) => write!(f, "{}", v),
        }
    }
}

/// Hyperparameter set for one algorithm variant.
///
/// Entries keep their insertion order so the engine call is reproducible.
/// Each variant exposes a default template; merging overrides always copies
/// the template first, so the shared defaults are never mutated.
///
/// # Example
/// ```
/// use rbiclust::params::{ParamValue, ParameterSet};
/// let defaults = ParameterSet::from_defaults(&[
///     ("delta", ParamValue::Float(0.1)),
///     ("number", ParamValue::Int(100)),
/// ]);
/// let merged = defaults.merge(&[("delta", ParamValue::Float(0.2))]);
///
/// assert_eq!(merged.get("delta"), Some(&ParamValue::Float(0.2)));
/// assert_eq!(defaults.get("delta"), Some(&ParamValue::Float(0.1)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    pub fn from_defaults(defaults: &[(&str, ParamValue)]) -> Self {
        ParameterSet {
            entries: defaults
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        }
    }

    /// Copy this set and replace the values of known keys.
    ///
    /// Keys absent from the template are dropped, not rejected: unknown
    /// parameters must never reach the engine. Dropped keys are logged so a
    /// sweep harness can notice typos.
    pub fn merge(&self, overrides: &[(&str, ParamValue)]) -> ParameterSet {
        let mut merged = self.clone();
        for (name, value) in overrides {
            match merged.entries.iter_mut().find(|(key, _)| key == name) {
                Some((_, slot)) => *slot = value.clone(),
                None => debug!("ignoring unknown parameter `{}`", name),
            }
        }
        merged
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
