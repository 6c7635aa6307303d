//! Declarative filter-graph node definitions.
//!
//! A [`FilterSpec`] is one node of an FFmpeg audio filter graph. Unlabeled
//! specs sit on the default stream and chain positionally; labeled specs
//! describe branching topologies (split, per-branch sub-chains, sidechain
//! ducking, weighted mixing).

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Scalar filter parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            FilterValue::Integer(i) => write!(f, "{}", i),
            // Whole floats keep one fractional digit so `1.0` stays `1.0`
            FilterValue::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{:.1}", v)
            }
            FilterValue::Float(v) => write!(f, "{}", v),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

/// Insertion-ordered filter parameters.
///
/// Order is significant: generic filters serialize their parameters in the
/// order given, and JSON object order is kept across load and save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterArgs(Vec<(String, FilterValue)>);

impl FilterArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a parameter; an existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for FilterArgs
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = FilterArgs::new();
        for (k, v) in iter {
            args.insert(k, v);
        }
        args
    }
}

impl Serialize for FilterArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterArgs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ArgsVisitor;

        impl<'de> Visitor<'de> for ArgsVisitor {
            type Value = FilterArgs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of filter parameter names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut args = FilterArgs::new();
                while let Some((key, value)) = access.next_entry::<String, FilterValue>()? {
                    args.insert(key, value);
                }
                Ok(args)
            }
        }

        deserializer.deserialize_map(ArgsVisitor)
    }
}

impl JsonSchema for FilterArgs {
    fn schema_name() -> String {
        "FilterArgs".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <BTreeMap<String, FilterValue>>::json_schema(gen)
    }
}

/// One node of the audio filter graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "FilterSpecRepr")]
pub struct FilterSpec {
    /// Engine filter name (e.g. "highpass", "asplit", "amix")
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "FilterArgs::is_empty")]
    pub args: FilterArgs,
    /// Input stream labels, in pad order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_labels: Vec<String>,
    /// Output stream labels, in pad order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output_labels: Vec<String>,
    /// Engine filter override for sidechain nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Nested unlabeled filters forming a labeled sub-chain
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterSpec>,
}

/// On-disk shape, accepting the singular and alias label fields.
#[derive(Deserialize, JsonSchema)]
struct FilterSpecRepr {
    #[serde(default)]
    name: String,
    #[serde(default)]
    args: Option<FilterArgs>,
    #[serde(default)]
    input_label: Option<String>,
    #[serde(default)]
    input_labels: Vec<String>,
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    output_label: Option<String>,
    #[serde(default)]
    output_labels: Vec<String>,
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    filters: Vec<FilterSpec>,
}

impl From<FilterSpecRepr> for FilterSpec {
    fn from(repr: FilterSpecRepr) -> Self {
        let input_labels = repr
            .input_label
            .into_iter()
            .chain(repr.input_labels)
            .chain(repr.inputs)
            .collect();
        let output_labels = repr
            .output_label
            .into_iter()
            .chain(repr.output_labels)
            .collect();

        Self {
            name: repr.name,
            args: repr.args.unwrap_or_default(),
            input_labels,
            output_labels,
            filter: repr.filter,
            filters: repr.filters,
        }
    }
}

impl JsonSchema for FilterSpec {
    fn schema_name() -> String {
        "FilterSpec".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        FilterSpecRepr::json_schema(gen)
    }
}

impl FilterSpec {
    /// Create an unlabeled filter with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a labeled sub-chain of unlabeled filters.
    pub fn chain(filters: Vec<FilterSpec>) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    /// Builder-style parameter insert.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.args.insert(key, value);
        self
    }

    pub fn with_args(mut self, args: FilterArgs) -> Self {
        self.args = args;
        self
    }

    pub fn with_input(mut self, label: impl Into<String>) -> Self {
        self.input_labels.push(label.into());
        self
    }

    pub fn with_output(mut self, label: impl Into<String>) -> Self {
        self.output_labels.push(label.into());
        self
    }

    pub fn with_inputs<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn with_outputs<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Set the engine filter used by a sidechain node.
    pub fn with_engine_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn is_labeled(&self) -> bool {
        !self.input_labels.is_empty() || !self.output_labels.is_empty()
    }

    /// Check structural invariants: every node is either named or a non-empty sub-chain.
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() && self.filters.is_empty() {
            return Err(ModelError::invalid_filter(
                "filter has neither a name nor nested filters",
            ));
        }
        for inner in &self.filters {
            if inner.is_labeled() {
                return Err(ModelError::invalid_filter(format!(
                    "nested filter '{}' must not declare labels",
                    inner.name
                )));
            }
            inner.validate()?;
        }
        Ok(())
    }
}
