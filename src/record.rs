//! Raw treatment records as handed over by a front end

use crate::error::{PredictorError, Result};
use crate::schema::ResolvedSchema;
use crate::utils::{is_missing_marker, number_label};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A feature value before preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawValue::Missing)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(v) => write!(f, "{}", v),
            RawValue::Text(s) => write!(f, "{}", s),
            RawValue::Missing => write!(f, "<missing>"),
        }
    }
}

/// One inference request: feature name to raw value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreatmentRequest {
    values: BTreeMap<String, RawValue>,
}

impl TreatmentRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set any feature
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<RawValue> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.values.iter()
    }

    /// Parse `key=value` pairs separated by `;` or newlines.
    ///
    /// Values that parse as numbers become [`RawValue::Number`], an empty
    /// value becomes [`RawValue::Missing`], anything else is text.
    pub fn parse_pairs(input: &str) -> Result<Self> {
        let mut request = Self::new();
        for pair in input.split(|c| c == ';' || c == '\n') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                PredictorError::ValidationError(format!("expected key=value, got '{}'", pair))
            })?;
            let value = value.trim();
            let raw = if value.is_empty() {
                RawValue::Missing
            } else if let Ok(v) = value.parse::<f64>() {
                RawValue::Number(v)
            } else {
                RawValue::Text(value.to_string())
            };
            request.set(key.trim(), raw);
        }
        Ok(request)
    }

    /// Build a one-row frame holding the schema's features.
    ///
    /// Features absent from the request are left out so the fitted transform
    /// can report them; keys the schema does not know are ignored.
    pub fn to_frame(&self, schema: &ResolvedSchema) -> Result<DataFrame> {
        Self::batch_to_frame(std::slice::from_ref(self), schema)
    }

    /// Build a frame with one row per request.
    ///
    /// A feature is included only when every request carries it.
    pub fn batch_to_frame(requests: &[TreatmentRequest], schema: &ResolvedSchema) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(schema.features.len());

        for name in &schema.features {
            if !requests.iter().all(|r| r.contains(name)) {
                continue;
            }
            let values = requests.iter().filter_map(|r| r.get(name));
            let column = if schema.is_categorical(name) {
                let texts: Vec<Option<String>> = values
                    .map(|v| match v {
                        RawValue::Text(s) if is_missing_marker(s) => None,
                        RawValue::Text(s) => Some(s.clone()),
                        RawValue::Number(n) if n.is_finite() => Some(number_label(*n)),
                        RawValue::Number(_) | RawValue::Missing => None,
                    })
                    .collect();
                Column::new(name.as_str().into(), texts)
            } else {
                let numbers = values
                    .map(|v| match v {
                        RawValue::Number(n) => Ok(Some(*n).filter(|x| x.is_finite())),
                        RawValue::Missing => Ok(None),
                        RawValue::Text(s) if is_missing_marker(s) => Ok(None),
                        RawValue::Text(s) => s
                            .trim()
                            .parse::<f64>()
                            .map(|x| Some(x).filter(|x| x.is_finite()))
                            .map_err(|_| {
                                PredictorError::DataError(format!(
                                    "column '{}' expects a number, got '{}'",
                                    name, s
                                ))
                            }),
                    })
                    .collect::<Result<Vec<Option<f64>>>>()?;
                Column::new(name.as_str().into(), numbers)
            };
            columns.push(column);
        }

        DataFrame::new(columns).map_err(|e| PredictorError::DataError(e.to_string()))
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for TreatmentRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut request = Self::new();
        for (k, v) in iter {
            request.set(k, v);
        }
        request
    }
}
