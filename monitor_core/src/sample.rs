use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named values produced by one collector invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub values: BTreeMap<String, f64>,
    pub collected_at: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(values: BTreeMap<String, f64>) -> Self {
        Self {
            values,
            collected_at: Utc::now(),
        }
    }

    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flatten a JSON document into dotted keys, keeping numeric leaves and
    /// mapping booleans to 1/0. Array elements are addressed by index.
    pub fn flatten_json(value: &serde_json::Value) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        flatten_into(value, String::new(), &mut out);
        out
    }
}

fn flatten_into(value: &serde_json::Value, prefix: String, out: &mut BTreeMap<String, f64>) {
    use serde_json::Value;

    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_f64() {
                out.insert(prefix, v);
            }
        }
        Value::Bool(b) => {
            out.insert(prefix, if *b { 1.0 } else { 0.0 });
        }
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(child, child_key(&prefix, key), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, child_key(&prefix, &index.to_string()), out);
            }
        }
        Value::String(_) | Value::Null => {}
    }
}

fn child_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
