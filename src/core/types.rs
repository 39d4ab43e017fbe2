use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Extra fields carried through from the raw report, ordered by key.
pub type ExtraFields = BTreeMap<String, FieldValue>;

/// A scalar field value from the upstream report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text, also used for nested JSON carried as its serialized form
    Str(String),
    /// Boolean flag
    Bool(bool),
}

impl FieldValue {
    /// Convert a JSON value. Nulls have no representation and yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Null => None,
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(FieldValue::Int(i)),
                None => n.as_f64().map(FieldValue::Float),
            },
            Value::String(s) => Some(FieldValue::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => Some(FieldValue::Str(value.to_string())),
        }
    }

    /// Integer view of the value: floats truncate toward zero, numeric strings are parsed.
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            FieldValue::Float(_) => None,
            FieldValue::Str(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            },
            FieldValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One observation for a named metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Series key
    pub name: String,
    /// Milliseconds since the Unix epoch, assigned when the sample is accepted
    pub timestamp: i64,
    /// Average reported for the tick
    pub value: i64,
    /// Remaining report fields, not interpreted
    pub extra: ExtraFields,
}

impl Sample {
    /// Create a sample without extra fields.
    pub fn new(name: impl Into<String>, timestamp: i64, value: i64) -> Self {
        Self {
            name: name.into(),
            timestamp,
            value,
            extra: ExtraFields::new(),
        }
    }

    /// Attach extra fields.
    pub fn with_extra(mut self, extra: ExtraFields) -> Self {
        self.extra = extra;
        self
    }
}

/// Append-only, insertion-ordered samples of one metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    /// Create an empty series
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample at the end
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the series holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in stored order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Timestamps in stored order
    pub fn timestamps(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    /// Values in stored order
    pub fn values(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Consume the series into its samples
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

impl From<Vec<Sample>> for Series {
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value_from_json() {
        assert_eq!(FieldValue::from_json(&json!(42)), Some(FieldValue::Int(42)));
        assert_eq!(FieldValue::from_json(&json!(1.5)), Some(FieldValue::Float(1.5)));
        assert_eq!(FieldValue::from_json(&json!("GET")), Some(FieldValue::Str("GET".into())));
        assert_eq!(FieldValue::from_json(&json!(true)), Some(FieldValue::Bool(true)));
        assert_eq!(FieldValue::from_json(&json!(null)), None);
        assert_eq!(
            FieldValue::from_json(&json!([1, 2])),
            Some(FieldValue::Str("[1,2]".into()))
        );
    }

    #[test]
    fn test_field_value_as_i64() {
        assert_eq!(FieldValue::Int(7).as_i64(), Some(7));
        assert_eq!(FieldValue::Float(12.9).as_i64(), Some(12));
        assert_eq!(FieldValue::Float(-3.7).as_i64(), Some(-3));
        assert_eq!(FieldValue::Float(f64::NAN).as_i64(), None);
        assert_eq!(FieldValue::Str(" 18 ".into()).as_i64(), Some(18));
        assert_eq!(FieldValue::Str("4.2".into()).as_i64(), Some(4));
        assert_eq!(FieldValue::Str("slow".into()).as_i64(), None);
        assert_eq!(FieldValue::Bool(true).as_i64(), None);
    }

    #[test]
    fn test_series_accessors() {
        let mut series = Series::new();
        assert!(series.is_empty());

        series.push(Sample::new("svc-a", 1_000, 12));
        series.push(Sample::new("svc-a", 2_000, 18));

        assert_eq!(series.len(), 2);
        assert_eq!(series.timestamps(), vec![1_000, 2_000]);
        assert_eq!(series.values(), vec![12, 18]);
        assert_eq!(series.samples()[1].name, "svc-a");
    }
}
