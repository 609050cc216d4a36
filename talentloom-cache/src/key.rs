//! Hierarchical query keys.
//!
//! A key is an ordered tuple of JSON segments: a resource name, optional
//! sub-path segments, and an optional trailing parameter object. Two keys
//! are the same key exactly when their canonical serializations match, and
//! a key addresses every key it is a segment-wise prefix of.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Ordered, serializable identifier of one cache entry.
///
/// Object segments serialize with sorted member names, so parameter objects
/// built in any field order produce the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<Value>", into = "Vec<Value>")]
pub struct QueryKey {
    segments: Vec<Value>,
    canonical: String,
}

impl QueryKey {
    /// Key of a whole resource, e.g. `["pipeline"]`.
    pub fn new(resource: impl Into<String>) -> Self {
        Self::from_segments(vec![Value::String(resource.into())])
    }

    pub fn from_segments(segments: Vec<Value>) -> Self {
        let canonical = Value::Array(segments.clone()).to_string();
        Self {
            segments,
            canonical,
        }
    }

    /// Append a sub-path segment.
    pub fn push(mut self, segment: impl Into<Value>) -> Self {
        self.segments.push(segment.into());
        self.canonical = Value::Array(self.segments.clone()).to_string();
        self
    }

    /// Append a parameter object; `None` and `null` leave the key unchanged.
    pub fn with_params(self, params: Option<Value>) -> Self {
        match params {
            None | Some(Value::Null) => self,
            Some(value) => self.push(value),
        }
    }

    pub fn segments(&self) -> &[Value] {
        &self.segments
    }

    /// Leading segment, when it is a string.
    pub fn resource(&self) -> Option<&str> {
        self.segments.first().and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// True when every segment of `self` equals the segment of `other` at
    /// the same position. A key is a prefix of itself.
    pub fn is_prefix_of(&self, other: &QueryKey) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for QueryKey {}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl From<Vec<Value>> for QueryKey {
    fn from(segments: Vec<Value>) -> Self {
        Self::from_segments(segments)
    }
}

impl From<QueryKey> for Vec<Value> {
    fn from(key: QueryKey) -> Self {
        key.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_form_ignores_object_field_order() {
        let a = QueryKey::new("candidates").push(json!({"track": "backend", "skills": ["rust"]}));
        let b = QueryKey::new("candidates").push(json!({"skills": ["rust"], "track": "backend"}));
        assert_eq!(a, b);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_prefix_hierarchy() {
        let pipeline = QueryKey::new("pipeline");
        let suggestion = QueryKey::new("pipeline").push("suggestion").push("p1");
        assert!(pipeline.is_prefix_of(&suggestion));
        assert!(pipeline.is_prefix_of(&pipeline));
        assert!(!suggestion.is_prefix_of(&pipeline));
        assert!(!QueryKey::new("offers").is_prefix_of(&suggestion));
    }

    #[test]
    fn test_prefix_is_segment_wise_not_textual() {
        let job = QueryKey::new("jobs").push("1");
        let other = QueryKey::new("jobs").push("12");
        assert!(!job.is_prefix_of(&other));
    }

    #[test]
    fn test_absent_params_are_omitted() {
        let bare = QueryKey::new("candidates");
        assert_eq!(bare.clone().with_params(None), bare);
        assert_eq!(bare.clone().with_params(Some(Value::Null)), bare);
        assert_eq!(bare.clone().with_params(Some(json!({}))).len(), 2);
    }

    #[test]
    fn test_serializes_as_segment_array() {
        let key = QueryKey::new("matches").push("job").push("1");
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json, json!(["matches", "job", "1"]));
        let back: QueryKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, key);
        assert_eq!(key.to_string(), r#"["matches","job","1"]"#);
        assert_eq!(key.resource(), Some("matches"));
    }
}
