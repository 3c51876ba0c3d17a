use std::collections::HashSet;
use std::fmt;

pub use kurbo::{Point, Rect, Vec2};

/// Stable per-feature identity used by the state table and the `random` offset mode.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Canonical id for a JSON scalar. Integral numbers print without a fraction so `7` and
    /// `7.0` resolve to the same feature.
    pub fn from_json(v: &serde_json::Value) -> Option<Self> {
        match v {
            serde_json::Value::String(s) => Some(Self(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self(i.to_string()))
                } else if let Some(u) = n.as_u64() {
                    Some(Self(u.to_string()))
                } else {
                    let f = n.as_f64()?;
                    if f.fract() == 0.0 && f.abs() < 9.0e15 {
                        Some(Self((f as i64).to_string()))
                    } else {
                        Some(Self(f.to_string()))
                    }
                }
            }
            serde_json::Value::Bool(b) => Some(Self(b.to_string())),
            _ => None,
        }
    }

    pub fn positional(index: usize) -> Self {
        Self(index.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Deduplicates diagnostics so a failure that repeats every frame is reported once.
#[derive(Debug, Default)]
pub struct LogOnce {
    seen: HashSet<String>,
}

impl LogOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `key` is seen.
    pub fn first(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        self.seen.insert(key.to_owned());
        true
    }

    pub fn forget(&mut self, key: &str) {
        self.seen.remove(key);
    }
}
