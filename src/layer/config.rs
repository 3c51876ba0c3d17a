use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::error::FxResult;
use crate::pool::object_pool::PoolOpts;
use crate::state::interaction::InteractivityConfig;
use crate::timing::TimingConfig;

/// Off-thread pre-simplification of line and polygon features.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimplifyConfig {
    /// Douglas-Peucker tolerance in degrees.
    pub tolerance: f64,
    pub timeout_ms: u64,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.0001,
            timeout_ms: 50,
        }
    }
}

impl SimplifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Everything needed to stand up one effect layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerConfig {
    pub id: String,
    /// Registry name of the shader definition.
    pub shader: String,
    /// Raw shader configuration; each field is a literal or an expression.
    pub config: serde_json::Map<String, serde_json::Value>,
    pub timing: TimingConfig,
    pub interactivity: InteractivityConfig,
    pub pools: PoolOpts,
    pub rebuild_interval_ms: u64,
    pub simplify: Option<SimplifyConfig>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            id: "featurefx".to_owned(),
            shader: "pulse".to_owned(),
            config: serde_json::Map::new(),
            timing: TimingConfig::default(),
            interactivity: InteractivityConfig::default(),
            pools: PoolOpts::default(),
            rebuild_interval_ms: 100,
            simplify: None,
        }
    }
}

impl LayerConfig {
    pub fn from_json_str(s: &str) -> FxResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn rebuild_interval(&self) -> Duration {
        Duration::from_millis(self.rebuild_interval_ms)
    }

    pub fn id_property(&self) -> Option<&str> {
        self.interactivity.feature_id_property.as_deref()
    }
}
