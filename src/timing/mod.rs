//! Deterministic per-feature animation phase offsets.

use crate::expression::evaluator::ExpressionEvaluator;
use crate::expression::error::ExprCompileError;
use crate::expression::value::OutputType;
use crate::feature::model::Feature;
use crate::foundation::math::{Rng64, stable_hash64};

const OFFSET_CHANNEL: &str = "timeOffset";

/// How features are spread over the animation cycle.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TimingConfig {
    /// Every feature animates in phase.
    #[default]
    None,
    /// `index * step` seconds: a cascading wave in collection order.
    Stagger { step: f64 },
    /// Pseudo-random in `[0, max_offset)`, keyed by feature id so offsets survive data refreshes.
    Random {
        #[serde(default)]
        seed: u64,
        #[serde(default = "default_random_max")]
        max_offset: f64,
    },
    /// A numeric style expression, clamped to `[0, max_offset]`.
    Expression {
        expression: serde_json::Value,
        #[serde(default = "default_expression_max")]
        max_offset: f64,
    },
}

fn default_random_max() -> f64 {
    1.0
}

fn default_expression_max() -> f64 {
    10.0
}

/// Computes offsets for a feature batch. Output depends only on `(features, config)`.
#[derive(Debug, Default)]
pub struct TimeOffsetCalculator {
    evaluator: ExpressionEvaluator,
}

impl TimeOffsetCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offsets in seconds, indexed by feature position.
    ///
    /// `id_property` selects the property used as feature identity for the `random` mode.
    pub fn calculate_offsets(
        &mut self,
        features: &[Feature],
        config: &TimingConfig,
        id_property: Option<&str>,
    ) -> Result<Vec<f64>, ExprCompileError> {
        let offsets = match config {
            TimingConfig::None => vec![0.0; features.len()],
            TimingConfig::Stagger { step } => {
                let step = sanitize(*step);
                (0..features.len()).map(|i| i as f64 * step).collect()
            }
            TimingConfig::Random { seed, max_offset } => {
                let max_offset = sanitize(*max_offset);
                features
                    .iter()
                    .enumerate()
                    .map(|(i, f)| {
                        let id = f.resolve_id(i, id_property);
                        let mut rng = Rng64::new(stable_hash64(*seed, id.as_str()));
                        rng.next_f64_01() * max_offset
                    })
                    .collect()
            }
            TimingConfig::Expression {
                expression,
                max_offset,
            } => {
                let max_offset = sanitize(*max_offset);
                self.evaluator
                    .compile_json(OFFSET_CHANNEL, expression, OutputType::Number)?;
                features
                    .iter()
                    .map(|f| {
                        let v = self
                            .evaluator
                            .evaluate_number(OFFSET_CHANNEL, f, 0.0)
                            .unwrap_or(0.0);
                        if v.is_finite() {
                            v.clamp(0.0, max_offset)
                        } else {
                            0.0
                        }
                    })
                    .collect()
            }
        };
        Ok(offsets)
    }
}

// Negative or non-finite parameters collapse to zero.
fn sanitize(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/offsets.rs"]
mod tests;
