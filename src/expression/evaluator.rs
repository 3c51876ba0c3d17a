use std::collections::HashMap;
use std::fmt;

use crate::expression::ast::Expr;
use crate::expression::compile::{EvalCtx, TypedFn, compile_typed};
use crate::expression::error::ExprCompileError;
use crate::expression::value::{OutputType, OutputValue};
use crate::feature::model::Feature;
use crate::foundation::color::Color;

/// A typed closure bound to an output domain.
pub struct CompiledExpression {
    output: OutputType,
    reads_zoom: bool,
    eval: TypedFn,
}

impl CompiledExpression {
    pub fn compile(expr: &Expr, output: OutputType) -> Result<Self, ExprCompileError> {
        Ok(Self {
            output,
            reads_zoom: expr.reads_zoom(),
            eval: compile_typed(expr, output)?,
        })
    }

    pub fn output_type(&self) -> OutputType {
        self.output
    }

    pub fn reads_zoom(&self) -> bool {
        self.reads_zoom
    }

    pub fn evaluate(&self, feature: &Feature, zoom: f64) -> OutputValue {
        (self.eval)(&EvalCtx {
            properties: &feature.properties,
            zoom,
        })
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("output", &self.output)
            .field("reads_zoom", &self.reads_zoom)
            .finish_non_exhaustive()
    }
}

/// Per-channel store of compiled style expressions.
#[derive(Debug, Default)]
pub struct ExpressionEvaluator {
    channels: HashMap<String, CompiledExpression>,
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `expr` for `channel`, replacing any previous closure as a whole.
    ///
    /// On failure the channel is left uncompiled so callers fall back to their static default
    /// rather than a stale expression.
    pub fn compile(
        &mut self,
        channel: &str,
        expr: &Expr,
        output: OutputType,
    ) -> Result<(), ExprCompileError> {
        match CompiledExpression::compile(expr, output) {
            Ok(compiled) => {
                self.channels.insert(channel.to_owned(), compiled);
                Ok(())
            }
            Err(e) => {
                self.channels.remove(channel);
                Err(e)
            }
        }
    }

    /// Parse and compile the JSON array syntax in one step.
    pub fn compile_json(
        &mut self,
        channel: &str,
        expr: &serde_json::Value,
        output: OutputType,
    ) -> Result<(), ExprCompileError> {
        match Expr::from_json(expr) {
            Ok(e) => self.compile(channel, &e, output),
            Err(e) => {
                self.channels.remove(channel);
                Err(e)
            }
        }
    }

    /// `None` when `channel` was never compiled; the caller substitutes the schema default.
    pub fn evaluate(&self, channel: &str, feature: &Feature, zoom: f64) -> Option<OutputValue> {
        self.channels
            .get(channel)
            .map(|c| c.evaluate(feature, zoom))
    }

    pub fn evaluate_number(&self, channel: &str, feature: &Feature, zoom: f64) -> Option<f64> {
        self.evaluate(channel, feature, zoom)
            .and_then(OutputValue::as_number)
    }

    pub fn evaluate_color(&self, channel: &str, feature: &Feature, zoom: f64) -> Option<Color> {
        self.evaluate(channel, feature, zoom)
            .and_then(OutputValue::as_color)
    }

    pub fn has(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn output_type(&self, channel: &str) -> Option<OutputType> {
        self.channels.get(channel).map(CompiledExpression::output_type)
    }

    /// `true` when any compiled channel reads `["zoom"]`, so a zoom change alters its output.
    pub fn reads_zoom(&self) -> bool {
        self.channels.values().any(CompiledExpression::reads_zoom)
    }

    pub fn remove(&mut self, channel: &str) -> bool {
        self.channels.remove(channel).is_some()
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }

    /// Compiled channel names in sorted order.
    pub fn channels(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.channels.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/evaluator.rs"]
mod tests;
