//! Shader configuration: declared schemas and parsed per-layer values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expression::ast::{Expr, is_expression};
use crate::expression::error::ExprCompileError;
use crate::expression::value::OutputType;
use crate::foundation::color::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    Color,
    Bool,
}

impl FieldKind {
    /// Expression output domain, for kinds that can be data-driven.
    pub fn output_type(self) -> Option<OutputType> {
        match self {
            Self::Number => Some(OutputType::Number),
            Self::Color => Some(OutputType::Color),
            Self::Bool => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigField {
    pub name: String,
    pub kind: FieldKind,
    pub default: Value,
    /// Whether the field accepts a per-feature expression.
    pub data_driven: bool,
}

impl ConfigField {
    pub fn new(name: &str, kind: FieldKind, default: Value) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            default,
            data_driven: false,
        }
    }

    pub fn data_driven(mut self) -> Self {
        self.data_driven = true;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConfigSchema {
    pub fields: Vec<ConfigField>,
}

impl ConfigSchema {
    pub fn new(fields: Vec<ConfigField>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&ConfigField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Every field at its default.
    pub fn defaults(&self) -> serde_json::Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect()
    }
}

/// A configuration field decided once at parse time.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Literal(Value),
    Expression(Expr),
}

impl ConfigValue {
    /// An array whose head names a known operator is an expression; anything else is a literal.
    pub fn parse(v: &Value) -> Result<Self, ExprCompileError> {
        if is_expression(v) {
            Expr::from_json(v).map(Self::Expression)
        } else {
            Ok(Self::Literal(v.clone()))
        }
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(v) => Some(v),
            Self::Expression(_) => None,
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Expression(_))
    }
}

/// A field that could not be used as written. The field falls back to its schema default.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigFieldError {
    #[error("field \"{field}\": {source}")]
    Expression {
        field: String,
        source: ExprCompileError,
    },

    #[error("field \"{0}\" does not accept expressions")]
    NotDataDriven(String),
}

impl ConfigFieldError {
    pub fn field(&self) -> &str {
        match self {
            Self::Expression { field, .. } | Self::NotDataDriven(field) => field,
        }
    }
}

/// Parsed configuration for one layer, checked against a schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShaderConfig {
    schema: ConfigSchema,
    values: BTreeMap<String, ConfigValue>,
}

impl ShaderConfig {
    /// Parse `raw` over the schema defaults.
    ///
    /// Fields that fail to parse, and expressions on fields that are not data-driven, fall back
    /// to the schema default and are reported in the returned error list.
    pub fn parse(
        schema: &ConfigSchema,
        raw: &serde_json::Map<String, Value>,
    ) -> (Self, Vec<ConfigFieldError>) {
        let mut values = BTreeMap::new();
        let mut errors = Vec::new();
        for field in &schema.fields {
            let parsed = match raw.get(&field.name) {
                None => Ok(ConfigValue::Literal(field.default.clone())),
                Some(v) => ConfigValue::parse(v),
            };
            let value = match parsed {
                Ok(ConfigValue::Expression(_)) if !field.data_driven => {
                    errors.push(ConfigFieldError::NotDataDriven(field.name.clone()));
                    ConfigValue::Literal(field.default.clone())
                }
                Ok(v) => v,
                Err(source) => {
                    errors.push(ConfigFieldError::Expression {
                        field: field.name.clone(),
                        source,
                    });
                    ConfigValue::Literal(field.default.clone())
                }
            };
            values.insert(field.name.clone(), value);
        }
        for key in raw.keys().filter(|k| schema.field(k).is_none()) {
            tracing::debug!(field = %key, "ignoring config field not in schema");
        }
        (
            Self {
                schema: schema.clone(),
                values,
            },
            errors,
        )
    }

    pub fn defaults(schema: &ConfigSchema) -> Self {
        Self::parse(schema, &serde_json::Map::new()).0
    }

    pub fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.values.get(name)
    }

    /// Data-driven fields as `(name, expression, output type)`.
    pub fn expressions(&self) -> impl Iterator<Item = (&str, &Expr, OutputType)> {
        self.values.iter().filter_map(|(name, v)| {
            let ConfigValue::Expression(expr) = v else {
                return None;
            };
            let ty = self.schema.field(name)?.kind.output_type()?;
            Some((name.as_str(), expr, ty))
        })
    }

    /// The literal JSON for `name`, or the schema default when the field is an expression or
    /// absent.
    fn literal_or_default(&self, name: &str) -> Option<&Value> {
        match self.values.get(name) {
            Some(ConfigValue::Literal(v)) => Some(v),
            _ => self.schema.field(name).map(|f| &f.default),
        }
    }

    pub fn number(&self, name: &str) -> f64 {
        self.literal_or_default(name)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .or_else(|| self.schema.field(name).and_then(|f| f.default.as_f64()))
            .unwrap_or(0.0)
    }

    pub fn color(&self, name: &str) -> Color {
        self.literal_or_default(name)
            .and_then(Color::from_json)
            .or_else(|| self.schema.field(name).and_then(|f| Color::from_json(&f.default)))
            .unwrap_or(Color::TRANSPARENT)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.literal_or_default(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/shader/config.rs"]
mod tests;
