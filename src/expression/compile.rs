use std::borrow::Cow;

use serde_json::Value;

use crate::expression::ast::{Expr, MatchCase, MatchLabel};
use crate::expression::error::ExprCompileError;
use crate::expression::value::{OutputType, OutputValue};
use crate::feature::model::Properties;

/// Inputs visible to a compiled expression.
#[derive(Debug, Clone, Copy)]
pub struct EvalCtx<'a> {
    pub properties: &'a Properties,
    pub zoom: f64,
}

/// Untyped intermediate value used for `match` inputs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Str(Cow<'a, str>),
}

impl<'a> Scalar<'a> {
    fn from_json_borrowed(v: &'a Value) -> Self {
        match v {
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Value::String(s) => Self::Str(Cow::Borrowed(s.as_str())),
            _ => Self::Null,
        }
    }

    fn into_owned(self) -> Scalar<'static> {
        match self {
            Self::Null => Scalar::Null,
            Self::Bool(b) => Scalar::Bool(b),
            Self::Number(n) => Scalar::Number(n),
            Self::Str(s) => Scalar::Str(Cow::Owned(s.into_owned())),
        }
    }
}

impl MatchLabel {
    fn matches(&self, s: &Scalar<'_>) -> bool {
        match (self, s) {
            (Self::Str(a), Scalar::Str(b)) => a.as_str() == b.as_ref(),
            (Self::Number(a), Scalar::Number(b)) => a == b,
            (Self::Bool(a), Scalar::Bool(b)) => a == b,
            _ => false,
        }
    }
}

pub(crate) type TypedFn = Box<dyn Fn(&EvalCtx<'_>) -> OutputValue + Send + Sync>;
pub(crate) type ScalarFn = Box<dyn for<'a> Fn(&EvalCtx<'a>) -> Scalar<'a> + Send + Sync>;

// Pins the higher-ranked signature so closures may return data borrowed from the properties.
fn scalar_fn<F>(f: F) -> ScalarFn
where
    F: for<'a> Fn(&EvalCtx<'a>) -> Scalar<'a> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Compile `expr` into a closure producing `ty`. Literals are coerced here, so an un-coercible
/// literal anywhere in the tree fails compilation instead of evaluation.
pub(crate) fn compile_typed(expr: &Expr, ty: OutputType) -> Result<TypedFn, ExprCompileError> {
    match expr {
        Expr::Literal(v) => {
            let value = ty
                .coerce(v)
                .ok_or_else(|| ExprCompileError::UncoercibleLiteral {
                    value: v.to_string(),
                    expected: ty,
                })?;
            Ok(Box::new(move |_: &EvalCtx<'_>| value))
        }
        Expr::Get(name) => {
            let name = name.clone();
            Ok(Box::new(move |ctx: &EvalCtx<'_>| {
                ctx.properties
                    .get(name.as_str())
                    .and_then(|v| ty.coerce(v))
                    .unwrap_or_else(|| ty.neutral())
            }))
        }
        Expr::Zoom => match ty {
            OutputType::Number => Ok(Box::new(|ctx: &EvalCtx<'_>| OutputValue::Number(ctx.zoom))),
            OutputType::Color => Err(ExprCompileError::TypeMismatch {
                op: "zoom",
                expected: ty,
            }),
        },
        Expr::Match {
            input,
            cases,
            default,
        } => {
            let input = compile_scalar(input)?;
            let cases = compile_cases(cases, |e| compile_typed(e, ty))?;
            let default = compile_typed(default, ty)?;
            Ok(Box::new(move |ctx: &EvalCtx<'_>| {
                let key = input(ctx);
                for (labels, out) in &cases {
                    if labels.iter().any(|l| l.matches(&key)) {
                        return out(ctx);
                    }
                }
                default(ctx)
            }))
        }
        Expr::Interpolate { input, stops } => {
            let input = compile_scalar(input)?;
            let stops = stops
                .iter()
                .map(|(stop, out)| Ok((*stop, compile_typed(out, ty)?)))
                .collect::<Result<Vec<_>, ExprCompileError>>()?;
            Ok(Box::new(move |ctx: &EvalCtx<'_>| match input(ctx) {
                Scalar::Number(x) if x.is_finite() => interpolate(&stops, x, ctx),
                _ => ty.neutral(),
            }))
        }
    }
}

fn compile_cases<T>(
    cases: &[MatchCase],
    mut compile_out: impl FnMut(&Expr) -> Result<T, ExprCompileError>,
) -> Result<Vec<(Vec<MatchLabel>, T)>, ExprCompileError> {
    cases
        .iter()
        .map(|c| Ok((c.labels.clone(), compile_out(&c.output)?)))
        .collect()
}

fn compile_scalar(expr: &Expr) -> Result<ScalarFn, ExprCompileError> {
    match expr {
        Expr::Literal(v) => {
            let value = Scalar::from_json_borrowed(v).into_owned();
            Ok(scalar_fn(move |_| value.clone()))
        }
        Expr::Get(name) => {
            let name = name.clone();
            Ok(scalar_fn(move |ctx| {
                ctx.properties
                    .get(name.as_str())
                    .map_or(Scalar::Null, Scalar::from_json_borrowed)
            }))
        }
        Expr::Zoom => Ok(scalar_fn(|ctx| Scalar::Number(ctx.zoom))),
        Expr::Match {
            input,
            cases,
            default,
        } => {
            let input = compile_scalar(input)?;
            let cases = compile_cases(cases, compile_scalar)?;
            let default = compile_scalar(default)?;
            Ok(scalar_fn(move |ctx| {
                let key = input(ctx);
                for (labels, out) in &cases {
                    if labels.iter().any(|l| l.matches(&key)) {
                        return out(ctx);
                    }
                }
                default(ctx)
            }))
        }
        Expr::Interpolate { .. } => {
            let numeric = compile_typed(expr, OutputType::Number)?;
            Ok(scalar_fn(move |ctx| match numeric(ctx) {
                OutputValue::Number(n) => Scalar::Number(n),
                OutputValue::Color(_) => Scalar::Null,
            }))
        }
    }
}

fn interpolate(stops: &[(f64, TypedFn)], x: f64, ctx: &EvalCtx<'_>) -> OutputValue {
    let idx = stops.partition_point(|(s, _)| *s <= x);
    if idx == 0 {
        return (stops[0].1)(ctx);
    }
    if idx >= stops.len() {
        return (stops[stops.len() - 1].1)(ctx);
    }
    let (s0, f0) = &stops[idx - 1];
    let (s1, f1) = &stops[idx];
    let t = (x - s0) / (s1 - s0);
    OutputValue::lerp(f0(ctx), f1(ctx), t)
}

#[cfg(test)]
#[path = "../../tests/unit/expression/compile.rs"]
mod tests;
