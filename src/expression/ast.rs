use serde_json::Value;

use crate::expression::error::ExprCompileError;

/// Operator names recognized at the head of an expression array.
pub const OPERATORS: &[&str] = &["get", "zoom", "literal", "match", "interpolate"];

/// Declarative per-feature style expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Property lookup in the feature's property bag.
    Get(String),
    /// Current map zoom.
    Zoom,
    /// First case whose labels contain the input wins; otherwise `default`.
    Match {
        input: Box<Expr>,
        cases: Vec<MatchCase>,
        default: Box<Expr>,
    },
    /// Piecewise-linear interpolation over ascending stops.
    Interpolate {
        input: Box<Expr>,
        stops: Vec<(f64, Expr)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    pub labels: Vec<MatchLabel>,
    pub output: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchLabel {
    Str(String),
    Number(f64),
    Bool(bool),
}

impl MatchLabel {
    fn from_json(v: &Value) -> Result<Vec<Self>, ExprCompileError> {
        match v {
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| Self::scalar(item).ok_or(ExprCompileError::InvalidMatchLabel))
                .collect(),
            other => Self::scalar(other)
                .map(|l| vec![l])
                .ok_or(ExprCompileError::InvalidMatchLabel),
        }
    }

    fn scalar(v: &Value) -> Option<Self> {
        match v {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::Bool(b) => Some(Self::Bool(*b)),
            _ => None,
        }
    }
}

/// Returns `true` when `v` is structurally an expression: an array whose head is a recognized
/// operator name.
pub fn is_expression(v: &Value) -> bool {
    matches!(
        v.as_array().and_then(|a| a.first()).and_then(Value::as_str),
        Some(op) if OPERATORS.contains(&op)
    )
}

impl Expr {
    pub fn literal(v: impl Into<Value>) -> Self {
        Self::Literal(v.into())
    }

    pub fn get(property: impl Into<String>) -> Self {
        Self::Get(property.into())
    }

    /// Whether evaluation depends on the map zoom anywhere in the tree.
    pub fn reads_zoom(&self) -> bool {
        match self {
            Self::Zoom => true,
            Self::Literal(_) | Self::Get(_) => false,
            Self::Match {
                input,
                cases,
                default,
            } => {
                input.reads_zoom()
                    || default.reads_zoom()
                    || cases.iter().any(|c| c.output.reads_zoom())
            }
            Self::Interpolate { input, stops } => {
                input.reads_zoom() || stops.iter().any(|(_, out)| out.reads_zoom())
            }
        }
    }

    /// Parse the array syntax (`["get", "kind"]`, `["match", ...]`, ...).
    ///
    /// Any non-array value is a literal, as is an array whose head is not a string (e.g. an
    /// `[r, g, b, a]` color). An array headed by an unrecognized string is an error.
    pub fn from_json(v: &Value) -> Result<Self, ExprCompileError> {
        let Value::Array(items) = v else {
            return Ok(Self::Literal(v.clone()));
        };
        let Some(head) = items.first() else {
            return Err(ExprCompileError::Empty);
        };
        let Some(op) = head.as_str() else {
            return Ok(Self::Literal(v.clone()));
        };
        let args = &items[1..];

        match op {
            "get" => match args {
                [Value::String(name)] => Ok(Self::Get(name.clone())),
                [_] => Err(ExprCompileError::InvalidPropertyName),
                _ => Err(ExprCompileError::Arity {
                    op: "get",
                    expected: "1",
                    got: args.len(),
                }),
            },
            "zoom" => {
                if args.is_empty() {
                    Ok(Self::Zoom)
                } else {
                    Err(ExprCompileError::Arity {
                        op: "zoom",
                        expected: "0",
                        got: args.len(),
                    })
                }
            }
            "literal" => match args {
                [value] => Ok(Self::Literal(value.clone())),
                _ => Err(ExprCompileError::Arity {
                    op: "literal",
                    expected: "1",
                    got: args.len(),
                }),
            },
            "match" => parse_match(args),
            "interpolate" => parse_interpolate(args),
            other => Err(ExprCompileError::UnknownOperator(other.to_owned())),
        }
    }
}

// ["match", input, label1, out1, ..., default]
fn parse_match(args: &[Value]) -> Result<Expr, ExprCompileError> {
    if args.len() < 4 || args.len() % 2 != 0 {
        return Err(ExprCompileError::Arity {
            op: "match",
            expected: "an input, label/output pairs and a default",
            got: args.len(),
        });
    }
    let input = Expr::from_json(&args[0])?;
    let (pairs, default) = args[1..].split_at(args.len() - 2);
    let cases = pairs
        .chunks_exact(2)
        .map(|pair| {
            Ok(MatchCase {
                labels: MatchLabel::from_json(&pair[0])?,
                output: Expr::from_json(&pair[1])?,
            })
        })
        .collect::<Result<Vec<_>, ExprCompileError>>()?;

    Ok(Expr::Match {
        input: Box::new(input),
        cases,
        default: Box::new(Expr::from_json(&default[0])?),
    })
}

// ["interpolate", ["linear"], input, stop1, out1, ...]; the type clause may be omitted.
fn parse_interpolate(args: &[Value]) -> Result<Expr, ExprCompileError> {
    let rest = match args.first() {
        Some(Value::Array(kind)) if kind.first().and_then(Value::as_str) == Some("linear") => {
            &args[1..]
        }
        Some(Value::Array(kind))
            if kind
                .first()
                .and_then(Value::as_str)
                .is_some_and(|k| !OPERATORS.contains(&k)) =>
        {
            return Err(ExprCompileError::UnsupportedInterpolation(
                Value::Array(kind.clone()).to_string(),
            ));
        }
        _ => args,
    };

    if rest.len() < 3 || rest.len() % 2 == 0 {
        return Err(ExprCompileError::Arity {
            op: "interpolate",
            expected: "an input and at least one stop/output pair",
            got: args.len(),
        });
    }

    let input = Expr::from_json(&rest[0])?;
    let mut stops: Vec<(f64, Expr)> = Vec::with_capacity((rest.len() - 1) / 2);
    for pair in rest[1..].chunks_exact(2) {
        let stop = pair[0]
            .as_f64()
            .filter(|s| s.is_finite())
            .ok_or(ExprCompileError::InvalidStops)?;
        if let Some((prev, _)) = stops.last()
            && stop <= *prev
        {
            return Err(ExprCompileError::InvalidStops);
        }
        stops.push((stop, Expr::from_json(&pair[1])?));
    }

    Ok(Expr::Interpolate {
        input: Box::new(input),
        stops,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/expression/ast.rs"]
mod tests;
