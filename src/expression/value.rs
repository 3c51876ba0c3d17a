use std::fmt;

use crate::foundation::color::Color;

/// Output domain a compiled expression is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Number,
    Color,
}

impl OutputType {
    /// Value substituted when a feature's data does not fit the output domain.
    pub fn neutral(self) -> OutputValue {
        match self {
            Self::Number => OutputValue::Number(0.0),
            Self::Color => OutputValue::Color(Color::TRANSPARENT),
        }
    }

    /// Coerce a JSON value into this domain. Numbers must be finite; colors use every
    /// representation [`Color`] accepts.
    pub fn coerce(self, v: &serde_json::Value) -> Option<OutputValue> {
        match self {
            Self::Number => v
                .as_f64()
                .filter(|x| x.is_finite())
                .map(OutputValue::Number),
            Self::Color => Color::from_json(v).map(OutputValue::Color),
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => f.write_str("number"),
            Self::Color => f.write_str("color"),
        }
    }
}

/// A typed evaluation result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputValue {
    Number(f64),
    Color(Color),
}

impl OutputValue {
    pub fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(v),
            Self::Color(_) => None,
        }
    }

    pub fn as_color(self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(c),
            Self::Number(_) => None,
        }
    }

    pub(crate) fn lerp(a: Self, b: Self, t: f64) -> Self {
        match (a, b) {
            (Self::Number(x), Self::Number(y)) => {
                Self::Number(crate::foundation::math::lerp(x, y, t))
            }
            (Self::Color(x), Self::Color(y)) => Self::Color(Color::lerp(x, y, t)),
            // Both sides are compiled against the same output type.
            (a, _) => a,
        }
    }
}
