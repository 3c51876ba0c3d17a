use std::collections::BTreeMap;

use serde::Serialize;

use crate::foundation::color::Color;

/// A static uniform value. Per-feature data never travels through uniforms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum UniformValue {
    F32(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for UniformValue {
    fn from(v: f64) -> Self {
        Self::F32(v as f32)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<Color> for UniformValue {
    fn from(c: Color) -> Self {
        Self::Vec4(c.to_f32_array())
    }
}

impl From<[f32; 16]> for UniformValue {
    fn from(m: [f32; 16]) -> Self {
        Self::Mat4(m)
    }
}

/// Named uniforms in a stable order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Uniforms(BTreeMap<String, UniformValue>);

impl Uniforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> &mut Self {
        self.0.insert(name.to_owned(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
