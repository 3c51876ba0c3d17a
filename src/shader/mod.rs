pub mod builtins;
pub mod config;
pub mod uniforms;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::buffer::layout::GeometryClass;
use crate::shader::config::{ConfigSchema, ShaderConfig};
use crate::shader::uniforms::Uniforms;

/// `(config, time, delta_time) -> uniforms`. Must be pure.
pub type UniformFn = Arc<dyn Fn(&ShaderConfig, f64, f64) -> Uniforms + Send + Sync>;

/// A named effect: which geometry it draws, what it accepts, and how it shades.
#[derive(Clone)]
pub struct ShaderDefinition {
    pub name: String,
    pub class: GeometryClass,
    pub schema: ConfigSchema,
    pub vertex_source: String,
    pub fragment_source: String,
    pub uniforms: UniformFn,
}

impl ShaderDefinition {
    pub fn new(
        name: &str,
        class: GeometryClass,
        schema: ConfigSchema,
        vertex_source: &str,
        fragment_source: &str,
        uniforms: impl Fn(&ShaderConfig, f64, f64) -> Uniforms + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_owned(),
            class,
            schema,
            vertex_source: vertex_source.to_owned(),
            fragment_source: fragment_source.to_owned(),
            uniforms: Arc::new(uniforms),
        }
    }

    pub fn default_config(&self) -> ShaderConfig {
        ShaderConfig::defaults(&self.schema)
    }

    pub fn uniforms(&self, config: &ShaderConfig, time: f64, delta_time: f64) -> Uniforms {
        (self.uniforms)(config, time, delta_time)
    }
}

impl fmt::Debug for ShaderDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderDefinition")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("fields", &self.schema.fields.len())
            .finish_non_exhaustive()
    }
}

/// Shader definitions by name. Passed explicitly to each layer.
#[derive(Clone, Debug, Default)]
pub struct ShaderRegistry {
    defs: BTreeMap<String, Arc<ShaderDefinition>>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `pulse`, `flow`, `ripple` and `scanline`.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        for def in builtins::all() {
            reg.register(def);
        }
        reg
    }

    /// Insert or replace a definition, returning the one it replaced.
    pub fn register(&mut self, def: ShaderDefinition) -> Option<Arc<ShaderDefinition>> {
        self.defs.insert(def.name.clone(), Arc::new(def))
    }

    pub fn get(&self, name: &str) -> Option<Arc<ShaderDefinition>> {
        self.defs.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/shader/registry.rs"]
mod tests;
