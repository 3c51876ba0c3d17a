//! Built-in effects, one per geometry class.

use serde_json::json;

use crate::buffer::layout::GeometryClass;
use crate::shader::ShaderDefinition;
use crate::shader::config::{ConfigField, ConfigSchema, FieldKind, ShaderConfig};
use crate::shader::uniforms::Uniforms;

/// Attributes and helpers every built-in vertex program shares.
macro_rules! vertex_prelude {
    () => {
        "precision highp float;\n\
         uniform mat4 u_matrix;\n\
         uniform vec2 u_resolution;\n\
         uniform float u_time;\n\
         attribute float a_featureIndex;\n\
         attribute float a_timeOffset;\n\
         attribute vec4 a_color;\n\
         attribute float a_intensity;\n\
         attribute float a_isPlayingLive;\n\
         attribute float a_localTimeLive;\n\
         attribute float a_phaseOffset;\n\
         varying vec4 v_color;\n\
         varying float v_intensity;\n\
         varying float v_time;\n\
         float effectiveTime() {\n\
             return a_isPlayingLive > 0.5 ? u_time + a_phaseOffset : a_localTimeLive;\n\
         }\n\
         void passFeature() {\n\
             v_color = a_color;\n\
             v_intensity = a_intensity;\n\
             v_time = effectiveTime();\n\
         }\n"
    };
}

macro_rules! fragment_prelude {
    () => {
        "precision highp float;\n\
         uniform float u_speed;\n\
         varying vec4 v_color;\n\
         varying float v_intensity;\n\
         varying float v_time;\n"
    };
}

const PULSE_VERTEX: &str = concat!(
    vertex_prelude!(),
    "uniform float u_radius;\n\
     attribute vec2 a_position;\n\
     attribute vec2 a_corner;\n\
     varying vec2 v_corner;\n\
     void main() {\n\
         passFeature();\n\
         v_corner = a_corner;\n\
         vec4 center = u_matrix * vec4(a_position, 0.0, 1.0);\n\
         center.xy += a_corner * u_radius * 2.0 / u_resolution * center.w;\n\
         gl_Position = center;\n\
     }\n"
);

const PULSE_FRAGMENT: &str = concat!(
    fragment_prelude!(),
    "uniform float u_rings;\n\
     varying vec2 v_corner;\n\
     void main() {\n\
         float d = length(v_corner);\n\
         if (d > 1.0) discard;\n\
         float phase = fract(v_time * u_speed);\n\
         float ring = fract(d * u_rings - phase);\n\
         float a = smoothstep(0.0, 0.2, ring) * (1.0 - smoothstep(0.2, 0.4, ring)) * (1.0 - d);\n\
         gl_FragColor = vec4(v_color.rgb, v_color.a * a * v_intensity);\n\
     }\n"
);

const FLOW_VERTEX: &str = concat!(
    vertex_prelude!(),
    "uniform float u_width;\n\
     attribute vec2 a_start;\n\
     attribute vec2 a_end;\n\
     attribute vec2 a_corner;\n\
     attribute float a_progress;\n\
     attribute float a_lineLength;\n\
     varying float v_progress;\n\
     varying float v_side;\n\
     varying float v_lineLength;\n\
     void main() {\n\
         passFeature();\n\
         vec4 s = u_matrix * vec4(a_start, 0.0, 1.0);\n\
         vec4 e = u_matrix * vec4(a_end, 0.0, 1.0);\n\
         vec4 p = mix(s, e, a_corner.x);\n\
         vec2 dir = (e.xy / e.w - s.xy / s.w) * u_resolution;\n\
         vec2 normal = normalize(vec2(-dir.y, dir.x) + vec2(1e-6, 0.0));\n\
         p.xy += normal * a_corner.y * u_width / u_resolution * p.w;\n\
         v_progress = a_progress;\n\
         v_side = a_corner.y;\n\
         v_lineLength = a_lineLength;\n\
         gl_Position = p;\n\
     }\n"
);

const FLOW_FRAGMENT: &str = concat!(
    fragment_prelude!(),
    "uniform float u_dashLength;\n\
     uniform float u_trailLength;\n\
     varying float v_progress;\n\
     varying float v_side;\n\
     varying float v_lineLength;\n\
     void main() {\n\
         float head = fract(v_time * u_speed);\n\
         float behind = fract(head - v_progress);\n\
         float trail = 1.0 - smoothstep(0.0, u_trailLength, behind);\n\
         float dash = step(0.5, fract(v_progress / max(u_dashLength, 1e-4)));\n\
         float edge = 1.0 - smoothstep(0.6, 1.0, abs(v_side));\n\
         float a = max(trail, 0.25 * dash) * edge;\n\
         gl_FragColor = vec4(v_color.rgb, v_color.a * a * v_intensity);\n\
     }\n"
);

const RIPPLE_VERTEX: &str = concat!(
    vertex_prelude!(),
    "attribute vec2 a_position;\n\
     attribute vec2 a_uv;\n\
     attribute vec2 a_centroid;\n\
     varying vec2 v_uv;\n\
     varying vec2 v_offset;\n\
     void main() {\n\
         passFeature();\n\
         v_uv = a_uv;\n\
         v_offset = a_position - a_centroid;\n\
         gl_Position = u_matrix * vec4(a_position, 0.0, 1.0);\n\
     }\n"
);

const RIPPLE_FRAGMENT: &str = concat!(
    fragment_prelude!(),
    "uniform float u_frequency;\n\
     uniform float u_fade;\n\
     varying vec2 v_uv;\n\
     varying vec2 v_offset;\n\
     void main() {\n\
         float d = length(v_uv - 0.5) * 2.0;\n\
         float wave = 0.5 + 0.5 * sin((d * u_frequency - v_time * u_speed) * 6.2831853);\n\
         float a = mix(1.0, wave, u_fade);\n\
         gl_FragColor = vec4(v_color.rgb, v_color.a * a * v_intensity);\n\
     }\n"
);

const SCANLINE_VERTEX: &str = concat!(
    vertex_prelude!(),
    "attribute vec2 a_position;\n\
     attribute vec2 a_uv;\n\
     varying vec2 v_uv;\n\
     void main() {\n\
         passFeature();\n\
         v_uv = a_uv;\n\
         gl_Position = vec4(a_position, 0.0, 1.0);\n\
     }\n"
);

const SCANLINE_FRAGMENT: &str = concat!(
    fragment_prelude!(),
    "uniform float u_lineCount;\n\
     uniform float u_opacity;\n\
     varying vec2 v_uv;\n\
     void main() {\n\
         float lines = 0.5 + 0.5 * sin((v_uv.y * u_lineCount + v_time * u_speed) * 6.2831853);\n\
         float sweep = 1.0 - smoothstep(0.0, 0.08, abs(fract(v_time * u_speed * 0.1) - v_uv.y));\n\
         float a = u_opacity * max(lines * 0.5, sweep);\n\
         gl_FragColor = vec4(v_color.rgb, v_color.a * a * v_intensity);\n\
     }\n"
);

fn common_fields(color: &str) -> Vec<ConfigField> {
    vec![
        ConfigField::new("color", FieldKind::Color, json!(color)).data_driven(),
        ConfigField::new("intensity", FieldKind::Number, json!(1.0)).data_driven(),
        ConfigField::new("speed", FieldKind::Number, json!(1.0)),
    ]
}

fn common_uniforms(config: &ShaderConfig, time: f64, delta_time: f64) -> Uniforms {
    let mut u = Uniforms::new();
    u.set("u_time", time)
        .set("u_deltaTime", delta_time)
        .set("u_speed", config.number("speed"))
        .set("u_color", config.color("color"))
        .set("u_intensity", config.number("intensity"));
    u
}

pub fn pulse() -> ShaderDefinition {
    let mut fields = common_fields("#00d1ff");
    fields.push(ConfigField::new("radius", FieldKind::Number, json!(12.0)));
    fields.push(ConfigField::new("rings", FieldKind::Number, json!(3.0)));
    ShaderDefinition::new(
        "pulse",
        GeometryClass::Point,
        ConfigSchema::new(fields),
        PULSE_VERTEX,
        PULSE_FRAGMENT,
        |config, time, dt| {
            let mut u = common_uniforms(config, time, dt);
            u.set("u_radius", config.number("radius"))
                .set("u_rings", config.number("rings"));
            u
        },
    )
}

pub fn flow() -> ShaderDefinition {
    let mut fields = common_fields("#ffb000");
    fields.push(ConfigField::new("width", FieldKind::Number, json!(4.0)));
    fields.push(ConfigField::new("dashLength", FieldKind::Number, json!(0.05)));
    fields.push(ConfigField::new("trailLength", FieldKind::Number, json!(0.3)));
    ShaderDefinition::new(
        "flow",
        GeometryClass::Line,
        ConfigSchema::new(fields),
        FLOW_VERTEX,
        FLOW_FRAGMENT,
        |config, time, dt| {
            let mut u = common_uniforms(config, time, dt);
            u.set("u_width", config.number("width"))
                .set("u_dashLength", config.number("dashLength"))
                .set("u_trailLength", config.number("trailLength"));
            u
        },
    )
}

pub fn ripple() -> ShaderDefinition {
    let mut fields = common_fields("#7cff6b");
    fields.push(ConfigField::new("frequency", FieldKind::Number, json!(4.0)));
    fields.push(ConfigField::new("fade", FieldKind::Number, json!(0.5)));
    ShaderDefinition::new(
        "ripple",
        GeometryClass::Polygon,
        ConfigSchema::new(fields),
        RIPPLE_VERTEX,
        RIPPLE_FRAGMENT,
        |config, time, dt| {
            let mut u = common_uniforms(config, time, dt);
            u.set("u_frequency", config.number("frequency"))
                .set("u_fade", config.number("fade").clamp(0.0, 1.0));
            u
        },
    )
}

pub fn scanline() -> ShaderDefinition {
    let mut fields = common_fields("#ffffff");
    fields.push(ConfigField::new("lineCount", FieldKind::Number, json!(40.0)));
    fields.push(ConfigField::new("opacity", FieldKind::Number, json!(0.3)));
    ShaderDefinition::new(
        "scanline",
        GeometryClass::Viewport,
        ConfigSchema::new(fields),
        SCANLINE_VERTEX,
        SCANLINE_FRAGMENT,
        |config, time, dt| {
            let mut u = common_uniforms(config, time, dt);
            u.set("u_lineCount", config.number("lineCount"))
                .set("u_opacity", config.number("opacity").clamp(0.0, 1.0));
            u
        },
    )
}

pub fn all() -> [ShaderDefinition; 4] {
    [pulse(), flow(), ripple(), scanline()]
}
