use super::*;
use crate::shader::uniforms::UniformValue;

#[test]
fn builtins_cover_every_class() {
    let reg = ShaderRegistry::with_builtins();
    assert_eq!(
        reg.names().collect::<Vec<_>>(),
        vec!["flow", "pulse", "ripple", "scanline"]
    );
    assert_eq!(reg.get("pulse").unwrap().class, GeometryClass::Point);
    assert_eq!(reg.get("flow").unwrap().class, GeometryClass::Line);
    assert_eq!(reg.get("ripple").unwrap().class, GeometryClass::Polygon);
    assert_eq!(reg.get("scanline").unwrap().class, GeometryClass::Viewport);
    assert!(reg.get("nope").is_none());
}

#[test]
fn builtin_sources_read_every_layout_attribute() {
    let reg = ShaderRegistry::with_builtins();
    for name in ["pulse", "flow", "ripple", "scanline"] {
        let def = reg.get(name).unwrap();
        for attr in def.class.layout().attributes {
            if attr.name == "a_isPlaying" || attr.name == "a_localTime" {
                continue;
            }
            assert!(
                def.vertex_source.contains(attr.name),
                "{name} does not declare {}",
                attr.name
            );
        }
        for attr in crate::buffer::layout::INTERACTION_LAYOUT.attributes {
            assert!(def.vertex_source.contains(attr.name));
        }
        assert!(def.fragment_source.contains("gl_FragColor"));
    }
}

#[test]
fn uniforms_use_literals_and_defaults() {
    let def = ShaderRegistry::with_builtins().get("flow").unwrap();
    let raw = serde_json::json!({ "speed": 2.5, "color": ["get", "c"] });
    let (config, errors) = ShaderConfig::parse(&def.schema, raw.as_object().unwrap());
    assert!(errors.is_empty());

    let u = def.uniforms(&config, 4.0, 0.016);
    assert_eq!(u.get("u_speed"), Some(&UniformValue::F32(2.5)));
    assert_eq!(u.get("u_width"), Some(&UniformValue::F32(4.0)));
    assert_eq!(u.get("u_time"), Some(&UniformValue::F32(4.0)));
    let Some(UniformValue::Vec4(c)) = u.get("u_color") else {
        panic!("u_color missing");
    };
    assert_eq!(c[0], 1.0, "expression field falls back to the schema default");
}

#[test]
fn register_replaces_by_name() {
    let mut reg = ShaderRegistry::with_builtins();
    let custom = ShaderDefinition::new(
        "pulse",
        GeometryClass::Point,
        ConfigSchema::default(),
        "void main() {}",
        "void main() {}",
        |_, _, _| Uniforms::new(),
    );
    assert!(reg.register(custom).is_some());
    assert_eq!(reg.len(), 4);
    assert!(reg.get("pulse").unwrap().schema.fields.is_empty());
}
