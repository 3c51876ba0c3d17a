use super::*;

fn assert_packed(layout: &VertexLayout) {
    let mut next = 0;
    for a in layout.attributes {
        assert_eq!(a.offset, next, "{} is not packed", a.name);
        next += a.size;
    }
    assert_eq!(next, layout.stride);
}

#[test]
fn strides_match_program_contract() {
    assert_eq!(GeometryClass::Point.layout().stride, 13);
    assert_eq!(GeometryClass::Line.layout().stride, 17);
    assert_eq!(GeometryClass::Polygon.layout().stride, 15);
    assert_eq!(GeometryClass::Viewport.layout().stride, 13);
    assert_eq!(INTERACTION_LAYOUT.stride, 3);
}

#[test]
fn attributes_are_contiguous() {
    for class in [
        GeometryClass::Point,
        GeometryClass::Line,
        GeometryClass::Polygon,
        GeometryClass::Viewport,
    ] {
        assert_packed(class.layout());
    }
    assert_packed(&INTERACTION_LAYOUT);
}

#[test]
fn feature_tail_sits_after_shape_fields() {
    let line = GeometryClass::Line.layout();
    assert_eq!(line.shape_len(), 8);
    let color = line.attribute("a_color").unwrap();
    assert_eq!(color.offset, 10);
    assert_eq!(color.byte_offset(), 40);
    assert_eq!(line.stride_bytes(), 68);
    assert!(line.attribute("a_uv").is_none());
}
