//! Fixed per-class vertex layouts shared by the builder and the rendering program.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Geometry family a layer draws. Each family has exactly one vertex layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryClass {
    Point,
    Line,
    Polygon,
    Viewport,
}

impl GeometryClass {
    pub fn layout(self) -> &'static VertexLayout {
        match self {
            Self::Point => &POINT_LAYOUT,
            Self::Line => &LINE_LAYOUT,
            Self::Polygon => &POLYGON_LAYOUT,
            Self::Viewport => &VIEWPORT_LAYOUT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Polygon => "polygon",
            Self::Viewport => "viewport",
        }
    }
}

impl fmt::Display for GeometryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named vertex attribute. Offsets and sizes are in `f32` units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
}

impl Attribute {
    pub const fn byte_offset(&self) -> usize {
        self.offset * size_of::<f32>()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: usize,
    pub attributes: &'static [Attribute],
}

impl VertexLayout {
    pub const fn stride_bytes(&self) -> usize {
        self.stride * size_of::<f32>()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Floats written by a geometry strategy before the per-feature tail.
    pub const fn shape_len(&self) -> usize {
        self.stride - FEATURE_TAIL_LEN
    }
}

/// `featureIndex, timeOffset, color(4), intensity, isPlaying, localTime`.
pub const FEATURE_TAIL_LEN: usize = 9;

const fn attr(name: &'static str, offset: usize, size: usize) -> Attribute {
    Attribute { name, offset, size }
}

macro_rules! with_feature_tail {
    ($shape:expr; $($a:expr),* $(,)?) => {
        &[
            $($a,)*
            attr("a_featureIndex", $shape, 1),
            attr("a_timeOffset", $shape + 1, 1),
            attr("a_color", $shape + 2, 4),
            attr("a_intensity", $shape + 6, 1),
            attr("a_isPlaying", $shape + 7, 1),
            attr("a_localTime", $shape + 8, 1),
        ]
    };
}

pub static POINT_LAYOUT: VertexLayout = VertexLayout {
    stride: 13,
    attributes: with_feature_tail!(4;
        attr("a_position", 0, 2),
        attr("a_corner", 2, 2),
    ),
};

pub static LINE_LAYOUT: VertexLayout = VertexLayout {
    stride: 17,
    attributes: with_feature_tail!(8;
        attr("a_start", 0, 2),
        attr("a_end", 2, 2),
        attr("a_corner", 4, 2),
        attr("a_progress", 6, 1),
        attr("a_lineLength", 7, 1),
    ),
};

pub static POLYGON_LAYOUT: VertexLayout = VertexLayout {
    stride: 15,
    attributes: with_feature_tail!(6;
        attr("a_position", 0, 2),
        attr("a_uv", 2, 2),
        attr("a_centroid", 4, 2),
    ),
};

pub static VIEWPORT_LAYOUT: VertexLayout = VertexLayout {
    stride: 13,
    attributes: with_feature_tail!(4;
        attr("a_position", 0, 2),
        attr("a_uv", 2, 2),
    ),
};

/// Separate buffer re-uploaded when play state changes without a rebuild.
pub static INTERACTION_LAYOUT: VertexLayout = VertexLayout {
    stride: crate::state::manager::INTERACTION_STRIDE,
    attributes: &[
        attr("a_isPlayingLive", 0, 1),
        attr("a_localTimeLive", 1, 1),
        attr("a_phaseOffset", 2, 1),
    ],
};

#[cfg(test)]
#[path = "../../tests/unit/buffer/layout.rs"]
mod tests;
