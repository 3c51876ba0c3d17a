pub mod builder;
pub mod fingerprint;
pub mod layout;
pub mod line;
pub mod point;
pub mod polygon;
pub mod strategy;
pub mod viewport;

pub use line::LineStrategy;
pub use point::PointStrategy;
pub use polygon::PolygonStrategy;
pub use viewport::ViewportStrategy;
