use serde::{Deserialize, Deserializer, Serialize};

use crate::foundation::core::FeatureId;

pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Geographic position in degrees. Extra ordinates (altitude, measures) are accepted and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl<'de> Deserialize<'de> for LonLat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Vec::<f64>::deserialize(deserializer)?;
        if v.len() < 2 {
            return Err(serde::de::Error::custom(
                "position must have at least [lon, lat]",
            ));
        }
        Ok(Self::new(v[0], v[1]))
    }
}

/// A polygon as GeoJSON rings: the first ring is the outer boundary, the rest are holes.
pub type Rings = Vec<Vec<LonLat>>;

/// Typed feature geometry (GeoJSON `type` + `coordinates`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(LonLat),
    MultiPoint(Vec<LonLat>),
    LineString(Vec<LonLat>),
    MultiLineString(Vec<Vec<LonLat>>),
    Polygon(Rings),
    MultiPolygon(Vec<Rings>),
}

impl Geometry {
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Point(_) | Self::MultiPoint(_) => "point",
            Self::LineString(_) | Self::MultiLineString(_) => "line",
            Self::Polygon(_) | Self::MultiPolygon(_) => "polygon",
        }
    }
}

/// One geometry + property-bag record from the backing data source.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Feature {
    /// Explicit identity, if the source provided one.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: Properties::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<serde_json::Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// Identity lookup order: `id_property` in the property bag, then the explicit id, then the
    /// feature's position in its collection.
    pub fn resolve_id(&self, index: usize, id_property: Option<&str>) -> FeatureId {
        id_property
            .and_then(|key| self.properties.get(key))
            .and_then(FeatureId::from_json)
            .or_else(|| self.id.as_ref().and_then(FeatureId::from_json))
            .unwrap_or_else(|| FeatureId::positional(index))
    }
}

/// Ordered feature collection as delivered by the backing data source.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_json_str(s: &str) -> crate::FxResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Properties>::deserialize(deserializer)?.unwrap_or_default())
}
