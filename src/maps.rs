//! Map catalog: the static table of selectable maps and their coordinate bounds.

use std::{borrow::Cow, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stroke width used when a map does not specify one.
pub const DEFAULT_OVERLAY_LINE_WIDTH: u32 = 5;

fn default_scale() -> f64 {
    1.0
}

/// One selectable map. `x_max`/`y_max` are the largest in-game coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub name: Cow<'static, str>,
    /// Image file name, resolved against the configured asset directory.
    pub image_source: Cow<'static, str>,
    pub x_max: u32,
    pub y_max: u32,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_line_width: Option<u32>,
}

impl MapDefinition {
    pub fn line_width(&self) -> u32 {
        self.overlay_line_width.unwrap_or(DEFAULT_OVERLAY_LINE_WIDTH)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        let invalid = |reason: &str| MapError::Invalid {
            name: self.name.to_string(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.x_max == 0 || self.y_max == 0 {
            return Err(invalid("coordinate bounds must be greater than zero"));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(invalid("scale must be a positive number"));
        }
        if self.overlay_line_width == Some(0) {
            return Err(invalid("overlay line width must be greater than zero"));
        }
        Ok(())
    }
}

const fn builtin(
    name: &'static str,
    image_source: &'static str,
    x_max: u32,
    y_max: u32,
    overlay_line_width: Option<u32>,
) -> MapDefinition {
    MapDefinition {
        name: Cow::Borrowed(name),
        image_source: Cow::Borrowed(image_source),
        x_max,
        y_max,
        scale: 1.0,
        overlay_line_width,
    }
}

pub static BUILTIN_MAPS: [MapDefinition; 10] = [
    builtin("宝象国", "baoxiangguo.png", 159, 119, None),
    builtin("建邺城", "jianyecheng.png", 287, 142, Some(8)),
    builtin("傲来国", "aolaiguo.png", 222, 150, Some(8)),
    builtin("大唐境外", "datangjingwai.png", 638, 118, Some(10)),
    builtin("江南野外", "jiangnanyewai.png", 159, 119, Some(10)),
    builtin("女儿村", "nvercun.png", 127, 143, Some(8)),
    builtin("五庄观", "wuzhuangguan.png", 99, 74, Some(10)),
    builtin("西梁女国", "xiliangnvguo.png", 163, 123, Some(10)),
    builtin("长寿村", "changshoucun.png", 159, 209, Some(8)),
    builtin("朱紫国", "zhuziguo.png", 191, 119, Some(10)),
];

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse map catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("map catalog must define at least one map")]
    Empty,
    #[error("map '{0}' defined more than once")]
    Duplicate(String),
    #[error("invalid map '{name}': {reason}")]
    Invalid { name: String, reason: String },
    #[error("unknown map '{0}'")]
    Unknown(String),
}

/// Ordered, read-only list of maps. The first entry is the default selection.
/// A catalog is never empty; every constructor, deserialization included,
/// runs [`MapCatalog::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct MapCatalog {
    maps: Vec<MapDefinition>,
}

#[derive(Deserialize)]
struct RawCatalog {
    maps: Vec<MapDefinition>,
}

impl TryFrom<RawCatalog> for MapCatalog {
    type Error = MapError;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        Self::new(raw.maps)
    }
}

impl Default for MapCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MapCatalog {
    pub fn builtin() -> Self {
        Self {
            maps: BUILTIN_MAPS.to_vec(),
        }
    }

    pub fn new(maps: Vec<MapDefinition>) -> Result<Self, MapError> {
        let catalog = Self { maps };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, MapError> {
        let raw: RawCatalog = serde_yaml::from_str(text)?;
        Self::new(raw.maps)
    }

    pub fn to_yaml_string(&self) -> Result<String, MapError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if self.maps.is_empty() {
            return Err(MapError::Empty);
        }
        let mut seen: Vec<&str> = Vec::with_capacity(self.maps.len());
        for map in &self.maps {
            map.validate()?;
            if seen.contains(&map.name.as_ref()) {
                return Err(MapError::Duplicate(map.name.to_string()));
            }
            seen.push(map.name.as_ref());
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&MapDefinition, MapError> {
        self.maps
            .iter()
            .find(|map| map.name == name)
            .ok_or_else(|| MapError::Unknown(name.to_string()))
    }

    pub fn default_map(&self) -> &MapDefinition {
        // Non-empty: checked by `validate` in every constructor.
        &self.maps[0]
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.maps.iter().map(|map| map.name.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapDefinition> {
        self.maps.iter()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
