use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const META_TRANSFORMATION: &str = "transformation";
pub const META_IMPACT: &str = "impact";
pub const META_FUN_FACT: &str = "fun_fact";

/// Free-text educational notes attached to an item.
pub type ItemMetadata = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BinCategory {
    Recycle,
    Organic,
    Hazardous,
    Landfill,
}

impl BinCategory {
    pub const ALL: [BinCategory; 4] = [
        BinCategory::Recycle,
        BinCategory::Organic,
        BinCategory::Hazardous,
        BinCategory::Landfill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BinCategory::Recycle => "Recycle",
            BinCategory::Organic => "Organic",
            BinCategory::Hazardous => "Hazardous",
            BinCategory::Landfill => "Landfill",
        }
    }

    /// Lenient parse of a bin name coming from model output. Anything
    /// unrecognised lands in `Landfill` so an item is never dropped.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|bin| bin.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(BinCategory::Landfill)
    }
}

impl Default for BinCategory {
    fn default() -> Self {
        BinCategory::Landfill
    }
}

impl fmt::Display for BinCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel rectangle in source-image coordinates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        BoundingBox {
            x: x1 as i32,
            y: y1 as i32,
            w: (x2 - x1) as i32,
            h: (y2 - y1) as i32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectedItem {
    pub id: u32,
    pub item_type: String,
    pub bin: BinCategory,
    pub contaminated: bool,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub metadata: ItemMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionResponse {
    pub items: Vec<DetectedItem>,
}

impl DetectionResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(items: Vec<DetectedItem>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
