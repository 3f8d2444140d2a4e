//! Annotation records as stored in per-frame JSON files.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Largest magnitude an f64 can hold while every integer below it is exact.
const F64_EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;

/// An axis-aligned box in image pixels, given by its top-left and bottom-right corners.
///
/// Persisted as a 4-element array `[x1, y1, x2, y2]`. Coordinates keep the full
/// precision they were read with. Integral coordinates are written as JSON
/// integers so files produced by other tools round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from `[x1, y1, x2, y2]`.
    pub fn from_array(coords: [f64; 4]) -> Self {
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Inclusive containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x1 <= x && x <= self.x2 && self.y1 <= y && y <= self.y2
    }

    /// The same box shifted by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// All coordinates finite and both extents strictly positive.
    pub fn is_well_formed(&self) -> bool {
        self.to_array().iter().all(|c| c.is_finite()) && self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Whether the box lies inside `[0, width] x [0, height]`.
    pub fn fits_within(&self, width: f64, height: f64) -> bool {
        self.x1 >= 0.0 && self.y1 >= 0.0 && self.x2 <= width && self.y2 <= height
    }

    /// Clamp every coordinate into `[0, width] x [0, height]`.
    pub fn clamped_to(&self, width: f64, height: f64) -> Self {
        Self::new(
            self.x1.clamp(0.0, width),
            self.y1.clamp(0.0, height),
            self.x2.clamp(0.0, width),
            self.y2.clamp(0.0, height),
        )
    }
}

impl Serialize for BBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(4))?;
        for coord in self.to_array() {
            if coord.fract() == 0.0 && coord.abs() < F64_EXACT_INT_LIMIT {
                seq.serialize_element(&(coord as i64))?;
            } else {
                seq.serialize_element(&coord)?;
            }
        }
        seq.end()
    }
}

/// A coordinate as it may appear in hand-edited files.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoord {
    Number(f64),
    Text(String),
}

impl RawCoord {
    /// The coordinate value, or `None` if it is not a finite number.
    fn value(&self) -> Option<f64> {
        let value = match self {
            RawCoord::Number(n) => *n,
            RawCoord::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl<'de> Deserialize<'de> for BBox {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<RawCoord>::deserialize(deserializer)?;
        if raw.len() != 4 {
            return Err(de::Error::invalid_length(raw.len(), &"4 box coordinates"));
        }

        let mut coords = [0.0f64; 4];
        for (slot, value) in coords.iter_mut().zip(&raw) {
            *slot = value
                .value()
                .ok_or_else(|| de::Error::custom("box coordinate is not a finite number"))?;
        }
        Ok(Self::from_array(coords))
    }
}

/// One labeled box on a frame.
///
/// Field order matches the persisted key order. Keys not listed here (for
/// example the legacy `openvocab` field) are dropped when a file is read, so
/// they disappear on the next save. The score is kept as the number that was
/// read, so `1` stays `1` and `1.0` stays `1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "box")]
    pub bbox: BBox,
    #[serde(default)]
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_detailed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Number>,
}

impl Annotation {
    /// Create an annotation with only a box and a class.
    pub fn new(bbox: BBox, class: impl Into<String>) -> Self {
        Self {
            bbox,
            class: class.into(),
            class_detailed: None,
            detailed_caption: None,
            score: None,
        }
    }

    /// Set the score. Non-finite values cannot be stored in JSON and clear it.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Number::from_f64(score);
        self
    }

    pub fn score(&self) -> Option<f64> {
        self.score.as_ref().and_then(Number::as_f64)
    }

    pub fn with_class_detailed(mut self, class_detailed: impl Into<String>) -> Self {
        self.class_detailed = Some(class_detailed.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.detailed_caption = Some(caption.into());
        self
    }
}
