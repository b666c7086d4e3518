//! Core value types shared by the editor, the backend and the GUI

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::scale;

/// Which half of the thumbnail a character occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    #[default]
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positioning transform for one character on one side
///
/// `offset_x` and `raise` are in the 1920x1080 reference frame; `raise` grows
/// upwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub scale: f64,
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub offset_x: i32,
    #[serde(deserialize_with = "deserialize_whole_number")]
    pub raise: i32,
    pub mirror: bool,
    pub use_other_side: bool,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            scale: scale::DEFAULT,
            offset_x: 0,
            raise: 0,
            mirror: false,
            use_other_side: false,
        }
    }
}

/// Hand-edited configs sometimes carry `12.0` where an integer is expected
fn deserialize_whole_number<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrFloat {
        Int(i64),
        Float(f64),
    }

    let value = match IntOrFloat::deserialize(deserializer)? {
        IntOrFloat::Int(i) => i as f64,
        IntOrFloat::Float(f) => f,
    };
    Ok(value.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
}

/// Body of a commit: the full working set for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageValues {
    pub character: String,
    pub side: Side,
    #[serde(flatten)]
    pub params: ParameterSet,
}

/// Staged values for a page as reported by the page data service
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct PageBaseline {
    #[serde(flatten)]
    pub params: ParameterSet,
    /// Page has staged values that are not yet flushed to disk
    #[serde(default)]
    pub dirty: bool,
}

/// Everything a render needs; the session keeps it next to the decoded image
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub character: String,
    pub side: Side,
    pub params: ParameterSet,
}
