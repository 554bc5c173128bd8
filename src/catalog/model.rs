use serde::{Deserialize, Serialize};

/// Part type of the single chassis part every rig carries.
pub const PART_TYPE_FLEET: &str = "Fleet";
/// Part type whose selection stays random even when reproducing an original.
pub const PART_TYPE_BACKGROUND: &str = "Background";

/// One selectable trait instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Part {
    /// Catalog identifier.
    pub id: u64,
    /// Fleet the part belongs to. `None` for fleet parts themselves.
    #[serde(default)]
    pub fleet: Option<String>,
    /// Archetype name the part was drawn for.
    #[serde(default)]
    pub original: Option<String>,
    /// Category, e.g. `Fleet`, `Background`, `Cockpit`.
    #[serde(rename = "type")]
    pub part_type: String,
    /// Display name.
    pub name: String,
    /// Color variant.
    #[serde(default)]
    pub color: Option<String>,
}

impl Part {
    /// `true` for the chassis part.
    pub fn is_fleet(&self) -> bool {
        self.part_type == PART_TYPE_FLEET
    }

    /// `true` for background parts.
    pub fn is_background(&self) -> bool {
        self.part_type == PART_TYPE_BACKGROUND
    }

    /// Color as a plain string, empty when unset.
    pub fn color_str(&self) -> &str {
        self.color.as_deref().unwrap_or("")
    }

    /// Original archetype name as a plain string, empty when unset.
    pub fn original_str(&self) -> &str {
        self.original.as_deref().unwrap_or("")
    }

    /// Fleet name as a plain string, empty when unset.
    pub fn fleet_str(&self) -> &str {
        self.fleet.as_deref().unwrap_or("")
    }
}

/// One image asset contributing to a rendered rig.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    /// Fleet whose stacking order this layer follows.
    pub fleet: String,
    /// Color variant of the part this layer draws.
    #[serde(default)]
    pub color: Option<String>,
    /// Name of the part this layer draws.
    pub part_name: String,
    /// Type of the part this layer draws.
    pub part_type: String,
    /// Stacking position; lower is drawn first.
    pub position: u32,
    /// Relative path of the raster bytes.
    pub path: String,
}

/// A predefined rig configuration that composition can reproduce.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Original {
    /// Fleet name; must match exactly one fleet part.
    pub fleet: String,
    /// Archetype name matched against [`Part::original`].
    pub original: String,
    /// Color matched against [`Part::color`].
    pub color: String,
    /// Display name recorded on fully original rigs.
    pub name: String,
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/model.rs"]
mod tests;
