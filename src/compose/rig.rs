use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    catalog::model::Part,
    foundation::error::{RigError, RigResult},
};

/// Attribute name recording a fully original rig's archetype display name.
pub const ATTR_ORIGINAL: &str = "Original";
/// Attribute name recording a fully original rig's archetype color.
pub const ATTR_COLOR: &str = "Color";

/// Rendered image flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageVariant {
    /// Every layer.
    Full,
    /// Every layer except the background.
    Alpha,
    /// Every layer at thumbnail size.
    Thumb,
}

impl ImageVariant {
    /// Every variant, in render order.
    pub const ALL: [ImageVariant; 3] = [Self::Full, Self::Alpha, Self::Thumb];

    /// Lowercase name used in file names and metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Alpha => "alpha",
            Self::Thumb => "thumb",
        }
    }
}

/// Where a rendered image was stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Which rendering this is.
    pub variant: ImageVariant,
    /// Store-specific locator (file path, content id, ...).
    pub locator: String,
}

/// A named attribute recorded on a rig.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigAttribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

/// A generated composite character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rig {
    /// Rig identifier.
    pub id: u64,
    /// Whether the rig was composed by reproducing an archetype.
    pub original: bool,
    /// Selected parts: the fleet part first, then one part per part type.
    pub parts: Vec<Part>,
    /// Share of non-background parts agreeing on the most common `(color, original)` pair.
    pub originality: f64,
    /// Extra named attributes.
    #[serde(default)]
    pub attributes: Vec<RigAttribute>,
    /// Stored renderings; empty until rendered.
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl Rig {
    /// The fleet part.
    pub fn fleet(&self) -> Option<&Part> {
        self.parts.iter().find(|p| p.is_fleet())
    }

    /// Name of the fleet part, empty if absent.
    pub fn fleet_name(&self) -> &str {
        self.fleet().map(|p| p.name.as_str()).unwrap_or("")
    }

    /// Value of a named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Attach stored renderings. A rig is rendered once; a second attach is rejected.
    pub fn attach_images(&mut self, images: Vec<ImageRef>) -> RigResult<()> {
        if !self.images.is_empty() {
            return Err(RigError::validation(format!(
                "rig {} already has images attached",
                self.id
            )));
        }
        self.images = images;
        Ok(())
    }

    /// Locator of one rendering.
    pub fn image(&self, variant: ImageVariant) -> Option<&str> {
        self.images
            .iter()
            .find(|i| i.variant == variant)
            .map(|i| i.locator.as_str())
    }

    /// Publishable metadata document.
    pub fn metadata(&self) -> RigMetadata {
        let mut attributes: Vec<MetadataAttribute> = self
            .parts
            .iter()
            .map(|p| MetadataAttribute {
                trait_type: p.part_type.clone(),
                value: p.name.clone(),
            })
            .collect();
        attributes.extend(self.attributes.iter().map(|a| MetadataAttribute {
            trait_type: a.name.clone(),
            value: a.value.clone(),
        }));
        attributes.push(MetadataAttribute {
            trait_type: "Originality".to_string(),
            value: format!("{:.0}%", self.originality * 100.0),
        });

        RigMetadata {
            name: format!("{} #{}", self.fleet_name(), self.id),
            original: self.original,
            originality: self.originality,
            attributes,
            images: self.images.clone(),
        }
    }
}

/// Metadata trait entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataAttribute {
    /// Trait name.
    pub trait_type: String,
    /// Trait value.
    pub value: String,
}

/// Publishable rig description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigMetadata {
    /// Display name.
    pub name: String,
    /// Whether the rig reproduces an archetype.
    pub original: bool,
    /// Originality score in `[0, 1]`.
    pub originality: f64,
    /// One entry per part plus rig attributes.
    pub attributes: Vec<MetadataAttribute>,
    /// Stored renderings.
    pub images: Vec<ImageRef>,
}

/// Fraction of non-fleet, non-background parts sharing the most common `(color, original)`.
///
/// Returns `0.0` when there are no such parts.
pub fn originality(parts: &[Part]) -> f64 {
    let mut groups: HashMap<(&str, &str), usize> = HashMap::new();
    let mut total = 0usize;
    for p in parts.iter().filter(|p| !p.is_fleet() && !p.is_background()) {
        *groups.entry((p.color_str(), p.original_str())).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    let largest = groups.values().copied().max().unwrap_or(0);
    largest as f64 / total as f64
}

#[cfg(test)]
#[path = "../../tests/unit/compose/rig.rs"]
mod tests;
