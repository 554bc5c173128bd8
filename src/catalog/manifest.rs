use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::{
        model::{Layer, Original, PART_TYPE_FLEET, Part},
        order::LayerOrder,
        source::{Catalog, PartRef},
    },
    foundation::error::{RigError, RigResult},
};

/// Layer record as written in a manifest; `position` may come from the [`LayerOrder`] instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestLayer {
    /// Fleet whose stacking order this layer follows.
    pub fleet: String,
    /// Color variant of the drawn part.
    #[serde(default)]
    pub color: Option<String>,
    /// Name of the drawn part.
    pub part_name: String,
    /// Type of the drawn part.
    pub part_type: String,
    /// Explicit stacking position.
    #[serde(default)]
    pub position: Option<u32>,
    /// Relative path of the raster bytes.
    pub path: String,
}

/// JSON catalog snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Every selectable part, fleet parts included.
    #[serde(default)]
    pub parts: Vec<Part>,
    /// Every layer image.
    #[serde(default)]
    pub layers: Vec<ManifestLayer>,
    /// Reproducible archetypes.
    #[serde(default)]
    pub originals: Vec<Original>,
}

/// Immutable in-memory [`Catalog`] built from a validated [`CatalogManifest`].
#[derive(Clone, Debug)]
pub struct ManifestCatalog {
    parts: Vec<Part>,
    layers: Vec<Layer>,
    originals: Vec<Original>,
}

impl ManifestCatalog {
    /// Read and validate a manifest JSON file.
    pub fn load(path: &Path, order: &LayerOrder) -> RigResult<Self> {
        let f = File::open(path)
            .with_context(|| format!("open catalog manifest '{}'", path.display()))?;
        let manifest: CatalogManifest = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| RigError::serde(format!("parse catalog manifest: {e}")))?;
        Self::from_manifest(manifest, order)
    }

    /// Validate `manifest` and resolve layer positions.
    pub fn from_manifest(manifest: CatalogManifest, order: &LayerOrder) -> RigResult<Self> {
        let mut ids = HashSet::with_capacity(manifest.parts.len());
        for p in &manifest.parts {
            if !ids.insert(p.id) {
                return Err(RigError::validation(format!("duplicate part id {}", p.id)));
            }
            if p.part_type.is_empty() || p.name.is_empty() {
                return Err(RigError::validation(format!(
                    "part {} must have a non-empty type and name",
                    p.id
                )));
            }
            if !p.is_fleet() && p.fleet.as_deref().is_none_or(str::is_empty) {
                return Err(RigError::validation(format!(
                    "part {} ({}) must belong to a fleet",
                    p.id, p.name
                )));
            }
        }

        let mut layers = Vec::with_capacity(manifest.layers.len());
        let mut type_at: HashMap<(String, u32), String> = HashMap::new();
        for l in manifest.layers {
            let position = match l.position {
                Some(p) => p,
                None => order.position(&l.fleet, &l.part_type).ok_or_else(|| {
                    RigError::validation(format!(
                        "layer '{}' for fleet {} has no position and the layer order does not list part type {}",
                        l.path, l.fleet, l.part_type
                    ))
                })?,
            };

            let key = (l.fleet.clone(), position);
            match type_at.get(&key) {
                Some(existing) if existing != &l.part_type => {
                    return Err(RigError::validation(format!(
                        "fleet {} position {position} is shared by part types {existing} and {}",
                        l.fleet, l.part_type
                    )));
                }
                Some(_) => {}
                None => {
                    type_at.insert(key, l.part_type.clone());
                }
            }

            layers.push(Layer {
                path: normalize_rel_path(&l.path)?,
                fleet: l.fleet,
                color: l.color,
                part_name: l.part_name,
                part_type: l.part_type,
                position,
            });
        }

        for o in &manifest.originals {
            if o.fleet.is_empty() || o.original.is_empty() {
                return Err(RigError::validation(format!(
                    "original '{}' must name a fleet and an archetype",
                    o.name
                )));
            }
        }

        Ok(Self {
            parts: manifest.parts,
            layers,
            originals: manifest.originals,
        })
    }

    /// Number of parts in the snapshot.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

impl Catalog for ManifestCatalog {
    fn parts_of_type(&self, part_type: &str) -> RigResult<Vec<Part>> {
        Ok(self
            .parts
            .iter()
            .filter(|p| p.part_type == part_type)
            .cloned()
            .collect())
    }

    fn parts_of_fleet_and_type(&self, fleet: &str, part_type: &str) -> RigResult<Vec<Part>> {
        Ok(self
            .parts
            .iter()
            .filter(|p| p.part_type == part_type && p.fleet.as_deref() == Some(fleet))
            .cloned()
            .collect())
    }

    fn part_types_of_fleet(&self, fleet: &str) -> RigResult<Vec<String>> {
        let types: BTreeSet<&str> = self
            .parts
            .iter()
            .filter(|p| p.fleet.as_deref() == Some(fleet) && p.part_type != PART_TYPE_FLEET)
            .map(|p| p.part_type.as_str())
            .collect();
        Ok(types.into_iter().map(str::to_owned).collect())
    }

    fn layers_for_fleet_and_parts(&self, fleet: &str, parts: &[PartRef]) -> RigResult<Vec<Layer>> {
        let wanted: HashSet<(&str, Option<&str>)> = parts
            .iter()
            .map(|r| (r.name.as_str(), r.color.as_deref()))
            .collect();

        let mut out: Vec<Layer> = self
            .layers
            .iter()
            .filter(|l| {
                l.fleet == fleet && wanted.contains(&(l.part_name.as_str(), l.color.as_deref()))
            })
            .cloned()
            .collect();
        out.sort_by_key(|l| l.position);
        Ok(out)
    }

    fn originals(&self) -> RigResult<Vec<Original>> {
        Ok(self.originals.clone())
    }
}

/// Normalize and validate a catalog-relative layer path.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> RigResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(RigError::validation("layer paths must be relative"));
    }
    if s.is_empty() {
        return Err(RigError::validation("layer path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(RigError::validation("layer paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(RigError::validation("layer path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/manifest.rs"]
mod tests;
