use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    catalog::{
        manifest::normalize_rel_path,
        model::{Layer, PART_TYPE_BACKGROUND},
        source::{Catalog, PartRef},
    },
    compose::rig::{ImageVariant, Rig},
    config::engine::RenderConfig,
    foundation::error::{RigError, RigResult},
    render::{
        decode::{LayerImage, decode_layer},
        layers::LayerRenderer,
    },
};

/// Source of layer raster bytes.
pub trait LayerLoader: Send + Sync {
    fn load(&self, layer: &Layer) -> RigResult<Vec<u8>>;
}

/// Reads layers from files under an asset root.
#[derive(Clone, Debug)]
pub struct FsLayerLoader {
    root: PathBuf,
}

impl FsLayerLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl LayerLoader for FsLayerLoader {
    fn load(&self, layer: &Layer) -> RigResult<Vec<u8>> {
        let rel = normalize_rel_path(&layer.path)?;
        let path = self.root.join(Path::new(&rel));
        std::fs::read(&path)
            .with_context(|| format!("read layer bytes from '{}'", path.display()))
            .map_err(RigError::from)
    }
}

/// The three PNG renderings of one rig.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedRig {
    pub id: u64,
    pub full: Vec<u8>,
    pub alpha: Vec<u8>,
    pub thumb: Vec<u8>,
}

impl RenderedRig {
    pub fn variant(&self, variant: ImageVariant) -> &[u8] {
        match variant {
            ImageVariant::Full => &self.full,
            ImageVariant::Alpha => &self.alpha,
            ImageVariant::Thumb => &self.thumb,
        }
    }
}

struct DecodedLayer {
    layer: Layer,
    image: LayerImage,
}

impl DecodedLayer {
    fn label(&self) -> String {
        format!(
            "{:>2} {}: {} ({})",
            self.layer.position,
            self.layer.part_type,
            self.layer.part_name,
            self.layer.color.as_deref().unwrap_or("none")
        )
    }
}

/// Renders composed rigs from their catalog layers.
pub struct RigRenderer {
    catalog: Arc<dyn Catalog>,
    loader: Arc<dyn LayerLoader>,
    settings: RenderConfig,
}

impl RigRenderer {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        loader: Arc<dyn LayerLoader>,
        settings: RenderConfig,
    ) -> RigResult<Self> {
        settings.validate()?;
        Ok(Self {
            catalog,
            loader,
            settings,
        })
    }

    pub fn settings(&self) -> &RenderConfig {
        &self.settings
    }

    /// Render the full, alpha and thumbnail variants of `rig`.
    ///
    /// Each layer is fetched and decoded once and shared by all variants.
    #[tracing::instrument(skip(self, rig), fields(rig = rig.id))]
    pub fn render(&self, rig: &Rig) -> RigResult<RenderedRig> {
        let fleet = rig.fleet_name();
        if fleet.is_empty() {
            return Err(RigError::validation(format!(
                "rig {} has no fleet part",
                rig.id
            )));
        }

        let refs: Vec<PartRef> = rig.parts.iter().map(PartRef::from).collect();
        let layers = self.catalog.layers_for_fleet_and_parts(fleet, &refs)?;
        if layers.is_empty() {
            return Err(RigError::config(format!(
                "no layers for rig {} of fleet {fleet}",
                rig.id
            )));
        }

        let decoded = layers
            .into_iter()
            .map(|layer| self.decode(layer))
            .collect::<RigResult<Vec<_>>>()?;
        tracing::debug!(layers = decoded.len(), "decoded layers");

        let RenderConfig {
            width,
            height,
            thumb_width,
            thumb_height,
            compression,
            labels,
        } = self.settings;

        let full = stack(
            LayerRenderer::new(width, height, labels)?,
            decoded.iter(),
        )?
        .encode(compression)?;
        let alpha = stack(
            LayerRenderer::new(width, height, labels)?,
            decoded
                .iter()
                .filter(|d| d.layer.part_type != PART_TYPE_BACKGROUND),
        )?
        .encode(compression)?;
        let thumb = stack(
            LayerRenderer::new(thumb_width, thumb_height, false)?,
            decoded.iter(),
        )?
        .encode(compression)?;

        Ok(RenderedRig {
            id: rig.id,
            full,
            alpha,
            thumb,
        })
    }

    fn decode(&self, layer: Layer) -> RigResult<DecodedLayer> {
        let bytes = self.loader.load(&layer)?;
        let image = decode_layer(&bytes)
            .map_err(|e| RigError::resource(format!("layer '{}': {e}", layer.path)))?;
        Ok(DecodedLayer { layer, image })
    }
}

fn stack<'a>(
    mut renderer: LayerRenderer,
    layers: impl Iterator<Item = &'a DecodedLayer>,
) -> RigResult<LayerRenderer> {
    for d in layers {
        renderer.add_layer(&d.image, &d.label())?;
    }
    Ok(renderer)
}

#[cfg(test)]
#[path = "../../tests/unit/render/rig.rs"]
mod tests;
