use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    catalog::manifest::normalize_rel_path,
    compose::rig::{ImageRef, ImageVariant},
    foundation::error::{RigError, RigResult},
};

/// Destination for rendered images.
pub trait ImageStore: Send + Sync {
    /// Store one rendering and return where it went.
    fn put(&self, rig_id: u64, variant: ImageVariant, png: &[u8]) -> RigResult<ImageRef>;

    /// Undo a previous [`ImageStore::put`].
    fn remove(&self, image: &ImageRef) -> RigResult<()>;
}

/// Writes `rig-<id>-<variant>.png` files into a directory.
#[derive(Clone, Debug)]
pub struct DirImageStore {
    root: PathBuf,
}

impl DirImageStore {
    /// Store rooted at `root`, creating the directory if needed.
    pub fn create(root: impl Into<PathBuf>) -> RigResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create image directory '{}'", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_name(rig_id: u64, variant: ImageVariant) -> String {
        format!("rig-{rig_id}-{}.png", variant.as_str())
    }

    fn resolve(&self, locator: &str) -> RigResult<PathBuf> {
        Ok(self.root.join(normalize_rel_path(locator)?))
    }
}

impl ImageStore for DirImageStore {
    fn put(&self, rig_id: u64, variant: ImageVariant, png: &[u8]) -> RigResult<ImageRef> {
        if png.is_empty() {
            return Err(RigError::validation(format!(
                "refusing to store empty {} image for rig {rig_id}",
                variant.as_str()
            )));
        }
        let locator = Self::file_name(rig_id, variant);
        let path = self.resolve(&locator)?;
        std::fs::write(&path, png).with_context(|| format!("write image '{}'", path.display()))?;
        tracing::trace!(rig = rig_id, path = %path.display(), bytes = png.len(), "stored image");
        Ok(ImageRef { variant, locator })
    }

    fn remove(&self, image: &ImageRef) -> RigResult<()> {
        let path = self.resolve(&image.locator)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("remove image '{}'", path.display()))
                .into()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/publish/store.rs"]
mod tests;
