//! Procedural rig generation: weighted part selection, layered PNG rendering and a batch driver.
//!
//! A rig is a composite character assembled from catalog parts. The main entry points are:
//!
//! - Load an [`EngineConfig`] and a [`ManifestCatalog`]
//! - Compose rigs with a [`RigComposer`], either randomly or by reproducing an [`Original`]
//! - Render them with a [`RigRenderer`] (built on [`LayerRenderer`])
//! - Or drive everything in bulk with [`run_batch`], which fans work out over [`WorkerPool`]s
#![forbid(unsafe_code)]

mod foundation;

pub mod catalog;
pub mod compose;
pub mod config;
pub mod pipeline;
pub mod pool;
pub mod publish;
pub mod rank;
pub mod render;

pub use crate::foundation::error::{ErrorKind, RigError, RigResult};

pub use crate::catalog::manifest::{CatalogManifest, ManifestCatalog, normalize_rel_path};
pub use crate::catalog::model::{Layer, Original, Part};
pub use crate::catalog::order::LayerOrder;
pub use crate::catalog::source::{Catalog, PartRef};
pub use crate::compose::composer::{ComposeMode, OriginalExclusion, RigComposer};
pub use crate::compose::random::{FixedRandoms, OsRandom, RandomnessSource, SeededRandom};
pub use crate::compose::rig::{ImageRef, ImageVariant, Rig, RigMetadata, originality};
pub use crate::config::engine::{EngineConfig, PoolConfig, RenderConfig};
pub use crate::pipeline::batch::{BatchEngine, BatchPlan, BatchReport, BatchStage, run_batch};
pub use crate::pool::cancel::CancelToken;
pub use crate::pool::limiter::RateLimit;
pub use crate::pool::worker::{Job, JobResult, PoolRun, WorkerPool};
pub use crate::publish::sink::{JsonLinesSink, MemorySink, RigSink};
pub use crate::publish::store::{DirImageStore, ImageStore};
pub use crate::rank::selector::PartSelector;
pub use crate::rank::table::RankTable;
pub use crate::render::decode::{LayerImage, decode_layer};
pub use crate::render::layers::{LayerRenderer, PngCompression};
pub use crate::render::rig::{FsLayerLoader, LayerLoader, RenderedRig, RigRenderer};

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;
