use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::order::LayerOrder,
    compose::composer::OriginalExclusion,
    foundation::error::{RigError, RigResult},
    pool::limiter::RateLimit,
    rank::{selector::RANK_CATEGORY_FLEETS, table::RankTable},
    render::layers::{PngCompression, validate_canvas},
};

/// Everything the engine needs besides the catalog itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub ranks: RankTable,
    pub layer_order: LayerOrder,
    #[serde(default)]
    pub original_exclusions: Vec<OriginalExclusion>,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub thumb_width: u32,
    pub thumb_height: u32,
    pub compression: PngCompression,
    pub labels: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            thumb_width: 256,
            thumb_height: 256,
            compression: PngCompression::Default,
            labels: false,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> RigResult<()> {
        validate_canvas(self.width, self.height)?;
        validate_canvas(self.thumb_width, self.thumb_height)
            .map_err(|e| RigError::validation(format!("thumbnail: {e}")))
    }
}

/// Worker counts and job start rates for the three batch stages.
///
/// Rates are jobs per second; absent means unlimited.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    pub compose_workers: usize,
    pub render_workers: usize,
    pub publish_workers: usize,
    pub compose_rate: Option<f64>,
    pub render_rate: Option<f64>,
    pub publish_rate: Option<f64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            compose_workers: cpus,
            render_workers: cpus,
            publish_workers: 4,
            compose_rate: None,
            render_rate: None,
            publish_rate: None,
        }
    }
}

impl PoolConfig {
    pub fn compose_limit(&self) -> RateLimit {
        RateLimit::from_per_second(self.compose_rate)
    }

    pub fn render_limit(&self) -> RateLimit {
        RateLimit::from_per_second(self.render_rate)
    }

    pub fn publish_limit(&self) -> RateLimit {
        RateLimit::from_per_second(self.publish_rate)
    }

    pub fn validate(&self) -> RigResult<()> {
        for (stage, workers, limit) in [
            ("compose", self.compose_workers, self.compose_limit()),
            ("render", self.render_workers, self.render_limit()),
            ("publish", self.publish_workers, self.publish_limit()),
        ] {
            if workers == 0 {
                return Err(RigError::validation(format!(
                    "pool.{stage}_workers must be >= 1"
                )));
            }
            limit
                .validate()
                .map_err(|e| RigError::validation(format!("pool.{stage}_rate: {e}")))?;
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> RigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read engine config '{}'", path.display()))?;
        let cfg = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            rank_entries = cfg.ranks.len(),
            exclusions = cfg.original_exclusions.len(),
            "loaded engine config"
        );
        Ok(cfg)
    }

    pub fn from_json(text: &str) -> RigResult<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> RigResult<()> {
        if !self.ranks.categories().any(|c| c == RANK_CATEGORY_FLEETS) {
            return Err(RigError::validation(format!(
                "ranks must define the '{RANK_CATEGORY_FLEETS}' category"
            )));
        }
        for ex in &self.original_exclusions {
            if ex.original.trim().is_empty() || ex.part_type.trim().is_empty() {
                return Err(RigError::validation(
                    "original exclusions need a non-empty original and part_type",
                ));
            }
        }
        self.render.validate()?;
        self.pool.validate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/engine.rs"]
mod tests;
