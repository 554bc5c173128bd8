use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    catalog::{
        model::{Original, PART_TYPE_BACKGROUND, PART_TYPE_FLEET, Part},
        source::Catalog,
    },
    compose::{
        random::RandomnessSource,
        rig::{ATTR_COLOR, ATTR_ORIGINAL, Rig, RigAttribute, originality},
    },
    foundation::{
        cache::KeyedCache,
        error::{RigError, RigResult},
    },
    rank::{selector::PartSelector, table::RankTable},
};

/// Draws taken up front for a random rig: one for the fleet, the rest for part types.
pub const RANDOM_POOL_SIZE: usize = 10;

const FLEETS_KEY: &str = "fleets";

/// How a rig's parts are chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComposeMode {
    /// Every part drawn by rank-weighted selection.
    Random,
    /// Every part pinned to an archetype except the background.
    Original(Original),
}

impl ComposeMode {
    fn archetype(&self) -> Option<&Original> {
        match self {
            Self::Random => None,
            Self::Original(o) => Some(o),
        }
    }
}

/// An `(original, part type)` combination that may be missing from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginalExclusion {
    /// Archetype name.
    pub original: String,
    /// Part type the archetype has no part for.
    pub part_type: String,
}

/// Progress of a single composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ComposeStage {
    Unstarted,
    FleetSelected,
    PartsAssembling { done: usize, total: usize },
    Composed,
    Failed,
}

/// Parts gathered so far for one rig. Only a finished assembly yields a [`Rig`].
#[derive(Debug)]
pub(crate) struct Assembly {
    id: u64,
    stage: ComposeStage,
    parts: Vec<Part>,
}

impl Assembly {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            stage: ComposeStage::Unstarted,
            parts: Vec::new(),
        }
    }

    pub(crate) fn stage(&self) -> ComposeStage {
        self.stage
    }

    pub(crate) fn select_fleet(&mut self, fleet: Part) -> RigResult<()> {
        if self.stage != ComposeStage::Unstarted {
            return Err(self.fail("fleet selected twice"));
        }
        self.parts.push(fleet);
        self.stage = ComposeStage::FleetSelected;
        Ok(())
    }

    pub(crate) fn begin_parts(&mut self, total: usize) -> RigResult<()> {
        if self.stage != ComposeStage::FleetSelected {
            return Err(self.fail("part assembly started before fleet selection"));
        }
        self.stage = ComposeStage::PartsAssembling { done: 0, total };
        Ok(())
    }

    /// Advance past one part type, with or without a part for it.
    pub(crate) fn advance(&mut self, part: Option<Part>) -> RigResult<()> {
        let ComposeStage::PartsAssembling { done, total } = self.stage else {
            return Err(self.fail("part added outside of assembly"));
        };
        if done >= total {
            return Err(self.fail("more parts than part types"));
        }
        if let Some(part) = part {
            self.parts.push(part);
        }
        self.stage = ComposeStage::PartsAssembling {
            done: done + 1,
            total,
        };
        Ok(())
    }

    pub(crate) fn finish(mut self, archetype: Option<&Original>) -> RigResult<Rig> {
        match self.stage {
            ComposeStage::PartsAssembling { done, total } if done == total => {}
            _ => return Err(self.fail("assembly finished early")),
        }
        self.stage = ComposeStage::Composed;

        let score = originality(&self.parts);
        let mut attributes = Vec::new();
        if let Some(o) = archetype
            && score == 1.0
        {
            attributes.push(RigAttribute {
                name: ATTR_ORIGINAL.to_string(),
                value: o.name.clone(),
            });
            attributes.push(RigAttribute {
                name: ATTR_COLOR.to_string(),
                value: o.color.clone(),
            });
        }

        Ok(Rig {
            id: self.id,
            original: archetype.is_some(),
            parts: self.parts,
            originality: score,
            attributes,
            images: Vec::new(),
        })
    }

    /// Mark the assembly failed, returning the stage it failed in.
    pub(crate) fn abort(&mut self) -> ComposeStage {
        std::mem::replace(&mut self.stage, ComposeStage::Failed)
    }

    fn fail(&mut self, msg: &str) -> RigError {
        let stage = self.stage;
        self.stage = ComposeStage::Failed;
        RigError::config(format!("rig {}: {msg} (stage {stage:?})", self.id))
    }
}

/// Builds complete rigs from catalog parts.
///
/// Catalog reads go through per-process caches keyed by fleet and part type; the caches are
/// advisory and a miss always falls through to the catalog.
pub struct RigComposer {
    catalog: Arc<dyn Catalog>,
    ranks: Arc<RankTable>,
    exclusions: Vec<OriginalExclusion>,
    fleets: KeyedCache<Vec<Part>>,
    part_types: KeyedCache<Vec<String>>,
    parts: KeyedCache<Vec<Part>>,
}

impl RigComposer {
    /// Composer over `catalog`, weighting selections with `ranks`.
    pub fn new(catalog: Arc<dyn Catalog>, ranks: Arc<RankTable>) -> Self {
        Self {
            catalog,
            ranks,
            exclusions: Vec::new(),
            fleets: KeyedCache::new(),
            part_types: KeyedCache::new(),
            parts: KeyedCache::new(),
        }
    }

    /// Allow the listed `(original, part type)` combinations to be absent in original mode.
    pub fn with_exclusions(mut self, exclusions: Vec<OriginalExclusion>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// The backing catalog.
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Forget cached catalog reads.
    pub fn clear_cache(&self) {
        self.fleets.clear();
        self.part_types.clear();
        self.parts.clear();
    }

    /// Compose rig `id`.
    ///
    /// The first error aborts the composition; no partial rig is returned.
    #[tracing::instrument(skip(self, rng))]
    pub fn compose(
        &self,
        id: u64,
        mode: &ComposeMode,
        rng: &dyn RandomnessSource,
    ) -> RigResult<Rig> {
        let mut asm = Assembly::new(id);
        let res = match mode {
            ComposeMode::Random => self.assemble_random(&mut asm, rng),
            ComposeMode::Original(o) => self.assemble_original(&mut asm, o, rng),
        };
        if let Err(e) = res {
            let stage = asm.abort();
            tracing::debug!(rig = id, ?stage, error = %e, "composition failed");
            return Err(e);
        }

        let rig = asm.finish(mode.archetype())?;
        tracing::debug!(
            rig = id,
            fleet = rig.fleet_name(),
            parts = rig.parts.len(),
            originality = rig.originality,
            cached_part_lists = self.parts.len(),
            "composed rig"
        );
        Ok(rig)
    }

    fn assemble_random(&self, asm: &mut Assembly, rng: &dyn RandomnessSource) -> RigResult<()> {
        let randoms = rng.gen_randoms(RANDOM_POOL_SIZE)?;
        if randoms.len() < RANDOM_POOL_SIZE {
            return Err(RigError::resource(format!(
                "randomness source returned {} draws, wanted {RANDOM_POOL_SIZE}",
                randoms.len()
            )));
        }
        let selector = PartSelector::new(&self.ranks);

        let fleets = self.fleets()?;
        let fleet = selector.select(&fleets, randoms[0])?;
        let fleet_name = fleet.name.clone();
        asm.select_fleet(fleet)?;

        let types = self.part_types(&fleet_name)?;
        if types.len() > RANDOM_POOL_SIZE - 1 {
            return Err(RigError::config(format!(
                "fleet {fleet_name} has {} part types but only {} random draws remain",
                types.len(),
                RANDOM_POOL_SIZE - 1
            )));
        }

        asm.begin_parts(types.len())?;
        for (i, part_type) in types.iter().enumerate() {
            let candidates = self.parts(&fleet_name, part_type)?;
            if candidates.is_empty() {
                return Err(RigError::config(format!(
                    "no parts for fleet {fleet_name}, type {part_type}"
                )));
            }
            asm.advance(Some(selector.select(&candidates, randoms[i + 1])?))?;
        }
        Ok(())
    }

    fn assemble_original(
        &self,
        asm: &mut Assembly,
        original: &Original,
        rng: &dyn RandomnessSource,
    ) -> RigResult<()> {
        let fleets = self.fleets()?;
        let mut matching = fleets.iter().filter(|p| p.name == original.fleet);
        let fleet = match (matching.next(), matching.next()) {
            (Some(f), None) => f.clone(),
            _ => {
                let n = fleets.iter().filter(|p| p.name == original.fleet).count();
                return Err(RigError::config(format!(
                    "expected exactly one fleet part named {}; found {n}",
                    original.fleet
                )));
            }
        };
        asm.select_fleet(fleet)?;

        let types = self.part_types(&original.fleet)?;
        asm.begin_parts(types.len())?;
        for part_type in types.iter() {
            let candidates = self.parts(&original.fleet, part_type)?;

            if part_type == PART_TYPE_BACKGROUND {
                let draw = rng
                    .gen_randoms(1)?
                    .first()
                    .copied()
                    .ok_or_else(|| RigError::resource("randomness source returned no draws"))?;
                let selector = PartSelector::new(&self.ranks);
                asm.advance(Some(selector.select(&candidates, draw)?))?;
                continue;
            }

            let matches: Vec<&Part> = candidates
                .iter()
                .filter(|p| {
                    p.color.as_deref() == Some(original.color.as_str())
                        && p.original.as_deref() == Some(original.original.as_str())
                })
                .collect();

            match matches.as_slice() {
                [only] => asm.advance(Some((*only).clone()))?,
                [] if self.is_excluded(&original.original, part_type) => {
                    tracing::debug!(
                        original = %original.original,
                        part_type = %part_type,
                        "skipping excluded part type"
                    );
                    asm.advance(None)?;
                }
                _ => {
                    return Err(RigError::config(format!(
                        "expected exactly one part for fleet {}, type {part_type}, color {}, original {}; found {}",
                        original.fleet,
                        original.color,
                        original.original,
                        matches.len()
                    )));
                }
            }
        }
        Ok(())
    }

    fn is_excluded(&self, original: &str, part_type: &str) -> bool {
        self.exclusions
            .iter()
            .any(|e| e.original == original && e.part_type == part_type)
    }

    fn fleets(&self) -> RigResult<Arc<Vec<Part>>> {
        self.fleets.get_or_try_load(FLEETS_KEY, || {
            self.catalog.parts_of_type(PART_TYPE_FLEET)
        })
    }

    fn part_types(&self, fleet: &str) -> RigResult<Arc<Vec<String>>> {
        self.part_types
            .get_or_try_load(fleet, || self.catalog.part_types_of_fleet(fleet))
    }

    fn parts(&self, fleet: &str, part_type: &str) -> RigResult<Arc<Vec<Part>>> {
        let key = format!("{fleet}\u{1f}{part_type}");
        self.parts.get_or_try_load(&key, || {
            self.catalog.parts_of_fleet_and_type(fleet, part_type)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/composer.rs"]
mod tests;
