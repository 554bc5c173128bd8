//! Bulk generation: compose, render, store and insert a batch of rigs.
//!
//! Each stage runs on its own [`WorkerPool`] sized from [`PoolConfig`]. Failures are recorded
//! per rig and never retried; a rig that fails in one stage simply does not reach the next.
//! When the sink rejects the final insert, every image stored for the rejected rigs is removed
//! again before the failure is reported.
//!
//! Composition order across workers is not fixed. With a seeded randomness source the batch is
//! only reproducible when `compose_workers` is 1.

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    catalog::model::Original,
    compose::{
        composer::{ComposeMode, RigComposer},
        random::RandomnessSource,
        rig::{ImageRef, ImageVariant, Rig},
    },
    config::engine::PoolConfig,
    foundation::error::{ErrorKind, RigError, RigResult},
    pool::{
        cancel::CancelToken,
        worker::{Job, JobResult, WorkerPool},
    },
    publish::{sink::RigSink, store::ImageStore},
    render::rig::{RenderedRig, RigRenderer},
};

/// Which rigs a batch produces.
///
/// Ids are consecutive from `start_id`. The first `originals.len()` ids reproduce the listed
/// archetypes in order; the remaining `count` ids are random.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub count: usize,
    pub start_id: u64,
    pub originals: Vec<Original>,
}

impl BatchPlan {
    pub fn random(count: usize, start_id: u64) -> Self {
        Self {
            count,
            start_id,
            originals: Vec::new(),
        }
    }

    pub fn with_originals(mut self, originals: Vec<Original>) -> Self {
        self.originals = originals;
        self
    }

    pub fn len(&self) -> usize {
        self.originals.len() + self.count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(id, mode)` for every rig in the plan.
    pub fn requests(&self) -> Vec<(u64, ComposeMode)> {
        let originals = self
            .originals
            .iter()
            .cloned()
            .map(ComposeMode::Original);
        let random = std::iter::repeat_n(ComposeMode::Random, self.count);
        (self.start_id..)
            .zip(originals.chain(random))
            .collect()
    }
}

/// Stage in which a rig failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BatchStage {
    Compose,
    Render,
    Store,
    Insert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub id: u64,
    pub stage: BatchStage,
    pub kind: ErrorKind,
    pub message: String,
}

impl BatchFailure {
    fn new(id: u64, stage: BatchStage, err: &RigError) -> Self {
        Self {
            id,
            stage,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// What a batch produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub requested: usize,
    pub composed: usize,
    pub rendered: usize,
    pub published: usize,
    /// Inserted rigs, ascending by id.
    pub rigs: Vec<Rig>,
    /// Failures, ascending by id.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.published == self.requested
    }

    pub fn cancelled(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.kind == ErrorKind::Cancelled)
            .count()
    }
}

/// Collaborators a batch runs against.
pub struct BatchEngine {
    pub composer: Arc<RigComposer>,
    pub renderer: Arc<RigRenderer>,
    pub store: Arc<dyn ImageStore>,
    pub sink: Arc<dyn RigSink>,
    pub rng: Arc<dyn RandomnessSource>,
    pub pools: PoolConfig,
}

/// Run `plan` to completion or cancellation.
///
/// Returns `Err` only when the pools or their worker threads cannot be set up; per-rig failures
/// are in the report.
#[tracing::instrument(skip_all, fields(rigs = plan.len(), start = plan.start_id))]
pub fn run_batch(
    engine: &BatchEngine,
    plan: &BatchPlan,
    cancel: &CancelToken,
) -> RigResult<BatchReport> {
    engine.pools.validate()?;
    let compose_pool = WorkerPool::named(
        "compose",
        engine.pools.compose_workers,
        engine.pools.compose_limit(),
    )?;
    let render_pool = WorkerPool::named(
        "render",
        engine.pools.render_workers,
        engine.pools.render_limit(),
    )?;
    let publish_pool = WorkerPool::named(
        "publish",
        engine.pools.publish_workers,
        engine.pools.publish_limit(),
    )?;

    let mut report = BatchReport {
        requested: plan.len(),
        ..BatchReport::default()
    };

    let jobs = plan
        .requests()
        .into_iter()
        .map(|(id, mode)| {
            let composer = Arc::clone(&engine.composer);
            let rng = Arc::clone(&engine.rng);
            Job::new(id, move |_: &CancelToken| composer.compose(id, &mode, rng.as_ref()))
        })
        .collect();
    let composed = collect(
        compose_pool.run_all(cancel, jobs)?,
        BatchStage::Compose,
        &mut report,
    );
    report.composed = composed.len();

    let jobs = composed
        .into_values()
        .map(|rig| {
            let renderer = Arc::clone(&engine.renderer);
            Job::new(rig.id, move |_: &CancelToken| {
                let rendered = renderer.render(&rig)?;
                Ok((rig, rendered))
            })
        })
        .collect();
    let rendered = collect(
        render_pool.run_all(cancel, jobs)?,
        BatchStage::Render,
        &mut report,
    );
    report.rendered = rendered.len();

    let jobs = rendered
        .into_values()
        .map(|(rig, images)| {
            let store = Arc::clone(&engine.store);
            Job::new(rig.id, move |_: &CancelToken| store_images(store.as_ref(), rig, &images))
        })
        .collect();
    let stored = collect(
        publish_pool.run_all(cancel, jobs)?,
        BatchStage::Store,
        &mut report,
    );

    let rigs: Vec<Rig> = stored.into_values().collect();
    if !rigs.is_empty() {
        let inserted = if cancel.is_cancelled() {
            Err(RigError::cancelled("batch cancelled before insert"))
        } else {
            engine.sink.insert_rigs(&rigs)
        };
        match inserted {
            Ok(()) => {
                report.published = rigs.len();
                report.rigs = rigs;
            }
            Err(e) => {
                tracing::warn!(rigs = rigs.len(), error = %e, "insert failed, removing stored images");
                for rig in &rigs {
                    remove_images(engine.store.as_ref(), &rig.images);
                    report
                        .failures
                        .push(BatchFailure::new(rig.id, BatchStage::Insert, &e));
                }
            }
        }
    }

    report.failures.sort_by_key(|f| (f.id, f.stage));
    tracing::info!(
        requested = report.requested,
        composed = report.composed,
        rendered = report.rendered,
        published = report.published,
        failed = report.failures.len(),
        "batch finished"
    );
    Ok(report)
}

fn collect<T>(
    results: Vec<JobResult<T>>,
    stage: BatchStage,
    report: &mut BatchReport,
) -> BTreeMap<u64, T> {
    let mut ok = BTreeMap::new();
    for JobResult { id, outcome } in results {
        match outcome {
            Ok(v) => {
                ok.insert(id, v);
            }
            Err(e) => report.failures.push(BatchFailure::new(id, stage, &e)),
        }
    }
    ok
}

/// Store every variant of `rendered` and attach the references. A failed put removes the
/// variants already stored for this rig.
fn store_images(store: &dyn ImageStore, mut rig: Rig, rendered: &RenderedRig) -> RigResult<Rig> {
    let mut refs: Vec<ImageRef> = Vec::with_capacity(ImageVariant::ALL.len());
    for variant in ImageVariant::ALL {
        match store.put(rig.id, variant, rendered.variant(variant)) {
            Ok(r) => refs.push(r),
            Err(e) => {
                remove_images(store, &refs);
                return Err(e);
            }
        }
    }
    if let Err(e) = rig.attach_images(refs.clone()) {
        remove_images(store, &refs);
        return Err(e);
    }
    Ok(rig)
}

fn remove_images(store: &dyn ImageStore, images: &[ImageRef]) {
    for image in images {
        if let Err(e) = store.remove(image) {
            tracing::error!(locator = %image.locator, error = %e, "failed to remove stored image");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/batch.rs"]
mod tests;
