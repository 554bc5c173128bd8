use std::path::Path;

use super::*;
use crate::{
    compose::random::SeededRandom,
    config::engine::RenderConfig,
    publish::{sink::MemorySink, store::DirImageStore},
    render::rig::LayerLoader,
    test_support::{
        MemoryLoader, fixture_catalog, fixture_loader, fixture_ranks, kestrel_hawk, zephyr_ace,
    },
};

fn pools() -> PoolConfig {
    PoolConfig {
        compose_workers: 1,
        render_workers: 2,
        publish_workers: 2,
        compose_rate: None,
        render_rate: None,
        publish_rate: None,
    }
}

fn engine(
    loader: MemoryLoader,
    store: Arc<dyn ImageStore>,
    sink: Arc<MemorySink>,
) -> BatchEngine {
    let catalog: Arc<dyn crate::catalog::source::Catalog> = Arc::new(fixture_catalog());
    let loader: Arc<dyn LayerLoader> = Arc::new(loader);
    let render = RenderConfig {
        width: 8,
        height: 8,
        thumb_width: 4,
        thumb_height: 4,
        ..RenderConfig::default()
    };
    BatchEngine {
        composer: Arc::new(RigComposer::new(Arc::clone(&catalog), Arc::new(fixture_ranks()))),
        renderer: Arc::new(RigRenderer::new(catalog, loader, render).unwrap()),
        store,
        sink,
        rng: Arc::new(SeededRandom::new(7)),
        pools: pools(),
    }
}

fn png_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Store that fails every thumbnail put.
struct NoThumbs(DirImageStore);

impl ImageStore for NoThumbs {
    fn put(&self, rig_id: u64, variant: ImageVariant, png: &[u8]) -> RigResult<ImageRef> {
        if variant == ImageVariant::Thumb {
            return Err(RigError::resource("thumbnail bucket unavailable"));
        }
        self.0.put(rig_id, variant, png)
    }

    fn remove(&self, image: &ImageRef) -> RigResult<()> {
        self.0.remove(image)
    }
}

#[test]
fn plan_lists_originals_before_random_rigs() {
    let plan = BatchPlan::random(2, 10).with_originals(vec![zephyr_ace()]);
    assert_eq!(plan.len(), 3);
    let requests = plan.requests();
    assert_eq!(requests[0], (10, ComposeMode::Original(zephyr_ace())));
    assert_eq!(requests[1], (11, ComposeMode::Random));
    assert_eq!(requests[2], (12, ComposeMode::Random));
    assert!(BatchPlan::default().is_empty());
}

#[test]
fn full_batch_publishes_every_rig() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirImageStore::create(dir.path()).unwrap());
    let sink = Arc::new(MemorySink::new());
    let engine = engine(fixture_loader(8, 8), store, Arc::clone(&sink));

    let plan = BatchPlan::random(4, 100).with_originals(vec![zephyr_ace()]);
    let report = run_batch(&engine, &plan, &CancelToken::new()).unwrap();

    assert!(report.is_complete(), "{:?}", report.failures);
    assert_eq!(report.published, 5);
    let ids: Vec<u64> = report.rigs.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![100, 101, 102, 103, 104]);
    assert!(report.rigs[0].original);
    assert!(report.rigs.iter().all(|r| r.images.len() == 3));
    assert_eq!(sink.len(), 5);
    assert_eq!(png_count(dir.path()), 15);
}

#[test]
fn compose_failures_are_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirImageStore::create(dir.path()).unwrap());
    let sink = Arc::new(MemorySink::new());
    let engine = engine(fixture_loader(8, 8), store, Arc::clone(&sink));

    let plan = BatchPlan::random(2, 1).with_originals(vec![kestrel_hawk()]);
    let report = run_batch(&engine, &plan, &CancelToken::new()).unwrap();

    assert_eq!(report.composed, 2);
    assert_eq!(report.published, 2);
    assert_eq!(report.failures.len(), 1);
    let f = &report.failures[0];
    assert_eq!((f.id, f.stage, f.kind), (1, BatchStage::Compose, ErrorKind::Config));
}

#[test]
fn render_failures_skip_storage() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirImageStore::create(dir.path()).unwrap());
    let sink = Arc::new(MemorySink::new());
    let mut loader = fixture_loader(8, 8);
    loader.files.retain(|p, _| !p.starts_with("zephyr/cockpit"));
    let engine = engine(loader, store, Arc::clone(&sink));

    let plan = BatchPlan::random(0, 1).with_originals(vec![zephyr_ace()]);
    let report = run_batch(&engine, &plan, &CancelToken::new()).unwrap();

    assert_eq!(report.composed, 1);
    assert_eq!(report.rendered, 0);
    assert_eq!(report.failures[0].stage, BatchStage::Render);
    assert_eq!(report.failures[0].kind, ErrorKind::Resource);
    assert_eq!(png_count(dir.path()), 0);
    assert!(sink.is_empty());
}

#[test]
fn partial_store_is_rolled_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(NoThumbs(DirImageStore::create(dir.path()).unwrap()));
    let sink = Arc::new(MemorySink::new());
    let engine = engine(fixture_loader(8, 8), store, Arc::clone(&sink));

    let report = run_batch(&engine, &BatchPlan::random(3, 1), &CancelToken::new()).unwrap();

    assert_eq!(report.rendered, 3);
    assert_eq!(report.published, 0);
    assert!(report.failures.iter().all(|f| f.stage == BatchStage::Store));
    assert_eq!(png_count(dir.path()), 0);
}

#[test]
fn rejected_insert_removes_stored_images() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirImageStore::create(dir.path()).unwrap());
    let sink = Arc::new(MemorySink::new());
    sink.reject_with("read-only replica");
    let engine = engine(fixture_loader(8, 8), store, Arc::clone(&sink));

    let report = run_batch(&engine, &BatchPlan::random(3, 1), &CancelToken::new()).unwrap();

    assert_eq!(report.published, 0);
    assert_eq!(report.failures.len(), 3);
    assert!(report.failures.iter().all(|f| f.stage == BatchStage::Insert));
    assert!(report.failures[0].message.contains("read-only replica"));
    assert_eq!(png_count(dir.path()), 0);
}

#[test]
fn cancelled_batch_reports_cancellations() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirImageStore::create(dir.path()).unwrap());
    let sink = Arc::new(MemorySink::new());
    let engine = engine(fixture_loader(8, 8), store, Arc::clone(&sink));

    let cancel = CancelToken::new();
    cancel.cancel();
    let report = run_batch(&engine, &BatchPlan::random(4, 1), &cancel).unwrap();

    assert_eq!(report.composed, 0);
    assert_eq!(report.cancelled(), 4);
    assert!(report.failures.iter().all(|f| f.stage == BatchStage::Compose));
    assert!(sink.is_empty());
}
