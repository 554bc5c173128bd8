use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rigs", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose, render and publish a batch of rigs.
    Generate(GenerateArgs),
    /// Stack images in argument order into one PNG.
    RenderLayers(RenderLayersArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Engine config JSON (ranks, layer order, render and pool settings).
    #[arg(long)]
    config: PathBuf,

    /// Catalog manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Directory layer paths are resolved against.
    #[arg(long)]
    assets: PathBuf,

    /// Output directory for PNGs and `rigs.jsonl`.
    #[arg(long)]
    out: PathBuf,

    /// Number of random rigs.
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Id of the first rig.
    #[arg(long, default_value_t = 1)]
    start_id: u64,

    /// Also reproduce every archetype in the manifest, ahead of the random rigs.
    #[arg(long)]
    originals: bool,

    /// Seed for reproducible batches. Forces a single composition worker.
    #[arg(long)]
    seed: Option<u64>,

    /// Draw layer labels on full and alpha renders.
    #[arg(long)]
    labels: bool,

    /// Cancel the batch after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Parser, Debug)]
struct RenderLayersArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    /// Label each layer with its file name.
    #[arg(long)]
    labels: bool,

    #[arg(long, value_enum, default_value_t = CompressionChoice::Default)]
    compression: CompressionChoice,

    /// Layer images, bottom first.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompressionChoice {
    Default,
    Fast,
    Best,
}

impl From<CompressionChoice> for rigs::PngCompression {
    fn from(c: CompressionChoice) -> Self {
        match c {
            CompressionChoice::Default => rigs::PngCompression::Default,
            CompressionChoice::Fast => rigs::PngCompression::Fast,
            CompressionChoice::Best => rigs::PngCompression::Best,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::RenderLayers(args) => cmd_render_layers(args),
    }
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut cfg = rigs::EngineConfig::load(&args.config)?;
    if args.labels {
        cfg.render.labels = true;
    }
    if args.seed.is_some() && cfg.pool.compose_workers != 1 {
        tracing::info!(
            configured = cfg.pool.compose_workers,
            "seeded run, composing on a single worker"
        );
        cfg.pool.compose_workers = 1;
    }

    let catalog = rigs::ManifestCatalog::load(&args.manifest, &cfg.layer_order)?;
    let originals = if args.originals {
        rigs::Catalog::originals(&catalog)?
    } else {
        Vec::new()
    };
    let catalog: Arc<dyn rigs::Catalog> = Arc::new(catalog);

    let rng: Arc<dyn rigs::RandomnessSource> = match args.seed {
        Some(seed) => Arc::new(rigs::SeededRandom::new(seed)),
        None => Arc::new(rigs::OsRandom),
    };

    let composer = rigs::RigComposer::new(Arc::clone(&catalog), Arc::new(cfg.ranks.clone()))
        .with_exclusions(cfg.original_exclusions.clone());
    let renderer = rigs::RigRenderer::new(
        catalog,
        Arc::new(rigs::FsLayerLoader::new(&args.assets)),
        cfg.render,
    )?;
    let store = rigs::DirImageStore::create(&args.out)?;
    let sink = rigs::JsonLinesSink::open(args.out.join("rigs.jsonl"))?;

    let engine = rigs::BatchEngine {
        composer: Arc::new(composer),
        renderer: Arc::new(renderer),
        store: Arc::new(store),
        sink: Arc::new(sink),
        rng,
        pools: cfg.pool,
    };
    let plan = rigs::BatchPlan::random(args.count, args.start_id).with_originals(originals);
    let cancel = match args.timeout_secs {
        Some(secs) => rigs::CancelToken::with_timeout(Duration::from_secs(secs)),
        None => rigs::CancelToken::new(),
    };

    let report = rigs::run_batch(&engine, &plan, &cancel)?;
    for f in &report.failures {
        eprintln!("rig {} failed during {:?}: {}", f.id, f.stage, f.message);
    }
    eprintln!(
        "published {}/{} rigs to {}",
        report.published,
        report.requested,
        args.out.display()
    );
    if !report.failures.is_empty() {
        anyhow::bail!("{} of {} rigs failed", report.failures.len(), report.requested);
    }
    Ok(())
}

fn cmd_render_layers(args: RenderLayersArgs) -> anyhow::Result<()> {
    let mut renderer = rigs::LayerRenderer::new(args.width, args.height, args.labels)?;
    for path in &args.images {
        let bytes =
            std::fs::read(path).with_context(|| format!("read layer '{}'", path.display()))?;
        let image = rigs::decode_layer(&bytes)
            .with_context(|| format!("decode layer '{}'", path.display()))?;
        renderer.add_layer(&image, &layer_label(path))?;
    }

    let f = File::create(&args.out)
        .with_context(|| format!("create output '{}'", args.out.display()))?;
    let mut out = BufWriter::new(f);
    renderer.write(&mut out, args.compression.into())?;
    out.flush()
        .with_context(|| format!("flush output '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn layer_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
