use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use featurefx::{
    BufferHandle, BufferKind, FeatureCollection, FrameContext, LayerConfig, LayerController,
    LayerState, PoolManager, ProgramHandle, RenderHost, ShaderRegistry, SimplifyWorker,
    TimeOffsetCalculator, TimingConfig, Uniforms, VertexLayout,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "featurefx", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the GPU buffers for a feature collection and print a summary.
    Build(BuildArgs),
    /// Print the per-feature animation offsets of a timing mode.
    Offsets(OffsetsArgs),
    /// List the registered shader definitions.
    Shaders,
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Input GeoJSON FeatureCollection.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Layer configuration JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the layer's shader name.
    #[arg(long)]
    shader: Option<String>,

    /// Map zoom that `["zoom"]` expressions evaluate against.
    #[arg(long, default_value_t = 0.0)]
    zoom: f64,

    /// Render this many frames at 60 fps after the build.
    #[arg(long, default_value_t = 0)]
    frames: u32,
}

#[derive(Parser, Debug)]
struct OffsetsArgs {
    /// Input GeoJSON FeatureCollection.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Timing mode as JSON, e.g. '{"mode":"stagger","step":0.1}'.
    #[arg(long)]
    timing: Option<String>,

    /// Layer configuration JSON; its `timing` is used when `--timing` is absent.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Offsets(args) => cmd_offsets(args),
        Command::Shaders => cmd_shaders(),
    }
}

fn read_features(path: &Path) -> anyhow::Result<FeatureCollection> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("read features '{}'", path.display()))?;
    FeatureCollection::from_json_str(&s)
        .with_context(|| format!("parse GeoJSON '{}'", path.display()))
}

fn read_config(path: Option<&Path>) -> anyhow::Result<LayerConfig> {
    let Some(path) = path else {
        return Ok(LayerConfig::default());
    };
    let s =
        fs::read_to_string(path).with_context(|| format!("read config '{}'", path.display()))?;
    LayerConfig::from_json_str(&s).with_context(|| format!("parse config '{}'", path.display()))
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let features = read_features(&args.in_path)?;
    let mut config = read_config(args.config.as_deref())?;
    if let Some(shader) = args.shader {
        config.shader = shader;
    }

    let registry = ShaderRegistry::with_builtins();
    let pools = PoolManager::new(config.pools);
    let simplify = config.simplify.is_some();
    let mut layer = LayerController::new(config, &registry, pools);
    if simplify {
        layer = layer.with_worker(SimplifyWorker::spawn()?);
    }

    layer.set_zoom(args.zoom);

    let mut host = HeadlessHost::default();
    layer
        .initialize(&mut host)
        .with_context(|| format!("initialize layer '{}'", layer.id()))?;
    layer
        .rebuild(&mut host, &features.features)
        .with_context(|| format!("build layer '{}'", layer.id()))?;

    for i in 0..args.frames {
        let frame = FrameContext {
            zoom: args.zoom,
            ..FrameContext::at(f64::from(i) / 60.0, 1.0 / 60.0)
        };
        layer.render(&mut host, &frame);
    }

    let summary = layer
        .last_build()
        .context("build produced no summary")?;
    println!("layer:       {}", layer.id());
    println!("shader:      {}", layer.config().shader);
    println!("features:    {}", features.len());
    println!("skipped:     {}", summary.skipped_features);
    println!("vertices:    {}", summary.vertex_count);
    println!("indices:     {}", summary.index_count);
    println!("bytes:       {}", host.uploaded_bytes);
    println!("draws:       {}", host.draws);
    println!("fingerprint: {}", summary.fingerprint);

    let stats = layer.pool_stats();
    println!(
        "pools:       {} created, {} in use",
        stats.total_created(),
        stats.in_use()
    );

    layer.dispose(&mut host);
    anyhow::ensure!(
        layer.state() != LayerState::Error,
        "layer '{}' ended in error state",
        layer.id()
    );
    Ok(())
}

fn cmd_offsets(args: OffsetsArgs) -> anyhow::Result<()> {
    let features = read_features(&args.in_path)?;
    let config = read_config(args.config.as_deref())?;
    let timing: TimingConfig = match args.timing {
        Some(s) => serde_json::from_str(&s).with_context(|| "parse --timing JSON")?,
        None => config.timing.clone(),
    };

    let offsets = TimeOffsetCalculator::new()
        .calculate_offsets(&features.features, &timing, config.id_property())
        .with_context(|| "compute offsets")?;

    for (i, (feature, offset)) in features.features.iter().zip(&offsets).enumerate() {
        let id = feature.resolve_id(i, config.id_property());
        println!("{i}\t{id}\t{offset:.6}");
    }
    Ok(())
}

fn cmd_shaders() -> anyhow::Result<()> {
    let registry = ShaderRegistry::with_builtins();
    for name in registry.names() {
        let def = registry
            .get(name)
            .with_context(|| format!("resolve shader '{name}'"))?;
        let fields: Vec<&str> = def.schema.fields.iter().map(|f| f.name.as_str()).collect();
        println!("{name}\t{}\t{}", def.class, fields.join(","));
    }
    Ok(())
}

/// A render host without a GPU: hands out handles and counts traffic.
#[derive(Default)]
struct HeadlessHost {
    next_handle: u64,
    uploaded_bytes: usize,
    draws: usize,
}

impl HeadlessHost {
    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl RenderHost for HeadlessHost {
    fn compile_program(
        &mut self,
        _vertex: &str,
        _fragment: &str,
    ) -> featurefx::FxResult<ProgramHandle> {
        Ok(ProgramHandle(self.handle()))
    }

    fn create_buffer(&mut self, _kind: BufferKind) -> featurefx::FxResult<BufferHandle> {
        Ok(BufferHandle(self.handle()))
    }

    fn upload_buffer(&mut self, _buffer: BufferHandle, bytes: &[u8]) {
        self.uploaded_bytes += bytes.len();
    }

    fn bind_attributes(
        &mut self,
        _program: ProgramHandle,
        _buffer: BufferHandle,
        _layout: &'static VertexLayout,
    ) {
    }

    fn set_uniforms(&mut self, _program: ProgramHandle, _uniforms: &Uniforms) {}

    fn draw_indexed(&mut self, _program: ProgramHandle, _indices: BufferHandle, _count: usize) {
        self.draws += 1;
    }

    fn delete_buffer(&mut self, _buffer: BufferHandle) {}

    fn delete_program(&mut self, _program: ProgramHandle) {}
}
