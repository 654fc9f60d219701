use clap::{Parser, Subcommand, ValueEnum};
use cropvariant::config::{self, Config};
use cropvariant::imaging::RustBackend;
use cropvariant::materialize::Materializer;
use cropvariant::output::{self, Outcome, ResizeRecord};
use cropvariant::storage::{ImageReference, StorageError};
use cropvariant::transform::TransformSpec;
use std::path::PathBuf;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "cropvariant")]
#[command(about = "Resized and cropped image variants, cached next to their originals")]
#[command(long_about = "\
Resized and cropped image variants, cached next to their originals

Sources are public URLs under the configured uploads base URL, or numeric
attachment IDs listed in the config's [attachments] table. Each variant is
written beside its original with the size and crop position in its name:

  uploads/2017/12/wallpaper.jpg            original
  uploads/2017/12/wallpaper-400x200.jpg    --width 400
  uploads/2017/12/wallpaper-ct-345x120.jpg --width 345 --height 120 --crop top

Crop flags apply in order. Naming one axis centers the other unless it is
named too: '--crop top' is center/top, '--crop top --crop left' is left/top.

Run 'cropvariant gen-config' to generate a documented cropvariant.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "cropvariant.toml", global = true)]
    config: PathBuf,

    /// Log debug details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce (or find) a variant for each source
    Resize(ResizeArgs),
    /// Print a stock cropvariant.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ResizeArgs {
    /// Image URLs or attachment IDs
    #[arg(required = true)]
    sources: Vec<String>,

    /// Target width in pixels
    #[arg(long, allow_negative_numbers = true)]
    width: Option<i64>,

    /// Target height in pixels
    #[arg(long, allow_negative_numbers = true)]
    height: Option<i64>,

    /// Crop to the exact size; repeat to set both axes
    #[arg(long, value_enum)]
    crop: Vec<CropArg>,

    /// Encoding quality (1-100), overrides the config
    #[arg(long)]
    quality: Option<u32>,

    /// Return existing variants of the right size without re-encoding
    #[arg(long)]
    reuse: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CropArg {
    Top,
    Bottom,
    Middle,
    Left,
    Right,
    Center,
    /// Centered on both axes
    Both,
}

impl ResizeArgs {
    fn spec(&self) -> TransformSpec {
        let mut spec = TransformSpec::new();
        if let Some(w) = self.width {
            spec = spec.width(w);
        }
        if let Some(h) = self.height {
            spec = spec.height(h);
        }
        for crop in &self.crop {
            spec = match crop {
                CropArg::Top => spec.crop_top(),
                CropArg::Bottom => spec.crop_bottom(),
                CropArg::Middle => spec.crop_middle(),
                CropArg::Left => spec.crop_left(),
                CropArg::Right => spec.crop_right(),
                CropArg::Center => spec.crop_center(),
                CropArg::Both => spec.crop(),
            };
        }
        spec
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Resize(args) => {
            let mut config = config::load_config(&cli.config)?;
            if let Some(q) = args.quality {
                config.output.quality = q;
                config.validate()?;
            }
            if args.reuse {
                config.cache.reuse_existing = true;
            }
            init_thread_pool(&config.processing);
            debug!(config = %cli.config.display(), "configuration loaded");

            let records = resize(&config, &args);
            if args.json {
                output::print_resize_json(&records)?;
            } else {
                output::print_resize_output(&records);
            }
            if records
                .iter()
                .any(|r| matches!(r.outcome, Outcome::Failed { .. }))
            {
                return Err("some requests failed".into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Resolve every source, materialize the valid ones in parallel, and report
/// in command-line order.
fn resize(config: &Config, args: &ResizeArgs) -> Vec<ResizeRecord> {
    let materializer = Materializer::from_config(RustBackend::new(), config);
    debug!(
        quality = materializer.options().quality.value(),
        reuse = materializer.options().reuse_existing,
        scheme = %materializer.mapping().scheme(),
        "materializer ready"
    );
    let spec = args.spec();

    let references: Vec<Result<ImageReference, StorageError>> = args
        .sources
        .iter()
        .map(|source| match source.parse::<u64>() {
            Ok(id) => materializer
                .mapping()
                .reference_for_attachment(id, &config.attachments),
            Err(_) => materializer.mapping().reference(source),
        })
        .collect();

    let requests: Vec<(ImageReference, TransformSpec)> = references
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|image| (image.clone(), spec.clone()))
        .collect();
    let mut results = materializer.materialize_all(&requests).into_iter();

    args.sources
        .iter()
        .zip(references)
        .map(|(source, reference)| {
            let outcome = match reference {
                Err(err) => Outcome::Failed {
                    error: err.to_string(),
                },
                Ok(image) => match results.next() {
                    Some(Ok(asset)) if asset.path == image.path() => Outcome::Original(asset),
                    Some(Ok(asset)) => Outcome::Variant(asset),
                    Some(Err(err)) => Outcome::Failed {
                        error: err.to_string(),
                    },
                    None => Outcome::Failed {
                        error: "no result".into(),
                    },
                },
            };
            ResizeRecord {
                source: source.clone(),
                outcome,
            }
        })
        .collect()
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
