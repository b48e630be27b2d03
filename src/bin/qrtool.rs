use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use qr_cascade::tools::{
    ReadingRate, bench_limit_from_env, black_ratio, dataset_iter, dataset_root_from_env,
    load_buffer, luma_stats, options_from_env, parse_expected_qr_count, smoke_from_env,
};
use qr_cascade::utils::binarization::Rgb;
use qr_cascade::{
    ColorHint, DecodeOptions, DecodeResult, HintStrategy, ImageInput, PipelineBuilder,
};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "Multi-pass QR decoding tools")]
struct Cli {
    /// Log pass generation and engine hits to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode QR codes in a single image
    Decode {
        image: PathBuf,
        /// Report every distinct code instead of the first
        #[arg(long)]
        all: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// List the preprocessing passes generated for an image
    Passes {
        image: PathBuf,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Compute reading rate on a labelled dataset
    ReadingRate {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Time one decode per dataset image
    DatasetBench {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        options: OptionArgs,
    },
}

#[derive(Args)]
struct DatasetArgs {
    /// Dataset root (default: QR_DATASET_ROOT)
    #[arg(long)]
    root: Option<PathBuf>,
    /// Stop after this many images (default: QR_BENCH_LIMIT)
    #[arg(long)]
    limit: Option<usize>,
    /// Only images listed in `_smoke.txt` (default: QR_SMOKE)
    #[arg(long)]
    smoke: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    LumaMidpoint,
    ColorDistance,
}

#[derive(Args)]
struct OptionArgs {
    /// Raise the pass budget to 12
    #[arg(long)]
    aggressive: bool,
    /// Hard cap on preprocessing passes
    #[arg(long)]
    max_passes: Option<usize>,
    /// Longest side images are downscaled to (default: QR_MAX_DIM or 1400)
    #[arg(long)]
    max_dim: Option<u32>,
    /// Skip inverted variants
    #[arg(long)]
    no_invert: bool,
    /// Expected module colour, `r,g,b`
    #[arg(long, value_parser = parse_rgb, requires = "bg")]
    fg: Option<Rgb>,
    /// Expected background colour, `r,g,b`
    #[arg(long, value_parser = parse_rgb, requires = "fg")]
    bg: Option<Rgb>,
    /// Binarizer for the colour hint pass
    #[arg(long, value_enum, default_value = "luma-midpoint")]
    strategy: StrategyArg,
    /// Decode on the calling thread instead of a worker
    #[arg(long)]
    no_worker: bool,
}

impl OptionArgs {
    fn to_options(&self) -> DecodeOptions {
        let mut options = options_from_env(DecodeOptions::default())
            .try_invert(!self.no_invert)
            .worker(!self.no_worker);
        if self.aggressive {
            options = options.aggressive(true);
        }
        if let Some(max_passes) = self.max_passes {
            options = options.max_passes(max_passes);
        }
        if let Some(max_dim) = self.max_dim {
            options = options.downscale_max_dim(max_dim);
        }
        if let (Some(fg), Some(bg)) = (self.fg, self.bg) {
            let strategy = match self.strategy {
                StrategyArg::LumaMidpoint => HintStrategy::LumaMidpoint,
                StrategyArg::ColorDistance => HintStrategy::ColorDistance,
            };
            options = options.color_hint(ColorHint::new(fg, bg).with_strategy(strategy));
        }
        options
    }
}

fn parse_rgb(value: &str) -> Result<Rgb, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected r,g,b, got `{value}`"));
    };
    let channel = |s: &str| s.parse::<u8>().map_err(|e| format!("bad channel `{s}`: {e}"));
    Ok([channel(*r)?, channel(*g)?, channel(*b)?])
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Decode {
            image,
            all,
            json,
            options,
        } => decode_cmd(&image, all, json, &options.to_options()),
        Command::Passes { image, options } => passes_cmd(&image, &options.to_options()),
        Command::ReadingRate { dataset, options } => {
            reading_rate_cmd(dataset, &options.to_options())
        }
        Command::DatasetBench { dataset, options } => {
            dataset_bench_cmd(dataset, &options.to_options())
        }
    }
}

fn decode_cmd(image: &Path, all: bool, json: bool, options: &DecodeOptions) -> Result<()> {
    let input = ImageInput::path(image);
    let start = Instant::now();
    let results: Vec<DecodeResult> = if all {
        qr_cascade::decode_all_blocking(&input, options)
    } else {
        qr_cascade::decode_blocking(&input, options).map(|r| r.into_iter().collect())
    }
    .with_context(|| format!("failed to decode {}", image.display()))?;
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("Image: {} ({:.2?})", image.display(), elapsed);
    println!("Found {} QR codes", results.len());
    for (i, r) in results.iter().enumerate() {
        println!(
            "  QR {}: engine={} pass={} inverted={} text={}",
            i,
            r.meta.engine,
            r.meta.pass_name.as_deref().unwrap_or("source"),
            r.meta.inverted_flag.unwrap_or(false),
            r.text
        );
    }
    Ok(())
}

fn passes_cmd(image: &Path, options: &DecodeOptions) -> Result<()> {
    let buffer = load_buffer(image, options)
        .with_context(|| format!("failed to load {}", image.display()))?;
    let stats = luma_stats(&buffer);
    println!(
        "Image: {} ({}x{}), luma {}-{} avg {}",
        image.display(),
        buffer.width(),
        buffer.height(),
        stats.min,
        stats.max,
        stats.avg
    );

    let builder = PipelineBuilder::new(options);
    let start = Instant::now();
    let passes = builder.build(&buffer);
    println!(
        "{} passes (budget {}) built in {:.2?}",
        passes.len(),
        builder.max_passes(),
        start.elapsed()
    );
    for (i, pass) in passes.iter().enumerate() {
        println!(
            "  {:>2}: {:<36} black={:.1}%",
            i,
            pass.name,
            black_ratio(&pass.buffer) * 100.0
        );
    }
    Ok(())
}

fn dataset_images(dataset: &DatasetArgs) -> Result<(PathBuf, Vec<PathBuf>)> {
    let root = dataset.root.clone().unwrap_or_else(dataset_root_from_env);
    if !root.exists() {
        bail!("dataset root not found: {}", root.display());
    }
    let limit = dataset.limit.or_else(bench_limit_from_env);
    let smoke = dataset.smoke || smoke_from_env();
    let images: Vec<PathBuf> = dataset_iter(&root, limit, smoke).collect();
    if images.is_empty() {
        bail!("no images found under {}", root.display());
    }
    Ok((root, images))
}

/// First path component under `root`, used as the dataset category.
fn category_of(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .ok()
        .and_then(|rel| {
            let mut components = rel.components();
            let first = components.next()?;
            components.next().map(|_| first.as_os_str().to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| ".".to_string())
}

fn reading_rate_cmd(dataset: DatasetArgs, options: &DecodeOptions) -> Result<()> {
    let (root, images) = dataset_images(&dataset)?;

    println!("QR Code Reading Rate");
    println!("====================\n");

    let mut by_category: Vec<(String, ReadingRate)> = Vec::new();
    for path in images {
        let label = path.with_extension("txt");
        if !label.exists() {
            continue;
        }
        let expected = parse_expected_qr_count(&label);
        let (found, elapsed) = match load_buffer(&path, options) {
            Ok(buffer) => {
                let start = Instant::now();
                let results = qr_cascade::decode_all_from_buffer_blocking(&buffer, options);
                (results.len(), start.elapsed())
            }
            Err(err) => {
                eprintln!("  skipping {}: {}", path.display(), err);
                continue;
            }
        };
        println!(
            "  [{}] {} -> {}/{} ({:.2?})",
            if found > 0 { "HIT" } else { "MISS" },
            path.display(),
            found,
            expected,
            elapsed
        );

        let category = category_of(&root, &path);
        let index = match by_category.iter().position(|(name, _)| *name == category) {
            Some(index) => index,
            None => {
                by_category.push((category, ReadingRate::default()));
                by_category.len() - 1
            }
        };
        by_category[index].1.record(expected, found, elapsed);
    }

    if by_category.is_empty() {
        println!("No labelled images found under {}", root.display());
        return Ok(());
    }

    println!();
    let mut total = ReadingRate::default();
    for (category, rate) in &by_category {
        println!(
            "  {:<16} images {}/{} = {:.2}%  codes {}/{} = {:.2}%",
            category,
            rate.decoded,
            rate.labelled,
            rate.image_rate(),
            rate.found_codes,
            rate.expected_codes,
            rate.code_rate()
        );
        total.merge(rate);
    }
    let average = by_category
        .iter()
        .map(|(_, r)| r.image_rate())
        .sum::<f64>()
        / by_category.len() as f64;

    println!("\n====================");
    println!("Average Reading Rate: {:.2}%", average);
    println!(
        "Overall: {}/{} images, {}/{} codes, {:.2?} decoding",
        total.decoded, total.labelled, total.found_codes, total.expected_codes, total.elapsed
    );
    Ok(())
}

fn dataset_bench_cmd(dataset: DatasetArgs, options: &DecodeOptions) -> Result<()> {
    let (_, images) = dataset_images(&dataset)?;

    let mut decoded = 0usize;
    let mut total_ms = 0.0f64;
    let mut timed = 0usize;
    for path in &images {
        let buffer = match load_buffer(path, options) {
            Ok(buffer) => buffer,
            Err(err) => {
                eprintln!("  skipping {}: {}", path.display(), err);
                continue;
            }
        };
        let start = Instant::now();
        let hit = qr_cascade::decode_from_buffer_blocking(&buffer, options).is_some();
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        total_ms += ms;
        timed += 1;
        if hit {
            decoded += 1;
        }
        println!("  {} -> {} ({:.2} ms)", path.display(), if hit { "HIT" } else { "MISS" }, ms);
    }

    if timed > 0 {
        println!(
            "\n{} images, {} decoded, avg {:.2} ms/image",
            timed,
            decoded,
            total_ms / timed as f64
        );
    }
    Ok(())
}
