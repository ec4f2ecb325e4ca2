use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "medflow", version)]
struct Cli {
    /// Log more (`-v` debug, `-vv` trace). `MEDFLOW_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List discovered compute devices.
    Devices,
    /// Build a pipeline from JSON and run its update rounds.
    Run(RunArgs),
    /// Print geometry and value range of an image file.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input pipeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override the number of update rounds.
    #[arg(long)]
    updates: Option<u32>,

    /// Prefer a GPU as the default device.
    #[arg(long)]
    prefer_gpu: bool,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Raster or MetaImage file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Devices => cmd_devices(),
        Command::Run(args) => cmd_run(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "medflow=debug",
        _ => "medflow=trace",
    };
    let filter = EnvFilter::try_from_env("MEDFLOW_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_devices() -> anyhow::Result<()> {
    let registry = medflow::DeviceRegistry::new();
    let devices = registry.enumerate_devices();
    if devices.is_empty() {
        eprintln!("no compute devices found");
        return Ok(());
    }
    let default = registry.default_device().ok().map(|d| d.id());
    for d in devices {
        let caps = d.capabilities();
        println!(
            "{}{:?}\t{}\thost_kernels={}\tdisplay_interop={}",
            if Some(d.id()) == default { "* " } else { "  " },
            d.kind(),
            d.name(),
            caps.host_kernels,
            caps.display_interop
        );
    }
    Ok(())
}

fn read_pipeline_json(path: &Path) -> anyhow::Result<medflow::PipelineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("open pipeline '{}'", path.display()))?;
    let cfg = medflow::PipelineConfig::from_json(&text).with_context(|| "parse pipeline JSON")?;
    Ok(cfg)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut cfg = read_pipeline_json(&args.in_path)?;
    if let Some(n) = args.updates {
        cfg.updates = n;
    }
    cfg.device.prefer_gpu |= args.prefer_gpu;
    cfg.validate()?;

    let root = medflow::config::config_root(&args.in_path);
    let mut built = cfg
        .build(Arc::new(medflow::DeviceRegistry::new()), &root)
        .with_context(|| format!("build pipeline '{}'", args.in_path.display()))?;
    let report = built.run()?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    eprintln!(
        "ran {} round(s){}",
        report.rounds,
        if report.exhausted {
            ", stream exhausted"
        } else {
            ""
        }
    );
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let img = medflow::io::read_image(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let (min, max) = img
        .samples()
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let spacing = img.spacing();
    let info = serde_json::json!({
        "rank": img.rank(),
        "width": img.width(),
        "height": img.height(),
        "depth": img.depth(),
        "channels": img.channels(),
        "data_type": img.data_type(),
        "spacing": [spacing.x, spacing.y, spacing.z],
        "min": min,
        "max": max,
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
