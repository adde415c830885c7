//! colorlens - drive the ColorLens pipeline from the command line.
//!
//! Files are decoded into an in-memory RGBA host image, so every command
//! goes through the same lock/decode/transform/encode path a mobile host does.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colorlens_core::{ColorLens, ColorLensConfig, Deficiency, DirAssetStorage};
use tracing_subscriber::EnvFilter;

mod image_loader;

use image_loader::{DemoError, load_image, save_image};

#[derive(Parser)]
#[command(name = "colorlens")]
#[command(version, about = "Color vision deficiency simulation and color naming")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Asset directory holding the model and label files
    #[arg(short, long, global = true)]
    assets: Option<PathBuf>,

    /// JSON config file; `COLORLENS_*` variables apply when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a deficiency on an image file
    #[command(visible_alias = "s")]
    Simulate(SimulateArgs),

    /// Name an RGB color given as 0-255 components
    #[command(visible_alias = "c")]
    Classify(ClassifyArgs),

    /// Name the color at a normalized position in an image
    Sample(SampleArgs),
}

#[derive(Args)]
struct SimulateArgs {
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,

    /// protan, deutan or tritan
    #[arg(short, long, default_value = "deutan", value_parser = parse_deficiency)]
    deficiency: Deficiency,

    /// 0.0 (none) to 1.0 (full)
    #[arg(short, long, default_value_t = 1.0)]
    severity: f32,
}

#[derive(Args)]
struct ClassifyArgs {
    r: u8,
    g: u8,
    b: u8,
}

#[derive(Args)]
struct SampleArgs {
    input: PathBuf,

    /// Horizontal position in [0, 1]
    #[arg(default_value_t = 0.5)]
    x: f32,

    /// Vertical position in [0, 1]
    #[arg(default_value_t = 0.5)]
    y: f32,
}

fn parse_deficiency(s: &str) -> Result<Deficiency, String> {
    match s.to_ascii_lowercase().as_str() {
        "protan" | "protanopia" | "0" => Ok(Deficiency::Protan),
        "deutan" | "deuteranopia" | "1" => Ok(Deficiency::Deutan),
        "tritan" | "tritanopia" | "2" => Ok(Deficiency::Tritan),
        other => Err(format!("unknown deficiency '{other}'")),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("COLORLENS_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ColorLensConfig, DemoError> {
    match path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            Ok(ColorLensConfig::from_json(&bytes)?)
        }
        None => Ok(ColorLensConfig::from_env()),
    }
}

fn run(cli: Cli) -> Result<(), DemoError> {
    let lens = ColorLens::new(load_config(cli.config.as_deref())?);
    if let Some(dir) = &cli.assets {
        let storage = DirAssetStorage::new(dir.clone());
        let model = lens.config().model_asset.clone();
        let summary = lens.init_model(&storage, &model)?;
        tracing::debug!("model initialized: {summary:?}");
    }

    match cli.command {
        Commands::Simulate(args) => {
            let mut image = load_image(&args.input)?;
            let report = lens.process_bitmap(&mut image, args.deficiency.code(), args.severity)?;
            tracing::info!(
                "{} at severity {} on {}x{}",
                args.deficiency,
                args.severity,
                report.width,
                report.height
            );
            save_image(&args.output, image)?;
        }
        Commands::Classify(args) => {
            let prediction = lens.classify(
                f32::from(args.r) / 255.0,
                f32::from(args.g) / 255.0,
                f32::from(args.b) / 255.0,
            );
            println!("{}", prediction.to_json());
        }
        Commands::Sample(args) => {
            let mut image = load_image(&args.input)?;
            let prediction = lens.sample(&mut image, args.x, args.y)?;
            println!("{}", prediction.to_json());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_deficiency_aliases() {
        assert_eq!(parse_deficiency("Protanopia"), Ok(Deficiency::Protan));
        assert_eq!(parse_deficiency("1"), Ok(Deficiency::Deutan));
        assert_eq!(parse_deficiency("tritan"), Ok(Deficiency::Tritan));
        assert!(parse_deficiency("achromat").is_err());
    }

    #[test]
    fn test_load_config_reports_io_and_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(Some(dir.path().join("missing.json").as_path())),
            Err(DemoError::Io(_))
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, b"{ not json").unwrap();
        assert!(matches!(
            load_config(Some(bad.as_path())),
            Err(DemoError::Core(colorlens_core::ColorLensError::Json(_)))
        ));

        let good = dir.path().join("config.json");
        std::fs::write(&good, br#"{"palette_asset": "labels.txt"}"#).unwrap();
        assert_eq!(load_config(Some(good.as_path())).unwrap().palette_asset, "labels.txt");
    }

    #[test]
    fn test_simulate_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        let data = vec![255, 0, 0, 255, 0, 255, 0, 255];
        save_image(&input, colorlens_core::MemoryImage::from_rgba(2, 1, data.clone())).unwrap();

        let cli = Cli::parse_from([
            "colorlens",
            "simulate",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "-d",
            "protan",
        ]);
        run(cli).unwrap();

        let out = load_image(&output).unwrap();
        assert_eq!(out.data().len(), data.len());
        assert_ne!(out.data(), &data[..]);
        assert_eq!(out.data()[3], 255);
        assert_eq!(out.data()[7], 255);
    }
}
