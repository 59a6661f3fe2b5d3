use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixelize::{
    batch::{self, DEFAULT_OUTPUT_DIR},
    config::{PaletteSource, ProcessConfig, factor_from_i64},
    pipeline::{Pipeline, SaveStages, StageSink},
    utils::image::{default_output_path, read_image, write_image},
};

#[derive(Parser)]
#[command(name = "pixelize")]
#[command(about = "Turn images into palette-reduced pixel art", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pixelize a single image
    Image {
        /// Input image (PNG, JPEG, ...)
        input: PathBuf,

        /// Output path, defaults to `<name>_pixelized.<ext>` next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also save every intermediate stage into this directory
        #[arg(long)]
        dump_stages: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Pixelize every file of a directory, keeping file names
    Batch {
        input_dir: PathBuf,

        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Write the effective run configuration as JSON
    WriteConfig {
        path: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// JSON run configuration; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Downscale (and upscale) factor
    #[arg(short, long, allow_negative_numbers = true)]
    factor: Option<i64>,

    /// Quantization policy: flat, ordered or probabilistic
    #[arg(short, long)]
    policy: Option<String>,

    /// Palette file with one `r,g,b` row per color
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Keep the downscaled resolution
    #[arg(long)]
    no_upscale: bool,

    /// Make green-screen pixels transparent
    #[arg(long)]
    chroma_key: bool,

    /// Seed for the probabilistic policy
    #[arg(long)]
    seed: Option<u64>,
}

impl RunArgs {
    fn resolve(&self) -> anyhow::Result<ProcessConfig> {
        let mut config = match &self.config {
            Some(path) => ProcessConfig::read_config(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => ProcessConfig::default(),
        };

        if let Some(factor) = self.factor {
            config.downscale_factor = factor_from_i64(factor)?;
        }
        if let Some(policy) = &self.policy {
            config.quantization_policy = policy.parse()?;
        }
        if let Some(palette) = &self.palette {
            config.palette = PaletteSource::File(palette.clone());
        }
        config.suppress_upscale |= self.no_upscale;
        config.enable_chroma_key |= self.chroma_key;
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pixelize=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Image {
            input,
            output,
            dump_stages,
            run,
        } => run_image(input, output, dump_stages, &run),
        Commands::Batch {
            input_dir,
            output_dir,
            run,
        } => run_batch(input_dir, output_dir, &run),
        Commands::WriteConfig { path, run } => {
            run.resolve()?.write_config(&path)?;
            tracing::info!(path = %path.display(), "config written");
            Ok(())
        }
    }
}

fn run_image(
    input: PathBuf,
    output: Option<PathBuf>,
    dump_stages: Option<PathBuf>,
    args: &RunArgs,
) -> anyhow::Result<()> {
    let config = args.resolve()?;
    let palette = Arc::new(config.palette.load().context("loading palette")?);
    let output = output.unwrap_or_else(|| default_output_path(&input));

    let grid = read_image(&input).with_context(|| format!("reading {}", input.display()))?;
    let mut sink = dump_stages.map(SaveStages::new).transpose()?;

    let mut pipeline = Pipeline::new(&config, palette)?;
    let result = pipeline.run_with_sink(grid, sink.as_mut().map(|s| s as &mut dyn StageSink))?;

    write_image(&result, &output).with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(output = %output.display(), "pixelized");
    Ok(())
}

fn run_batch(input_dir: PathBuf, output_dir: PathBuf, args: &RunArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;
    let palette = Arc::new(config.palette.load().context("loading palette")?);

    let report = batch::process_directory(&input_dir, &output_dir, &config, palette)?;
    for failure in &report.failures {
        tracing::error!(input = %failure.input.display(), error = %failure.error, "failed");
    }
    if !report.is_success() {
        anyhow::bail!(
            "{} of {} files failed",
            report.failures.len(),
            report.total()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pixelize::{error::PixelizeError, transform::quantize::QuantizePolicy};

    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Image { run, .. }
            | Commands::Batch { run, .. }
            | Commands::WriteConfig { run, .. } => run,
        }
    }

    fn write_config(dir: &Path) -> String {
        let path = dir.join("run.json");
        std::fs::write(
            &path,
            r#"{
                "downscale_factor": 4,
                "quantization_policy": "ordered",
                "enable_chroma_key": true,
                "seed": 9,
                "palette_path": "from_file.csv"
            }"#,
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    fn invalid_argument(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<PixelizeError>(),
            Some(PixelizeError::InvalidArgument(_))
        )
    }

    #[test]
    fn test_unset_flags_keep_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(dir.path());

        let config = run_args(&["pixelize", "image", "in.png", "--config", &config_path])
            .resolve()
            .unwrap();
        assert_eq!(config.downscale_factor, 4);
        assert_eq!(config.quantization_policy, QuantizePolicy::Ordered);
        assert!(config.enable_chroma_key);
        assert!(!config.suppress_upscale);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.palette, PaletteSource::File("from_file.csv".into()));
    }

    #[test]
    fn test_flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(dir.path());

        let config = run_args(&[
            "pixelize",
            "batch",
            "shots",
            "--config",
            &config_path,
            "-f",
            "3",
            "-p",
            "random",
            "--palette",
            "from_flag.csv",
            "--seed",
            "11",
            "--no-upscale",
        ])
        .resolve()
        .unwrap();
        assert_eq!(config.downscale_factor, 3);
        assert_eq!(config.quantization_policy, QuantizePolicy::Probabilistic);
        assert_eq!(config.palette, PaletteSource::File("from_flag.csv".into()));
        assert_eq!(config.seed, Some(11));
        assert!(config.suppress_upscale);
        // not given on the command line
        assert!(config.enable_chroma_key);
    }

    #[test]
    fn test_flags_without_config_start_from_defaults() {
        let config = run_args(&["pixelize", "image", "in.png", "--chroma-key"])
            .resolve()
            .unwrap();
        assert_eq!(
            config,
            ProcessConfig {
                enable_chroma_key: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_bad_flag_values_are_invalid_arguments() {
        for argv in [
            &["pixelize", "image", "in.png", "-f", "-2"][..],
            &["pixelize", "image", "in.png", "--factor", "0"][..],
            &["pixelize", "image", "in.png", "-p", "bayer"][..],
        ] {
            let err = run_args(argv).resolve().unwrap_err();
            assert!(invalid_argument(&err), "{argv:?} -> {err}");
        }
    }

    #[test]
    fn test_missing_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let args = run_args(&["pixelize", "image", "in.png", "-c", missing.to_str().unwrap()]);
        assert!(args.resolve().is_err());
    }
}
