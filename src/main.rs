use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{error, info};

use desialo::config::{ConfigFile, PipelineConfig, Variant};
use desialo::data::loader::{load_reference, load_sialylated};
use desialo::export::{RunReport, write_mirror_csv, write_report_json, write_spectra_csv};
use desialo::state::AnalysisState;

/// desialo - derive a desialylated spectrum from an annotated sialylated peak list
#[derive(Parser)]
#[command(name = "desialo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Annotated sialylated peak list (.csv, .tsv, .json, .parquet)
    #[arg(value_name = "SIALYLATED")]
    sialylated: PathBuf,

    /// Experimental desialylated reference peak list
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Directory for spectra.csv, mirror.csv and report.json
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Mass tolerance in Da (matching window and nominal bin width)
    #[arg(short = 't', long)]
    tolerance: Option<f64>,

    /// Confidence cutoff; hits must score strictly above it
    #[arg(short = 'c', long)]
    cutoff: Option<f64>,

    /// Mass removed per sialic acid (Da)
    #[arg(long)]
    sialic_acid_delta: Option<f64>,

    /// Mass removed per acetyl group (Da)
    #[arg(long)]
    acetyl_delta: Option<f64>,

    /// Run only these variants (default: all three)
    #[arg(long, value_enum)]
    variant: Vec<VariantArg>,

    /// Run variants one after another instead of in parallel
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantArg {
    Unfiltered,
    PeakFiltered,
    PeakAndConfidenceFiltered,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Unfiltered => Variant::Unfiltered,
            VariantArg::PeakFiltered => Variant::PeakFiltered,
            VariantArg::PeakAndConfidenceFiltered => Variant::PeakAndConfidenceFiltered,
        }
    }
}

impl Cli {
    /// Defaults, then the config file, then command-line flags.
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigFile::from_file(path)?.pipeline,
            None => PipelineConfig::default(),
        };
        if let Some(t) = self.tolerance {
            config.mass_tolerance = t;
        }
        if let Some(c) = self.cutoff {
            config.confidence_cutoff = c;
        }
        if let Some(d) = self.sialic_acid_delta {
            config.deltas.sialic_acid = d;
        }
        if let Some(d) = self.acetyl_delta {
            config.deltas.acetyl = d;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.pipeline_config()?;
    let variants: Vec<Variant> = if cli.variant.is_empty() {
        Variant::ALL.to_vec()
    } else {
        cli.variant.iter().map(|&v| v.into()).collect()
    };

    let sialylated = load_sialylated(&cli.sialylated)?;
    let reference = load_reference(&cli.reference)?;
    let mut state = AnalysisState::new(sialylated, reference)
        .context("building reference mass set")?;
    state.run_selected(&variants, &config, !cli.sequential);

    for (variant, e) in state.failures() {
        error!("{variant} failed: {e}");
    }

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating {}", cli.output_dir.display()))?;
    write_spectra_csv(&cli.output_dir.join("spectra.csv"), &state)?;
    write_mirror_csv(&cli.output_dir.join("mirror.csv"), &state)?;
    write_report_json(
        &cli.output_dir.join("report.json"),
        &RunReport::new(&state, &config),
    )?;
    info!("wrote results to {}", cli.output_dir.display());

    if state.spectra().next().is_none() {
        bail!("every requested variant failed");
    }
    Ok(())
}
