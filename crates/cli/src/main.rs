//! ivmsmooth CLI - partitioned boundary smoothing

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ivmsmooth_algorithms::vector::AreaMethod;
use ivmsmooth_core::io::{read_features, GeoJsonSink};
use ivmsmooth_core::{DiagnosticKind, FeatureCollection, LinearUnit, CRS};
use ivmsmooth_parallel::partition::partition_ranges;
use ivmsmooth_parallel::{Pipeline, PipelineConfig, PipelineReport, ProcessingMode};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ivmsmooth")]
#[command(author, version, about = "Parallel polygon boundary smoothing", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the features in a file and how they would be partitioned
    Info {
        /// Input GeoJSON file
        input: PathBuf,
        /// Number of workers (default: cores - 1)
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Smooth polygon boundaries and merge the result
    Smooth {
        /// Input GeoJSON file
        input: PathBuf,
        /// Output GeoJSON file
        output: PathBuf,
        /// Exclusion polygons subtracted from the merged output
        #[arg(short, long)]
        exclude: Option<PathBuf>,
        /// Pipeline configuration as JSON; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Args, Default)]
struct Overrides {
    /// Number of workers (default: cores - 1)
    #[arg(short, long)]
    workers: Option<usize>,
    /// Run on a single thread
    #[arg(long, conflicts_with = "workers")]
    sequential: bool,
    /// Spline samples per ring
    #[arg(long)]
    samples: Option<usize>,
    /// Vertices appended past the seam before fitting
    #[arg(long)]
    padding: Option<usize>,
    /// Neighbors searched when trimming the seam
    #[arg(long)]
    trim_neighbors: Option<usize>,
    /// Buffer distance in CRS units
    #[arg(short, long)]
    buffer: Option<f64>,
    /// Minimum area kept, in square feet for geodesic areas and squared
    /// CRS units otherwise
    #[arg(long)]
    min_area: Option<f64>,
    /// Measure areas on the ellipsoid (lon/lat input)
    #[arg(long)]
    geodesic: bool,
    /// Dissolve features sharing this attribute before smoothing
    #[arg(long)]
    dissolve_field: Option<String>,
    /// EPSG code of the input coordinates
    #[arg(long)]
    epsg: Option<u32>,
    /// Linear unit: meter, foot, us_survey_foot, degree
    #[arg(long, default_value = "foot")]
    unit: String,
}

impl Overrides {
    fn apply(&self, config: &mut PipelineConfig) -> Result<()> {
        if self.sequential {
            config.mode = ProcessingMode::Sequential;
        } else if let Some(n) = self.workers {
            config.mode = ProcessingMode::ParallelWith(n);
        }
        if let Some(n) = self.samples {
            config.smoothing.sample_count = n;
        }
        if let Some(n) = self.padding {
            config.smoothing.padding = n;
        }
        if let Some(n) = self.trim_neighbors {
            config.smoothing.trim_neighbors = n;
        }
        if let Some(d) = self.buffer {
            config.merge.buffer_distance = d;
        }
        if let Some(a) = self.min_area {
            config.merge.min_area = a;
        }
        if self.geodesic {
            config.merge.area_method = AreaMethod::Geodesic;
        }
        if let Some(field) = &self.dissolve_field {
            config.dissolve_field = Some(field.clone());
        }
        if let Some(code) = self.epsg {
            let unit = parse_unit(&self.unit)?;
            config.crs = CRS::from_epsg(code, unit);
            if !self.geodesic {
                config.merge.area_method = AreaMethod::for_crs(&config.crs);
            }
        }
        Ok(())
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn parse_unit(s: &str) -> Result<LinearUnit> {
    match s {
        "meter" | "m" => Ok(LinearUnit::Meter),
        "foot" | "ft" => Ok(LinearUnit::Foot),
        "us_survey_foot" | "ftUS" => Ok(LinearUnit::UsSurveyFoot),
        "degree" | "deg" => Ok(LinearUnit::Degree),
        _ => anyhow::bail!("Unknown unit: {}. Use: meter, foot, us_survey_foot, degree", s),
    }
}

fn read_layer(path: &Path, what: &str) -> Result<FeatureCollection> {
    let pb = spinner(&format!("Reading {}...", what));
    let outcome =
        read_features(path).with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!("{}: {} polygons", what, outcome.features.len());
    if outcome.skipped > 0 {
        warn!("{}: skipped {} null or non-polygonal records", what, outcome.skipped);
    }
    Ok(outcome.features)
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn summary(report: &PipelineReport) {
    let merge = &report.merge;
    println!("Input features:         {}", report.input_features);
    if report.prepared_features != report.input_features {
        println!("After attribute dissolve: {}", report.prepared_features);
    }
    println!(
        "Workers:                {} ({} failed partitions)",
        report.workers, report.failed_partitions
    );
    println!("Degenerate polygons:    {}", report.polygons_dropped);
    println!("Degenerate holes:       {}", report.holes_dropped);
    println!("Smoothed features:      {}", report.smoothed_features);
    println!("Dissolved parts:        {}", merge.dissolved_parts);
    println!("After buffer:           {}", merge.after_buffer);
    println!("After erase:            {}", merge.after_erase);
    println!("Removed below area:     {}", merge.removed_below_area);
    println!("Removed duplicates:     {}", merge.removed_duplicates);
    println!("Output features:        {}", report.output_features());
    let inconsistencies = report.count(DiagnosticKind::MergeInconsistency);
    if inconsistencies > 0 {
        println!("Merge inconsistencies:  {}", inconsistencies);
    }
    println!("  Smoothing time: {:.2?}", report.smoothing_elapsed);
}

fn done(path: &Path, elapsed: std::time::Duration) {
    println!("Smoothed polygons saved to: {}", path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input, workers } => {
            let outcome = read_features(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let mode = workers.map_or(ProcessingMode::Parallel, ProcessingMode::ParallelWith);
            let workers = mode.worker_count();
            let ranges = partition_ranges(outcome.features.len(), workers)?;

            println!("File: {}", input.display());
            println!("Polygons: {}", outcome.features.len());
            println!("Skipped records: {}", outcome.skipped);
            println!("Workers: {}", workers);
            println!("\nPartitions:");
            for (i, range) in ranges.iter().enumerate() {
                println!(
                    "  {:>3}: {:>8} .. {:<8} ({} features)",
                    i,
                    range.start,
                    range.end,
                    range.len()
                );
            }
        }

        // ── Smooth ───────────────────────────────────────────────────
        Commands::Smooth {
            input,
            output,
            exclude,
            config,
            report,
            overrides,
        } => {
            let mut pipeline_config = load_config(config.as_deref())?;
            overrides.apply(&mut pipeline_config)?;
            pipeline_config.validate().context("Invalid parameters")?;

            let features = read_layer(&input, "Input")?;
            let exclusion = match &exclude {
                Some(path) => read_layer(path, "Exclusion")?,
                None => FeatureCollection::new(),
            };

            let start = Instant::now();
            let pb = spinner(&format!(
                "Smoothing with {} workers...",
                pipeline_config.worker_count()
            ));
            let pipeline = Pipeline::new(pipeline_config);
            let mut sink = GeoJsonSink::new(&output);
            let run = pipeline.run_to_sink(features, &exclusion, &mut sink);
            pb.finish_and_clear();
            let run_report = run.context("Smoothing failed")?;
            let elapsed = start.elapsed();

            summary(&run_report);
            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&run_report)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write report {}", path.display()))?;
                info!("Report written to {}", path.display());
            }
            done(&output, elapsed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = PipelineConfig::default();
        let overrides = Overrides {
            workers: Some(3),
            samples: Some(400),
            min_area: Some(1000.0),
            unit: "foot".into(),
            ..Default::default()
        };
        overrides.apply(&mut config).unwrap();
        assert_eq!(config.mode, ProcessingMode::ParallelWith(3));
        assert_eq!(config.smoothing.sample_count, 400);
        assert_eq!(config.smoothing.padding, 3);
        assert_eq!(config.merge.min_area, 1000.0);
        assert_eq!(config.merge.buffer_distance, 0.25);
    }

    #[test]
    fn test_sequential_flag() {
        let mut config = PipelineConfig::default();
        let overrides = Overrides {
            sequential: true,
            unit: "foot".into(),
            ..Default::default()
        };
        overrides.apply(&mut config).unwrap();
        assert_eq!(config.mode, ProcessingMode::Sequential);
    }

    #[test]
    fn test_geographic_epsg_switches_to_geodesic() {
        let mut config = PipelineConfig::default();
        let overrides = Overrides {
            epsg: Some(4326),
            unit: "degree".into(),
            ..Default::default()
        };
        overrides.apply(&mut config).unwrap();
        assert!(config.crs.is_geographic());
        assert_eq!(config.merge.area_method, AreaMethod::Geodesic);
        // Threshold stays in square feet
        assert_eq!(config.merge.area_unit, LinearUnit::Foot);
    }

    #[test]
    fn test_unknown_unit() {
        assert!(parse_unit("furlong").is_err());
        assert_eq!(parse_unit("ft").unwrap(), LinearUnit::Foot);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "ivmsmooth",
            "smooth",
            "in.geojson",
            "out.geojson",
            "--workers",
            "4",
            "--min-area",
            "5000",
        ])
        .unwrap();
        match cli.command {
            Commands::Smooth { overrides, .. } => {
                assert_eq!(overrides.workers, Some(4));
                assert_eq!(overrides.min_area, Some(5000.0));
            }
            _ => panic!("expected smooth"),
        }
    }
}
