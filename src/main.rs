//! PRA Outliers - command-line front end
//!
//! Loads the returns table, runs detection for one year and prints the
//! flagged rows. The desktop viewer is available with the `gui` feature.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use pra_outliers::charts::{ScatterPlotter, ScatterSeries};
use pra_outliers::{report, AppConfig, DataLoader, DetectError, OutlierDetector};

#[derive(Parser)]
#[command(name = "pra-outliers")]
#[command(about = "Outlier detection for annual PRA insurer returns", long_about = None)]
struct Cli {
    /// Config file (TOML); defaults to ./pra-outliers.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Returns file (xlsx, xls, ods or csv)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Worksheet to read instead of the first one
    #[arg(long, global = true)]
    sheet: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the years and numeric columns of the returns file
    Columns,

    /// Flag the outlier rows of one reporting year
    Detect {
        /// Reporting year
        #[arg(short, long)]
        year: i64,

        /// Feature column; repeat for several. Defaults to the configured set
        #[arg(short = 'c', long = "column")]
        columns: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write the outlier scatter plot to this SVG file
        #[arg(long)]
        plot: Option<PathBuf>,

        /// Override the isolation forest seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Open the desktop viewer
    #[cfg(feature = "gui")]
    Gui,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if cli.sheet.is_some() {
        config.sheet = cli.sheet;
    }

    match cli.command {
        Commands::Columns => list_columns(&config),
        Commands::Detect {
            year,
            columns,
            format,
            plot,
            seed,
        } => {
            if let Some(seed) = seed {
                config.forest.seed = seed;
            }
            detect(&config, year, columns, format, plot)
        }
        #[cfg(feature = "gui")]
        Commands::Gui => pra_outliers::gui::run(config)
            .map_err(|e| anyhow::anyhow!("Desktop viewer failed: {e}")),
    }
}

fn open(config: &AppConfig) -> Result<DataLoader> {
    let loader = DataLoader::new(&config.data_path).with_sheet(config.sheet.clone());
    loader
        .table()
        .with_context(|| format!("Cannot load {}", config.data_path.display()))?;
    Ok(loader)
}

fn list_columns(config: &AppConfig) -> Result<()> {
    let loader = open(config)?;

    println!("File: {}", loader.get_file_path().display());
    println!("Rows: {}", loader.get_row_count());
    let years: Vec<String> = loader.get_years().iter().map(|y| y.to_string()).collect();
    println!("Years: {}", years.join(", "));
    println!("Numeric columns:");
    for name in loader.get_numeric_columns() {
        let marker = if config.default_columns.contains(&name) { "*" } else { " " };
        println!("  {marker} {name}");
    }
    Ok(())
}

fn detect(
    config: &AppConfig,
    year: i64,
    columns: Vec<String>,
    format: OutputFormat,
    plot: Option<PathBuf>,
) -> Result<()> {
    if !config.years.contains(&year) {
        log::warn!("Year {} is not one of the configured years {:?}", year, config.years);
    }
    let columns = if columns.is_empty() {
        config.default_columns.clone()
    } else {
        columns
    };

    let loader = open(config)?;
    let table = loader.table()?;
    let detector = OutlierDetector::new(config.forest.build());

    let detection = match detector.detect(table, year, &columns) {
        Ok(detection) => detection,
        Err(err @ DetectError::InsufficientData { .. }) => {
            println!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err).context(format!("Detection failed for {year}")),
    };

    match format {
        OutputFormat::Table => println!("{}", report::to_text(&detection)),
        OutputFormat::Json => println!("{}", report::to_json(&detection)?),
    }

    if let Some(path) = plot {
        if detection.is_empty() {
            log::warn!("No outliers for {year}; plot not written");
        } else {
            let series = ScatterSeries::from_detection(&detection)?;
            ScatterPlotter::render_svg(&series, year, &path)
                .with_context(|| format!("Cannot write plot to {}", path.display()))?;
        }
    }

    Ok(())
}
