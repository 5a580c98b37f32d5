mod commands;
mod output;

use clap::{Parser, Subcommand};
use pataba_core::model::{Season, SoilClass, Variety};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pataba",
    version,
    about = "Fertilizer recommendation and application schedules for rice"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a fertilizer plan from a soil sensor reading
    Recommend {
        /// Nitrogen reading in ppm
        #[arg(long)]
        n: f64,

        /// Phosphorus reading in ppm
        #[arg(long)]
        p: f64,

        /// Potassium reading in ppm
        #[arg(long)]
        k: f64,

        /// Soil pH
        #[arg(long)]
        ph: Option<f64>,

        /// Field area in hectares (default from config)
        #[arg(long)]
        area: Option<f64>,

        /// Rice variety: hybrid or inbred
        #[arg(long)]
        variety: Option<Variety>,

        /// Soil class: light or medHeavy
        #[arg(long)]
        soil: Option<SoilClass>,

        /// Season: wet or dry
        #[arg(long)]
        season: Option<Season>,

        /// Price catalog (JSON document or .xlsx price sheet)
        #[arg(short, long, value_name = "FILE")]
        catalog: PathBuf,

        /// Custom agronomy config file (default: built-in preset)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Built-in agronomy preset
        #[arg(long, default_value = "default")]
        preset: String,

        /// Keep the rows that can be bought when a product type is missing
        #[arg(long)]
        partial: bool,

        /// Ignore products marked inactive in the catalog
        #[arg(long)]
        active_only: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Also print the two-language narrative
        #[arg(long)]
        verbose: bool,
    },
    /// Reconstruct a schedule from a saved plan record (JSON or text)
    Parse {
        /// Path to the plan record
        input_file: PathBuf,

        /// Resolve product names against this catalog
        #[arg(short, long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Output format: table (default), json or text
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// List the products in a price catalog and the selector's picks
    Catalog {
        /// Price catalog (JSON document or .xlsx price sheet)
        file: PathBuf,

        /// Ignore products marked inactive
        #[arg(long)]
        active_only: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect and validate agronomy configs
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List built-in presets
    List,
    /// Print a preset's breakpoints, stage splits and defaults
    Show {
        /// Preset name (e.g., "default")
        preset: String,
    },
    /// Validate a custom agronomy config file
    Validate {
        /// Path to JSON config file
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pataba=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Recommend {
            n,
            p,
            k,
            ph,
            area,
            variety,
            soil,
            season,
            catalog,
            config,
            preset,
            partial,
            active_only,
            output,
            verbose,
        } => commands::recommend::run(commands::recommend::Args {
            request: pataba_core::RecommendationRequest {
                n,
                p,
                k,
                ph,
                area_ha: area,
                variety,
                soil_class: soil,
                season,
            },
            catalog,
            config,
            preset,
            partial,
            active_only,
            output,
            verbose,
        }),
        Commands::Parse {
            input_file,
            catalog,
            output,
        } => commands::parse::run(input_file, catalog, &output),
        Commands::Catalog {
            file,
            active_only,
            output,
        } => commands::catalog::run(file, active_only, &output),
        Commands::Config { action } => match action {
            ConfigAction::List => commands::config::list(),
            ConfigAction::Show { preset } => commands::config::show(&preset),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
