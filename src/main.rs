use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use configuration::{Config, Overrides, load_config, load_config_from};
use core_types::Position;
use ml_trainer::{
    AssemblyParams, ForestRegressor, LeagueCaches, Regressor, build_projection_features, build_training_table,
    dataset_path, model_path, read_dataset, schema, write_dataset,
};
use std::path::{Path, PathBuf};
use timeline_store::{DataSource, ParquetDataSource, TimelineStore};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// The main entry point for the Gridiron projection pipeline.
fn main() -> Result<()> {
    // Environment overrides (GRIDIRON__*) may live in a .env file.
    dotenvy::dotenv().ok();
    let _guard = init_tracing()?;

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Commands::BuildDataset(args) => {
            config.apply(&args.overrides);
            handle_build_dataset(args, &config)
        }
        Commands::TrainModel(args) => {
            config.apply(&args.overrides);
            handle_train_model(args, &config)
        }
        Commands::Project(args) => {
            config.apply(&args.overrides);
            handle_project(args, &config)
        }
    }
}

fn init_tracing() -> Result<WorkerGuard> {
    let indicatif_layer = IndicatifLayer::new();
    let (file_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily("logs", "gridiron.log"));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(indicatif_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;
    Ok(guard)
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Temporal feature engine and projection models for fantasy running backs and receivers.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a position's training table and write it as Parquet.
    BuildDataset(BuildDatasetArgs),
    /// Fit a regressor on a dataset and save it.
    TrainModel(TrainModelArgs),
    /// Project one player's fantasy points for an upcoming week.
    Project(ProjectArgs),
}

#[derive(Parser)]
struct BuildDatasetArgs {
    /// RB or WR.
    #[arg(long)]
    position: Position,
    /// Seasons to assemble, e.g. "2021,2022,2023".
    #[arg(long, value_delimiter = ',', required = true)]
    seasons: Vec<i32>,
    /// Output path (defaults to the dataset directory, named after the run).
    #[arg(long, short)]
    output: Option<PathBuf>,
    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Parser)]
struct TrainModelArgs {
    /// RB or WR.
    #[arg(long)]
    position: Position,
    /// Seasons the dataset was built from; locates the default dataset file.
    #[arg(long, value_delimiter = ',', required_unless_present = "dataset")]
    seasons: Vec<i32>,
    /// Path to the Parquet dataset file.
    #[arg(long, short)]
    dataset: Option<PathBuf>,
    /// Where to save the model (defaults to the model directory).
    #[arg(long, short)]
    output: Option<PathBuf>,
    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Parser)]
struct ProjectArgs {
    /// RB or WR.
    #[arg(long)]
    position: Position,
    /// The player's gsis id.
    #[arg(long)]
    player: String,
    #[arg(long)]
    season: i32,
    /// The upcoming week to project.
    #[arg(long)]
    week: u8,
    /// Path to a trained model (defaults to the model directory).
    #[arg(long, short)]
    model: Option<PathBuf>,
    #[command(flatten)]
    overrides: Overrides,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn sorted_seasons(seasons: &[i32]) -> Vec<i32> {
    let mut seasons = seasons.to_vec();
    seasons.sort_unstable();
    seasons.dedup();
    seasons
}

/// Builds the store for `seasons` and, when its files exist, the season before them.
///
/// Rows are only assembled for `seasons`; the earlier season only feeds windows.
fn load_store(config: &Config, seasons: &[i32]) -> Result<TimelineStore> {
    let source = ParquetDataSource::new(&config.paths.data_dir);
    let tables = source
        .load_tables_with_history(seasons)
        .with_context(|| format!("Failed to load source tables from {}", config.paths.data_dir.display()))?;
    Ok(TimelineStore::from_tables(tables))
}

fn default_dataset_path(config: &Config, position: Position, seasons: &[i32], params: &AssemblyParams) -> Result<PathBuf> {
    Ok(dataset_path(
        &config.paths.dataset_dir,
        position,
        seasons,
        params.offense_window,
        params.defense_window,
        params.points_per_reception(),
    )?)
}

/// The handler for the `build-dataset` command.
fn handle_build_dataset(args: BuildDatasetArgs, config: &Config) -> Result<()> {
    let seasons = sorted_seasons(&args.seasons);
    let params = AssemblyParams::from_config(config);
    info!(position = %args.position, ?seasons, "Building dataset");

    let store = load_store(config, &seasons)?;
    let caches = LeagueCaches::new();

    let table = build_training_table(args.position, &store, &caches, &seasons, &params)
        .context("Failed to assemble the training table")?;
    if table.is_empty() {
        bail!("No {} rows could be assembled for seasons {:?}", args.position, seasons);
    }

    let output = match args.output {
        Some(path) => path,
        None => default_dataset_path(config, args.position, &seasons, &params)?,
    };
    write_dataset(&table, &output).with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} rows ({} candidates, {} excluded) to {}",
        table.len(),
        table.candidates,
        table.exclusions.total(),
        output.display()
    );
    Ok(())
}

/// The handler for the `train-model` command.
fn handle_train_model(args: TrainModelArgs, config: &Config) -> Result<()> {
    let dataset = match args.dataset {
        Some(path) => path,
        None => {
            let params = AssemblyParams::from_config(config);
            default_dataset_path(config, args.position, &sorted_seasons(&args.seasons), &params)?
        }
    };
    info!(position = %args.position, dataset = %dataset.display(), "Training model");

    let table = read_dataset(&dataset, args.position, schema(args.position))
        .with_context(|| format!("Failed to read dataset {}", dataset.display()))?;
    let model = ForestRegressor::fit(&table, &config.model).context("Failed to fit the regressor")?;

    let output = args.output.unwrap_or_else(|| model_path(&config.paths.model_dir, args.position));
    model.save(&output).with_context(|| format!("Failed to save model to {}", output.display()))?;

    match model.evaluation() {
        Some(scores) => println!("{} model saved to {}: {}", args.position, output.display(), scores),
        None => println!("{} model saved to {} (not evaluated)", args.position, output.display()),
    }
    Ok(())
}

/// The handler for the `project` command.
fn handle_project(args: ProjectArgs, config: &Config) -> Result<()> {
    let params = AssemblyParams::from_config(config);
    let store = load_store(config, &[args.season])?;
    let caches = LeagueCaches::new();

    let row = build_projection_features(args.position, &store, &caches, &params, &args.player, args.season, args.week)
        .with_context(|| format!("Failed to build features for {}", args.player))?;

    let model_file = args.model.unwrap_or_else(|| model_path(&config.paths.model_dir, args.position));
    let model = load_model(&model_file, args.position)?;
    let points = model.predict(&row).context("Failed to score the projection row")?;

    println!(
        "{} ({} {}) vs {} in {} week {}: {:.2} projected points",
        row.player_name.as_deref().unwrap_or(&row.entity_id),
        args.position,
        row.team,
        row.opponent_team,
        args.season,
        args.week,
        points
    );
    Ok(())
}

fn load_model(path: &Path, position: Position) -> Result<ForestRegressor> {
    ForestRegressor::load(path, position).with_context(|| format!("Failed to load model {}", path.display()))
}
