//! Genesim CLI - gene similarity bulk-loading benchmark

use clap::{Args, Parser, Subcommand};
use genesim_core::config::Config;
use genesim_core::loader::{self, BaselineLoader, LoadReport, LoadRequest, LoadStrategy, StrategyKind};
use genesim_core::matrix::GeneratorKind;
use genesim_core::models::GeneRepository;
use genesim_core::storage::{Database, DatabaseConfig};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "genesim")]
#[command(author, version, about = "Gene similarity bulk-loading benchmark", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file (overrides GENESIM_DATABASE and the config file)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load with one get-or-create per gene and per pair
    Baseline {
        /// JSON array of gene names
        genes_json: PathBuf,
        /// Where to write the timing report
        output_file: PathBuf,
        /// Table-file holding the scores table and optionally p-values
        table_file: PathBuf,
        /// Visit ordered pairs only, writing each mirror explicitly
        #[arg(long)]
        triangle: bool,
    },

    /// Load with batched inserts, one batch per matrix row
    BulkCreate(LoadArgs),

    /// Load with bulk copies from in-memory buffers
    CopyFrom(LoadArgs),

    /// Load with one bulk copy from a spooled temporary file
    CopyFromFile(LoadArgs),

    /// List the similarities of a gene ordered by score
    Rank {
        /// Systematic gene name
        gene: String,
        /// Lowest scores first
        #[arg(long)]
        ascending: bool,
    },

    /// Show database and schema status
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct LoadArgs {
    /// JSON array of gene names
    genes_json: PathBuf,
    /// Where to write the timing report
    output_file: PathBuf,
    /// Read similarities from a table-file instead of generating them
    #[arg(long)]
    table_file: Option<PathBuf>,
    /// Synthetic generator (symmetric, normal)
    #[arg(long, value_parser = parse_generator)]
    generator: Option<GeneratorKind>,
    /// Seed for the synthetic generator
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Show config file path
    Path,
}

fn parse_generator(s: &str) -> Result<GeneratorKind, String> {
    GeneratorKind::parse(s).ok_or_else(|| format!("unknown generator '{}' (symmetric, normal)", s))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("genesim=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Baseline {
            genes_json,
            output_file,
            table_file,
            triangle,
        } => {
            let config = Config::load()?;
            let db = open_database(&config, cli.database.as_deref()).await?;
            let strategy = BaselineLoader { triangle };
            let request = LoadRequest::from_table_file(genes_json, output_file, table_file);
            cmd_load(&db, &strategy, &request, &config, cli.quiet).await
        }

        Commands::BulkCreate(args) => {
            cmd_strategy(StrategyKind::BulkCreate, args, cli.database.as_deref(), cli.quiet).await
        }

        Commands::CopyFrom(args) => {
            cmd_strategy(StrategyKind::CopyFrom, args, cli.database.as_deref(), cli.quiet).await
        }

        Commands::CopyFromFile(args) => {
            cmd_strategy(StrategyKind::CopyFromFile, args, cli.database.as_deref(), cli.quiet).await
        }

        Commands::Rank { gene, ascending } => {
            let config = Config::load()?;
            let db = open_database(&config, cli.database.as_deref()).await?;
            cmd_rank(&db, &gene, ascending).await
        }

        Commands::Status => {
            let config = Config::load()?;
            let db = open_database(&config, cli.database.as_deref()).await?;
            cmd_status(&db, cli.quiet).await
        }

        Commands::Config { action } => cmd_config(action, cli.quiet),
    }
}

/// Open the database named by `--database`, else by the configuration
async fn open_database(config: &Config, database: Option<&Path>) -> anyhow::Result<Database> {
    let path = database
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.database.resolved_path());

    Database::new(
        DatabaseConfig::with_path(path).max_connections(config.database.max_connections),
    )
    .await
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_strategy(
    kind: StrategyKind,
    args: LoadArgs,
    database: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(generator) = args.generator {
        config.loader.generator = generator;
    }
    if args.seed.is_some() {
        config.loader.seed = args.seed;
    }

    let request = match args.table_file {
        Some(table_file) => LoadRequest::from_table_file(args.genes_json, args.output_file, table_file),
        None => LoadRequest::synthetic(
            args.genes_json,
            args.output_file,
            config.loader.generator,
            config.loader.seed,
        ),
    };

    let db = open_database(&config, database).await?;
    let strategy = kind.strategy();
    cmd_load(&db, strategy.as_ref(), &request, &config, quiet).await
}

async fn cmd_load(
    db: &Database,
    strategy: &dyn LoadStrategy,
    request: &LoadRequest,
    config: &Config,
    quiet: bool,
) -> anyhow::Result<()> {
    let result = loader::run(db, strategy, request, &config.loader).await;
    db.close().await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Hint: {}", suggestion);
            }
            return Err(anyhow::anyhow!("[{}] {}", e.code(), e));
        }
    };

    info!(strategy = strategy.kind().as_str(), "Load finished");
    if !quiet {
        print_report(&report, &request.output);
    }
    Ok(())
}

fn print_report(report: &LoadReport, output: &Path) {
    println!("Load report ({})", output.display());
    println!("{}", "-".repeat(50));
    for phase in report.phases() {
        let count = phase
            .count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<36} {:>8.3}s {:>8}", phase.label, phase.seconds, count);
    }
}

async fn cmd_rank(db: &Database, gene: &str, ascending: bool) -> anyhow::Result<()> {
    let repo = GeneRepository::new(db);
    let Some(found) = repo.get_by_name(gene).await? else {
        let e = genesim_core::Error::GeneNotFound(gene.to_string());
        return Err(anyhow::anyhow!("[{}] {}", e.code(), e));
    };

    let names: std::collections::HashMap<i64, String> = repo
        .list()
        .await?
        .into_iter()
        .map(|g| (g.id, g.systematic_name))
        .collect();
    let name_of = |id: i64| names.get(&id).map(String::as_str).unwrap_or("?");

    for sim in repo.ranked_similar(&found, !ascending).await? {
        let pvalue = sim
            .pvalue
            .map(|p| p.to_string())
            .unwrap_or_default();
        println!(
            "{}\t{}\t{}\t{}\t{}",
            name_of(sim.gene1_id),
            name_of(sim.gene2_id),
            sim.metric,
            sim.score,
            pvalue
        );
    }
    Ok(())
}

async fn cmd_status(db: &Database, quiet: bool) -> anyhow::Result<()> {
    db.health_check().await?;
    let status = db.migration_status().await?;
    let genes = GeneRepository::new(db).count().await?;
    let sims = genesim_core::models::SimilarityRepository::new(db).count().await?;

    if quiet {
        println!("{}\t{}", genes, sims);
        return Ok(());
    }

    println!("Database: {}", db.path().display());
    println!(
        "Schema: version {} of {}{}",
        status.current_version,
        status.target_version,
        if status.needs_migration { " (needs migration)" } else { "" }
    );
    if let Some(applied) = status.last_applied_at {
        println!("Last migration: {}", applied);
    }
    println!("Genes: {}", genes);
    println!("Similarities: {}", sims);
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
