use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use hub_projector::config::ProjectorConfig;
use hub_projector::context::AppContext;
use hub_projector::database::{DataAccessor, DatabaseManifest, SingleRootDataHub, StaticDatabaseManifest};
use hub_projector::logging::{self, LogLevel};
use hub_projector::projector::{DatabaseProjector, FilterProjector};
use hub_projector::sampler::{ChainSampler, FilterSampler, FirstFoundSampler, RandomSampler, SampleSet, Sampler};
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "hub_projector")]
#[command(about = "Projects, snapshots and samples hub-partitioned spreadsheet databases")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project the input database into the output database
    Project {
        /// Also write the statistics CSV to this file
        #[arg(long)]
        stats: Option<PathBuf>,
        /// Fail when a dataset is missing from every input hub
        #[arg(long)]
        strict: bool,
    },
    /// Replace each output hub with the same-named hub found under another database root
    Populate {
        #[arg(long)]
        from: PathBuf,
        /// Overlay the seed instead of replacing the hub
        #[arg(long)]
        enrich: bool,
    },
    /// Copy every output hub below a snapshot root
    Snapshot {
        #[arg(long)]
        to: PathBuf,
        /// Check that each snapshot has the same content digest as its source
        #[arg(long)]
        verify: bool,
    },
    /// Build small samples out of every dataset file in a folder
    Sample {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Worksheet to read from and write to
        #[arg(long)]
        sheet: Option<String>,
        /// Keep the first N rows
        #[arg(long)]
        first: Option<usize>,
        /// Keep a random fraction of rows, between 0 and 1
        #[arg(long)]
        percent: Option<f64>,
        #[arg(long, requires = "percent")]
        seed: Option<u64>,
        /// Keep rows whose column contains one of the tags
        #[arg(long, requires = "tags")]
        column: Option<String>,
        /// Comma-separated tags for --column
        #[arg(long, requires = "column")]
        tags: Option<String>,
    },
}

fn load_context(config_path: Option<&Path>) -> Result<AppContext> {
    let path = config_path.ok_or_else(|| anyhow!("--config is required for this command"))?;
    let config = ProjectorConfig::load(path).with_context(|| format!("loading {}", path.display()))?;
    logging::init_logging(&config.logging.dir, config.log_level()?);
    Ok(AppContext::from_config(config)?)
}

fn manifests(ctx: &AppContext) -> Result<(StaticDatabaseManifest, StaticDatabaseManifest)> {
    let input = StaticDatabaseManifest::from_config(&ctx.config, ctx.config.input_root()?)?;
    let output = StaticDatabaseManifest::from_config(&ctx.config, ctx.config.output_root()?)?;
    Ok((input, output))
}

fn run_project(ctx: &AppContext, stats_path: Option<&Path>, strict: bool) -> Result<()> {
    let (input_db, output_db) = manifests(ctx)?;
    let projector = FilterProjector::from_config(&ctx.config)?.strict(strict);
    let stats = projector.project(ctx, &input_db, &output_db)?;

    stats.write_csv(io::stdout())?;
    if let Some(path) = stats_path {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        stats.write_csv(file)?;
        info!("Statistics written to {}", path.display());
    }
    if !stats.skipped_by_all_hubs().is_empty() {
        warn!("{} dataset(s) found in no input hub", stats.skipped_by_all_hubs().len());
    }
    Ok(())
}

fn run_populate(ctx: &AppContext, seed_root: &Path, enrich: bool) -> Result<()> {
    let (_, output_db) = manifests(ctx)?;
    let seed_db = StaticDatabaseManifest::from_config(&ctx.config, seed_root)?;
    for hub in output_db.data_hubs() {
        let Some(seed) = seed_db.hub(hub.name()) else {
            warn!("No seed for hub '{}'", hub.name());
            continue;
        };
        if enrich {
            hub.enrich_from_seed(seed.as_ref())?;
        } else {
            hub.populate_from_seed(seed.as_ref())?;
        }
        println!("Hub '{}' populated from {}", hub.name(), seed.hub_root().display());
    }
    Ok(())
}

fn run_snapshot(ctx: &AppContext, snapshot_root: &Path, verify: bool) -> Result<()> {
    let (_, output_db) = manifests(ctx)?;
    for hub in output_db.data_hubs() {
        let before = SingleRootDataHub::new(hub.name(), hub.hub_handle().clone()).content_digest()?;
        let snapshot = hub.create_snapshot(snapshot_root)?;
        println!("Hub '{}' snapshotted to {}", hub.name(), snapshot.hub_root().display());

        if verify {
            let copy = SingleRootDataHub::new(snapshot.name(), snapshot.hub_handle().clone()).content_digest()?;
            if copy != before {
                error!("Snapshot of hub '{}' differs from its source", hub.name());
                return Err(anyhow!("snapshot verification failed for hub '{}'", hub.name()));
            }
            info!("Snapshot of hub '{}' verified ({})", hub.name(), &before[..12]);
        }
    }
    Ok(())
}

/// Every .json/.xlsx/.csv file directly under `folder`, keyed by file name. A CSV that
/// only shadows a workbook of the same stem is read through that workbook.
fn load_sample_set(folder: &Path, sheet: Option<&str>) -> Result<SampleSet> {
    let mut files: BTreeMap<String, PathBuf> = BTreeMap::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json" | "xlsx" | "csv") => {}
            _ => continue,
        }
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let is_csv = path.extension().is_some_and(|e| e == "csv");
        if is_csv && files.contains_key(&stem) {
            continue;
        }
        files.insert(stem, path);
    }

    let mut raw = SampleSet::new();
    for path in files.into_values() {
        let key = path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let table = DataAccessor::scope(&path, sheet.map(str::to_string), |ax| ax.retrieve(&[], true))?;
        if let Some(table) = table {
            raw.insert(key, table);
        }
    }
    Ok(raw)
}

fn build_sampler(
    first: Option<usize>,
    percent: Option<f64>,
    seed: Option<u64>,
    column: Option<String>,
    tags: Option<String>,
) -> Result<ChainSampler> {
    let mut samplers: Vec<Box<dyn Sampler>> = Vec::new();
    if let (Some(column), Some(tags)) = (column, tags) {
        let tags = tags.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        samplers.push(Box::new(FilterSampler::new(column, tags)));
    }
    if let Some(percent) = percent {
        samplers.push(Box::new(RandomSampler::new(percent, seed)?));
    }
    if let Some(first) = first {
        samplers.push(Box::new(FirstFoundSampler::new(first)));
    }
    Ok(ChainSampler::new(samplers))
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Project { stats, strict } => {
            let ctx = load_context(cli.config.as_deref())?;
            run_project(&ctx, stats.as_deref(), strict)?;
        }
        Commands::Populate { from, enrich } => {
            let ctx = load_context(cli.config.as_deref())?;
            run_populate(&ctx, &from, enrich)?;
        }
        Commands::Snapshot { to, verify } => {
            let ctx = load_context(cli.config.as_deref())?;
            run_snapshot(&ctx, &to, verify)?;
        }
        Commands::Sample {
            input,
            output,
            sheet,
            first,
            percent,
            seed,
            column,
            tags,
        } => {
            let (log_dir, activation) = match cli.config.as_deref() {
                Some(path) => {
                    let config = ProjectorConfig::load(path)?;
                    let activation = config.log_level()?;
                    (config.logging.dir, activation)
                }
                None => (PathBuf::from("logs"), LogLevel::INFO),
            };
            logging::init_logging(&log_dir, activation);

            let sampler = build_sampler(first, percent, seed, column, tags)?;
            let raw = load_sample_set(&input, sheet.as_deref())?;
            info!("Loaded {} dataset(s) from {}", raw.len(), input.display());
            let samples = sampler.create_samples(&raw, &output, sheet.as_deref())?;
            for (key, table) in &samples {
                println!("{}: {} of {} rows", key, table.nb_rows(), raw[key].nb_rows());
            }
        }
    }

    Ok(())
}
