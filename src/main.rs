//! anidb CLI - record genomes, runs and memoized pairwise comparisons

use anidb::comparison::{ComparisonKey, ComparisonStats, Setting};
use anidb::config::{self, AnidbConfig};
use anidb::fingerprint;
use anidb::output::OutputMode;
use anidb::run::{timestamp_now, STATUS_STARTED};
use anidb::storage::{create_db, SqliteStore};
use anidb::ui::{self, Icons};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "anidb")]
#[command(version)]
#[command(about = "Genome comparison store - record runs and reuse pairwise results")]
#[command(long_about = r#"
anidb keeps genomes, analysis runs and pairwise comparison results in a
SQLite database so that comparisons are never computed twice.

Example usage:
  anidb createdb --database ani.db
  anidb index ./genomes --method ANIm --database ani.db
  anidb pending 1 --program nucmer --version 3.1 --maxmatch false
  anidb report --runs --genomes
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the database file (overrides anidb.toml)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Settings that are part of a comparison's identity
#[derive(clap::Args, Clone)]
struct SettingArgs {
    /// Fragment size (ANIb/ANIblastall); omit for unset
    #[arg(long)]
    fragsize: Option<u32>,

    /// NUCmer max-match mode; omit for unset
    #[arg(long)]
    maxmatch: Option<bool>,
}

impl SettingArgs {
    fn fragsize(&self) -> Setting {
        self.fragsize.into()
    }

    fn maxmatch(&self) -> Setting {
        self.maxmatch.into()
    }
}

#[derive(clap::Args, Clone)]
struct KeyArgs {
    /// Query genome ID
    query: i64,

    /// Subject genome ID
    subject: i64,

    /// Comparison program
    #[arg(long)]
    program: String,

    /// Program version
    #[arg(long)]
    version: String,

    #[command(flatten)]
    settings: SettingArgs,
}

impl KeyArgs {
    fn key(&self) -> ComparisonKey {
        ComparisonKey::new(self.query, self.subject, &self.program, &self.version)
            .with_fragsize(self.settings.fragsize())
            .with_maxmatch(self.settings.maxmatch())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty database
    Createdb {
        /// Overwrite an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Write a default anidb.toml
    InitConfig {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Record a genome file
    AddGenome {
        /// FASTA file
        fasta: PathBuf,

        /// Description (defaults to the first FASTA header)
        #[arg(long)]
        description: Option<String>,

        /// Precomputed content hash (defaults to a blake3 digest of the file)
        #[arg(long)]
        hash: Option<String>,
    },

    /// Record a run
    AddRun {
        #[arg(short, long)]
        method: String,

        #[arg(short, long)]
        cmdline: String,

        #[arg(short, long, default_value = STATUS_STARTED)]
        status: String,

        /// Timestamp (defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a run over every FASTA file in a directory
    Index {
        /// Directory of genome files
        dir: PathBuf,

        /// Comparison method for the run
        #[arg(short, long)]
        method: String,
    },

    /// Associate a genome with a run
    Link { run_id: i64, genome_id: i64 },

    /// Look up genomes by hash
    Genome {
        hash: String,

        /// Restrict to one path
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Print the path of a genome
    GenomePath { genome_id: i64 },

    /// List genome IDs of a run
    RunGenomes { run_id: i64 },

    /// Store a comparison result
    AddComparison {
        #[command(flatten)]
        key: KeyArgs,

        #[arg(long)]
        identity: f64,

        #[arg(long)]
        coverage: f64,

        #[arg(long)]
        mismatches: f64,

        #[arg(long)]
        aligned_length: f64,
    },

    /// Look up a comparison by its full key
    Comparison {
        #[command(flatten)]
        key: KeyArgs,
    },

    /// List genome pairs of a run that still need comparing
    Pending {
        run_id: i64,

        #[arg(long)]
        program: String,

        #[arg(long)]
        version: String,

        #[command(flatten)]
        settings: SettingArgs,
    },

    /// Report database contents
    Report {
        #[arg(long)]
        runs: bool,

        #[arg(long)]
        genomes: bool,

        /// Each run with its genomes
        #[arg(long)]
        runs_genomes: bool,

        /// Each genome with its runs
        #[arg(long)]
        genomes_runs: bool,

        /// Comparison results for these runs (comma-separated IDs)
        #[arg(long, value_delimiter = ',')]
        run_results: Vec<i64>,
    },

    /// Show row counts
    Stats,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let cfg = config::load_config(Some(&config_path))
        .with_context(|| format!("reading {}", config_path.display()))?
        .unwrap_or_default();
    let database = cfg.database_path(cli.database.clone());
    let mode = OutputMode::from_json_flag(cli.json);
    let json = !mode.is_human();

    match cli.command {
        Commands::Createdb { force } => {
            if database.exists() && !force {
                anyhow::bail!(
                    "database {} already exists (use --force to overwrite)",
                    database.display()
                );
            }
            config::ensure_db_dir(&database)?;
            create_db(&database)
                .with_context(|| format!("creating database {}", database.display()))?;
            mode.emit("database", &database.display().to_string(), || {
                ui::success(&format!("Created empty database {}", database.display()))
            })?;
        }

        Commands::InitConfig { force } => {
            let config = AnidbConfig {
                database: Some(database.display().to_string()),
                fasta_extensions: Some(cfg.extensions()),
            };
            config::write_config(&config_path, &config, force)?;
            mode.emit("config", &config_path.display().to_string(), || {
                ui::success(&format!("Wrote {}", config_path.display()))
            })?;
        }

        Commands::AddGenome { fasta, description, hash } => {
            let store = open_store(&database)?;
            let recorded = record_genome(&store, &fasta, description, hash)?;
            mode.emit("genome", &recorded, || {
                if recorded.is_new {
                    ui::genome_new(recorded.genome_id, &recorded.path);
                } else {
                    ui::warn("Genome already in database with this hash and path");
                    ui::genome_existing(recorded.genome_id, &recorded.path);
                }
            })?;
        }

        Commands::AddRun { method, cmdline, status, date } => {
            let store = open_store(&database)?;
            let date = date.unwrap_or_else(timestamp_now);
            let run_id = store.add_run(&method, &cmdline, &date, &status)?;
            mode.emit("run_id", &run_id, || {
                ui::success(&format!("Recorded run {} ({})", run_id, method))
            })?;
        }

        Commands::Index { dir, method } => {
            let store = open_store(&database)?;
            let started = Instant::now();
            let files = fingerprint::find_genome_files(&dir, &cfg.extensions())?;
            if files.is_empty() {
                anyhow::bail!("no genome files found in {}", dir.display());
            }

            let cmdline = std::env::args().collect::<Vec<_>>().join(" ");
            let run_id = store.add_run(&method, &cmdline, &timestamp_now(), STATUS_STARTED)?;
            tracing::info!("Current analysis has ID {} in {}", run_id, database.display());

            let spinner = ui::Spinner::new("Hashing genomes");
            let mut recorded = Vec::with_capacity(files.len());
            let mut linked = HashSet::new();
            for file in &files {
                spinner.set_message(&format!("Hashing {}", file.display()));
                let genome = record_genome(&store, file, None, None)?;
                if !linked.insert(genome.genome_id) {
                    tracing::warn!("{} is already part of run {}", file.display(), run_id);
                    spinner.inc();
                    continue;
                }
                store
                    .add_genome_to_run(run_id, genome.genome_id)
                    .with_context(|| format!("linking genome {} to run {}", genome.genome_id, run_id))?;
                spinner.inc();
                recorded.push(genome);
            }
            spinner.finish_and_clear();

            let summary = serde_json::json!({ "run_id": run_id, "genomes": recorded });
            mode.emit("index", &summary, || {
                ui::header(&format!("Run {} ({})", run_id, method));
                for genome in &recorded {
                    if genome.is_new {
                        ui::genome_new(genome.genome_id, &genome.path);
                    } else {
                        ui::genome_existing(genome.genome_id, &genome.path);
                    }
                }
                let new = recorded.iter().filter(|g| g.is_new).count();
                ui::summary_row("New genomes:", &new.to_string());
                ui::summary_row("Reused genomes:", &(recorded.len() - new).to_string());
                ui::timing(&format!("{:.2?}", started.elapsed()));
            })?;
        }

        Commands::Link { run_id, genome_id } => {
            let store = open_store(&database)?;
            let link_id = store.add_genome_to_run(run_id, genome_id)?;
            mode.emit("link_id", &link_id, || {
                ui::status(Icons::LINK, "Linked", &format!("run {} ↔ genome {}", run_id, genome_id))
            })?;
        }

        Commands::Genome { hash, path } => {
            let store = open_store(&database)?;
            let genomes = store.get_genome(&hash, path.as_deref())?;
            mode.emit("genomes", &genomes, || {
                if genomes.is_empty() {
                    println!("{} No genome with hash {}", Icons::CROSS, hash);
                } else {
                    println!("{}", ui::genomes_table(&genomes));
                }
            })?;
        }

        Commands::GenomePath { genome_id } => {
            let store = open_store(&database)?;
            let path = store.get_genome_path(genome_id)?;
            mode.emit("path", &path, || println!("{}", path))?;
        }

        Commands::RunGenomes { run_id } => {
            let store = open_store(&database)?;
            let ids = store.get_genome_ids_by_run(run_id)?;
            mode.emit("genome_ids", &ids, || {
                let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
                ui::info(&format!("Genomes in run {}", run_id), &ids.join(", "));
            })?;
        }

        Commands::AddComparison { key, identity, coverage, mismatches, aligned_length } => {
            let store = open_store(&database)?;
            let key = key.key();
            let stats = ComparisonStats { identity, coverage, mismatches, aligned_length };
            let comparison_id = store.add_comparison(&key, &stats)?;
            mode.emit("comparison_id", &comparison_id, || {
                ui::success(&format!(
                    "Stored comparison {} vs {} as {}",
                    key.query_id, key.subject_id, comparison_id
                ))
            })?;
        }

        Commands::Comparison { key } => {
            let store = open_store(&database)?;
            let comparison = store.get_comparison(&key.key())?;
            mode.emit("comparison", &comparison, || match &comparison {
                Some(c) => println!("{}", ui::comparisons_table(std::slice::from_ref(c))),
                None => println!("{} No stored comparison for this key", Icons::CROSS),
            })?;
        }

        Commands::Pending { run_id, program, version, settings } => {
            let store = open_store(&database)?;
            let pending = store.get_uncompared_pairs(
                run_id,
                &program,
                &version,
                &settings.fragsize(),
                &settings.maxmatch(),
            )?;
            mode.emit("pending", &pending, || {
                if pending.is_empty() {
                    ui::success("All comparison results already present in database");
                } else {
                    ui::header(&format!("{} comparisons still to be performed", pending.len()));
                    for (query, subject) in &pending {
                        println!("  {} vs {}", query, subject);
                    }
                }
            })?;
        }

        Commands::Report { runs, genomes, runs_genomes, genomes_runs, run_results } => {
            let store = open_store(&database)?;
            let mut report = serde_json::Map::new();

            if runs {
                let data = store.get_all_runs()?;
                if !json {
                    ui::section("Runs");
                    println!("{}", ui::runs_table(&data));
                }
                report.insert("runs".into(), serde_json::to_value(data)?);
            }
            if genomes {
                let data = store.get_all_genomes()?;
                if !json {
                    ui::section("Genomes");
                    println!("{}", ui::genomes_table(&data));
                }
                report.insert("genomes".into(), serde_json::to_value(data)?);
            }
            if runs_genomes {
                let data = store.get_genomes_by_runs()?;
                if !json {
                    ui::section("Runs with genomes");
                    println!("{}", ui::run_genome_table(&data));
                }
                report.insert("runs_genomes".into(), serde_json::to_value(data)?);
            }
            if genomes_runs {
                let data = store.get_runs_by_genomes()?;
                if !json {
                    ui::section("Genomes with runs");
                    println!("{}", ui::run_genome_table(&data));
                }
                report.insert("genomes_runs".into(), serde_json::to_value(data)?);
            }
            for run_id in run_results {
                let data = store.get_comparisons_by_run(run_id)?;
                if !json {
                    ui::section(&format!("Results for run {}", run_id));
                    println!("{}", ui::comparisons_table(&data));
                }
                report.insert(format!("results_{}", run_id), serde_json::to_value(data)?);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }

        Commands::Stats => {
            let store = open_store(&database)?;
            let stats = store.stats()?;
            tracing::debug!("{}", stats);
            mode.emit("stats", &stats, || {
                println!("{} anidb Statistics ({})", Icons::STATS, database.display());
                println!("{}", ui::stats_table(&stats));
            })?;
        }
    }

    Ok(())
}

fn open_store(database: &Path) -> anyhow::Result<SqliteStore> {
    SqliteStore::open(database).with_context(|| format!("opening {}", database.display()))
}

/// A genome recorded (or found already recorded) by the CLI
#[derive(Serialize)]
struct RecordedGenome {
    genome_id: i64,
    path: String,
    hash: String,
    is_new: bool,
}

/// Add a genome file, reusing the existing row if this exact content was
/// already recorded at this path
fn record_genome(
    store: &SqliteStore,
    fasta: &Path,
    description: Option<String>,
    hash: Option<String>,
) -> anyhow::Result<RecordedGenome> {
    let abspath = std::fs::canonicalize(fasta)
        .with_context(|| format!("reading {}", fasta.display()))?;
    let path = abspath.display().to_string();
    let hash = match hash {
        Some(h) => h,
        None => fingerprint::hash_file(&abspath)?,
    };
    let description = match description {
        Some(d) => d,
        None => fingerprint::read_fasta_description(&abspath)?,
    };

    match store.add_genome(&hash, &path, &description) {
        Ok(genome_id) => Ok(RecordedGenome { genome_id, path, hash, is_new: true }),
        Err(e) if e.is_constraint_violation() => {
            tracing::warn!("Genome already in database with this hash and path: {}", path);
            let existing = store.get_genome(&hash, Some(&path))?;
            let genome = existing
                .first()
                .with_context(|| format!("genome {} rejected but not found", path))?;
            Ok(RecordedGenome { genome_id: genome.genome_id, path, hash, is_new: false })
        }
        Err(e) => Err(e.into()),
    }
}
