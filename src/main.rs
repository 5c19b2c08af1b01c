use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use wfload::config::{self, parse_duration, FixturePaths, GeneratorConfig};
use wfload::{collect_stats, generate, Fixtures, GeneratorError, Shutdown};
use wfload_core::TableKind;
use wfload_persistence::{build_pool, DbConfig, PersistenceError, PgPool, PgTarget};

/// Salida convencional tras SIGINT.
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(name = "wfload", version, about = "Synthetic load generator for the workflow tables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate rows backwards in time until every selected table holds `instance_total` rows.
    Generate(GenerateArgs),
    /// Print row count, on-disk size and `ts` range of each table, plus the database size.
    Stats {
        #[arg(long, env = "WFLOAD_TABLES", default_value = "instances,io,jobs", value_parser = parse_table_list)]
        tables: TableList,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Rows each table must hold after the run.
    #[arg(long, env = "WFLOAD_INSTANCE_TOTAL", default_value_t = config::DEFAULT_INSTANCE_TOTAL)]
    instance_total: i64,
    /// Copy workers per table (default: half the available cores).
    #[arg(long, env = "WFLOAD_WORKERS")]
    workers: Option<usize>,
    /// Workflow key written on every instance and job.
    #[arg(long, env = "WFLOAD_WORKFLOW_ID")]
    workflow_id: i64,
    /// Rows per bucket (one COPY each).
    #[arg(long, env = "WFLOAD_BATCH_SIZE", default_value_t = config::DEFAULT_BATCH_SIZE)]
    batch_size: i64,
    /// Time between consecutive rows (e.g. 5ms, 250us).
    #[arg(long, env = "WFLOAD_DELTA_RECORD", default_value = "5ms", value_parser = parse_duration)]
    delta_record: Duration,
    /// Buckets queued per table (default: workers).
    #[arg(long, env = "WFLOAD_CHANNEL_CAPACITY")]
    channel_capacity: Option<usize>,
    /// Throughput report period.
    #[arg(long, env = "WFLOAD_REPORT_INTERVAL", default_value = "30s", value_parser = parse_duration)]
    report_interval: Duration,
    #[arg(long, env = "WFLOAD_INPUT_FIXTURE", default_value = config::DEFAULT_INPUT_FIXTURE)]
    input_fixture: PathBuf,
    #[arg(long, env = "WFLOAD_OUTPUT_FIXTURE", default_value = config::DEFAULT_OUTPUT_FIXTURE)]
    output_fixture: PathBuf,
    /// Directory of numbered job payloads (`1.json`, `2.json`, ...).
    #[arg(long, env = "WFLOAD_JOB_FIXTURES", default_value = config::DEFAULT_JOB_FIXTURES)]
    job_fixtures: PathBuf,
    /// Comma-separated subset of `instances,io,jobs`.
    #[arg(long, env = "WFLOAD_TABLES", default_value = "instances,io,jobs", value_parser = parse_table_list)]
    tables: TableList,
}

#[derive(Debug, Clone)]
struct TableList(Vec<TableKind>);

fn parse_table_list(raw: &str) -> Result<TableList, String> {
    config::parse_tables(raw).map(TableList)
}

impl GenerateArgs {
    fn into_config(self) -> GeneratorConfig {
        let mut cfg = GeneratorConfig::new(self.workflow_id);
        cfg.instance_total = self.instance_total;
        if let Some(workers) = self.workers {
            cfg.workers = workers;
        }
        cfg.channel_capacity = self.channel_capacity.unwrap_or(cfg.workers);
        cfg.batch_size = self.batch_size;
        cfg.delta_record = self.delta_record;
        cfg.report_interval = self.report_interval;
        cfg.fixtures = FixturePaths { input: self.input_fixture,
                                      output: self.output_fixture,
                                      job_dir: self.job_fixtures };
        cfg.tables = self.tables.0;
        cfg
    }
}

#[tokio::main]
async fn main() {
    // .env antes de clap: las variables WFLOAD_* también pueden venir de ahí.
    wfload_persistence::init_dotenv();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Generate(args) => run_generate(args.into_config()).await,
        Commands::Stats { tables } => run_stats(tables.0).await,
    };
    match code {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("wfload: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn run_generate(config: GeneratorConfig) -> Result<i32, GeneratorError> {
    config.validate()?;
    let fixtures = Fixtures::load(&config.fixtures, &config.tables)?;
    let db = DbConfig::from_env()?.with_capacity_for(config.pool_size());
    let target = Arc::new(PgTarget::from_pool(open_pool(db).await?));

    let shutdown = Shutdown::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("signal:ctrl_c cancelling run (in-flight copies will finish)");
            on_signal.cancel();
        }
    });

    info!("run:start tables={:?} instance_total={} workers={} batch_size={} delta_record={:?}",
          config.tables, config.instance_total, config.workers, config.batch_size, config.delta_record);
    let summary = generate(&config, target, &fixtures, shutdown).await?;
    Ok(if summary.cancelled { EXIT_CANCELLED } else { 0 })
}

async fn run_stats(tables: Vec<TableKind>) -> Result<i32, GeneratorError> {
    let db = DbConfig::from_env()?;
    let target = Arc::new(PgTarget::from_pool(open_pool(db).await?));
    let stats = collect_stats(Arc::clone(&target), tables.clone()).await?;
    let (table_sizes, database_size) = tokio::task::spawn_blocking(move || {
                                           let sizes = tables.iter()
                                                             .map(|t| target.table_size(*t))
                                                             .collect::<Result<Vec<_>, _>>()?;
                                           Ok::<_, PersistenceError>((sizes, target.database_size()?))
                                       }).await
                                         .map_err(|source| GeneratorError::Join { task: "sizes".into(),
                                                                                  source })??;
    let fmt_ts = |ts: Option<chrono::DateTime<chrono::Utc>>| ts.map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
    for ((table, stats), size) in stats.into_iter().zip(table_sizes) {
        println!("{:<24} rows={:<12} size={:<10} oldest={} newest={}",
                 table.table_name(),
                 stats.row_count,
                 size,
                 fmt_ts(stats.oldest),
                 fmt_ts(stats.newest));
    }
    println!("{:<24} size={}", "database", database_size);
    Ok(0)
}

/// Construir el pool bloquea (checkout inicial): fuera del runtime.
async fn open_pool(db: DbConfig) -> Result<PgPool, GeneratorError> {
    let pool = tokio::task::spawn_blocking(move || build_pool(&db.url, db.min_connections, db.max_connections))
        .await
        .map_err(|source| GeneratorError::Join { task: "pool".into(),
                                                 source })??;
    Ok(pool)
}
