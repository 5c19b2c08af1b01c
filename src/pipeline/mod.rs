//! Orquestación de una corrida.
//!
//! Por cada tabla seleccionada: una tarea secuenciadora, un canal acotado y
//! `workers` tareas de copia. Las tres tablas corren en paralelo sobre el
//! mismo destino y comparten el token de cancelación.
//!
//! Flujo de `generate`:
//! 1. Validar configuración.
//! 2. Preparación (bloqueante): verificar tablas y leer conteo y rango de `ts`.
//! 3. Planificar cada tabla (ancla, filas faltantes, buckets, generador).
//!    Si alguna falla no se lanza ninguna tarea.
//! 4. Lanzar reporter, secuenciadores y workers; esperar a todos.
//! 5. Devolver el resumen, o el primer error fatal.

mod sequencer;
mod worker;

use chrono::{DateTime, Utc};
use log::{error, info};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use wfload_core::{generate_count, resolve_anchor, BucketPlan, BulkSink, ErrorCodeSampler, GenerationCursor,
                  InputOutputGenerator, InputOutputRecord, InstanceGenerator, InstanceRecord, JobGenerator, JobRecord,
                  ProgressCounter, RowGenerator, StatsSource, TableKind, TableStats};

use crate::config::GeneratorConfig;
use crate::errors::GeneratorError;
use crate::fixtures::Fixtures;
use crate::reporter::spawn_reporter;
use crate::shutdown::Shutdown;
use worker::WorkerTally;

/// Destino completo de una corrida: estadísticas más copia de las tres variantes.
pub trait LoadTarget:
    StatsSource + BulkSink<InstanceRecord> + BulkSink<InputOutputRecord> + BulkSink<JobRecord>
{
}

impl<T> LoadTarget for T where T: StatsSource + BulkSink<InstanceRecord> + BulkSink<InputOutputRecord> + BulkSink<JobRecord>
{
}

/// Resultado por tabla.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub table: TableKind,
    /// Filas presentes antes de empezar.
    pub rows_before: i64,
    pub generate_count: i64,
    pub anchor: DateTime<Utc>,
    pub buckets_issued: u64,
    pub buckets_processed: u64,
    /// Valor final del contador de progreso (filas producidas).
    pub rows_produced: i64,
    pub rows_copied: u64,
    pub duplicate_buckets: u64,
    pub orphan_buckets: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub tables: Vec<TableSummary>,
    pub elapsed: Duration,
    /// La corrida se detuvo por Ctrl-C antes de completar el plan.
    pub cancelled: bool,
}

impl RunSummary {
    pub fn table(&self, table: TableKind) -> Option<&TableSummary> {
        self.tables.iter().find(|t| t.table == table)
    }

    pub fn rows_produced(&self) -> i64 {
        self.tables.iter().map(|t| t.rows_produced).sum()
    }

    pub fn rows_copied(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_copied).sum()
    }
}

/// Estado de cada tabla antes de generar.
#[derive(Debug, Clone, PartialEq)]
pub struct Preflight {
    pub instances: TableStats,
    pub tables: Vec<(TableKind, TableStats)>,
}

/// Verifica las tablas seleccionadas (y la de instancias, que ancla a las
/// hijas) y lee sus estadísticas. Corre en el pool bloqueante.
pub async fn preflight<T: StatsSource>(target: Arc<T>, tables: Vec<TableKind>) -> Result<Preflight, GeneratorError> {
    tokio::task::spawn_blocking(move || {
        target.ensure_table(TableKind::Instances)
              .map_err(|e| GeneratorError::setup(TableKind::Instances, e))?;
        let instances = target.table_stats(TableKind::Instances)
                              .map_err(|e| GeneratorError::setup(TableKind::Instances, e))?;
        let mut per_table = Vec::with_capacity(tables.len());
        for table in tables {
            if table == TableKind::Instances {
                per_table.push((table, instances));
                continue;
            }
            target.ensure_table(table).map_err(|e| GeneratorError::setup(table, e))?;
            let stats = target.table_stats(table).map_err(|e| GeneratorError::setup(table, e))?;
            per_table.push((table, stats));
        }
        Ok(Preflight { instances,
                       tables: per_table })
    }).await
      .map_err(|source| GeneratorError::Join { task: "preflight".into(),
                                               source })?
}

/// Ejecuta una corrida completa contra `target`.
///
/// Una cancelación externa (Ctrl-C) termina con `Ok` y `cancelled = true`;
/// un error fatal de copia cancela al resto y se devuelve como `Err`.
pub async fn generate<T: LoadTarget>(config: &GeneratorConfig,
                                     target: Arc<T>,
                                     fixtures: &Fixtures,
                                     shutdown: Shutdown)
                                     -> Result<RunSummary, GeneratorError> {
    config.validate()?;
    let started = Instant::now();
    let pre = preflight(Arc::clone(&target), config.tables.clone()).await?;
    let now = Utc::now();

    // Todo lo que puede fallar se resuelve antes de lanzar la primera tarea.
    let mut setups = Vec::with_capacity(pre.tables.len());
    for (table, stats) in &pre.tables {
        let count = generate_count(config.instance_total, stats.row_count);
        let plan = BucketPlan::new(config.batch_size, config.delta_record, count)?;
        let anchor = resolve_anchor(*table, stats, &pre.instances, plan.delta(), now);
        let generator = match table {
            TableKind::Instances => {
                TableGenerator::Instances(InstanceGenerator::new(config.workflow_id,
                                                                 Arc::new(ErrorCodeSampler::new())))
            }
            TableKind::InputOutput => {
                let (input, output) = fixtures.input_output()?;
                TableGenerator::InputOutput(InputOutputGenerator::new(input, output))
            }
            TableKind::Jobs => {
                TableGenerator::Jobs(JobGenerator::new(config.workflow_id, fixtures.job_outputs.clone())?)
            }
        };
        info!("plan:ready table={} rows_present={} generate={} buckets={} anchor={}",
              table,
              stats.row_count,
              count.max(0),
              plan.expected_buckets(),
              anchor);
        setups.push((TableSetup { table: *table,
                                  rows_before: stats.row_count,
                                  anchor,
                                  cursor: GenerationCursor::new(anchor, plan) },
                     generator));
    }

    let runs: Vec<TableRun> =
        setups.into_iter()
              .map(|(setup, generator)| match generator {
                  TableGenerator::Instances(g) => spawn_table(setup, g, Arc::clone(&target), config, &shutdown),
                  TableGenerator::InputOutput(g) => spawn_table(setup, g, Arc::clone(&target), config, &shutdown),
                  TableGenerator::Jobs(g) => spawn_table(setup, g, Arc::clone(&target), config, &shutdown),
              })
              .collect();

    let stop_reporter = Shutdown::new();
    let counters: Vec<ProgressCounter> = runs.iter().map(|r| r.counter.clone()).collect();
    let reporter = spawn_reporter(counters, config.report_interval, stop_reporter.clone());

    let mut summaries = Vec::with_capacity(runs.len());
    let mut first_error: Option<GeneratorError> = None;
    for run in runs {
        match run.finish().await {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                shutdown.cancel();
                first_error.get_or_insert(e);
            }
        }
    }
    stop_reporter.cancel();
    if let Err(e) = reporter.await {
        error!("reporter:failed error={e}");
    }

    if let Some(e) = first_error {
        error!("run:failed error={e}");
        return Err(e);
    }
    let summary = RunSummary { tables: summaries,
                               elapsed: started.elapsed(),
                               cancelled: shutdown.is_cancelled() };
    for t in &summary.tables {
        info!("summary table={} buckets={} rows_produced={} rows_copied={} duplicate_buckets={} orphan_buckets={} took={:?}",
              t.table,
              t.buckets_processed,
              t.rows_produced,
              t.rows_copied,
              t.duplicate_buckets,
              t.orphan_buckets,
              t.elapsed);
    }
    info!("run:done rows_produced={} rows_copied={} cancelled={} took={:?}",
          summary.rows_produced(),
          summary.rows_copied(),
          summary.cancelled,
          summary.elapsed);
    Ok(summary)
}

/// Filas y rango de `ts` de cada tabla (subcomando `stats`).
pub async fn collect_stats<T: StatsSource>(target: Arc<T>,
                                           tables: Vec<TableKind>)
                                           -> Result<Vec<(TableKind, TableStats)>, GeneratorError> {
    Ok(preflight(target, tables).await?.tables)
}

enum TableGenerator {
    Instances(InstanceGenerator),
    InputOutput(InputOutputGenerator),
    Jobs(JobGenerator),
}

struct TableSetup {
    table: TableKind,
    rows_before: i64,
    anchor: DateTime<Utc>,
    cursor: GenerationCursor,
}

/// Tareas en vuelo de una tabla.
struct TableRun {
    table: TableKind,
    rows_before: i64,
    anchor: DateTime<Utc>,
    generate_count: i64,
    counter: ProgressCounter,
    started: Instant,
    sequencer: JoinHandle<u64>,
    workers: Vec<JoinHandle<Result<WorkerTally, GeneratorError>>>,
}

fn spawn_table<G, S>(setup: TableSetup,
                     generator: G,
                     sink: Arc<S>,
                     config: &GeneratorConfig,
                     shutdown: &Shutdown)
                     -> TableRun
    where G: RowGenerator,
          S: BulkSink<G::Record>
{
    let TableSetup { table,
                     rows_before,
                     anchor,
                     cursor } = setup;
    let generate_count = cursor.plan().generate_count();
    let counter = ProgressCounter::new();
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let rx = Arc::new(Mutex::new(rx));
    let sequencer = tokio::spawn(sequencer::run_sequencer(table,
                                                          cursor,
                                                          Arc::new(generator),
                                                          counter.clone(),
                                                          tx,
                                                          shutdown.clone()));
    let workers = (0..config.workers).map(|id| {
                                         tokio::spawn(worker::run_worker(table,
                                                                         id,
                                                                         Arc::clone(&rx),
                                                                         Arc::clone(&sink),
                                                                         shutdown.clone()))
                                     })
                                     .collect();
    TableRun { table,
               rows_before,
               anchor,
               generate_count,
               counter,
               started: Instant::now(),
               sequencer,
               workers }
}

impl TableRun {
    /// Espera al secuenciador y a todos los workers (las copias en curso
    /// terminan aunque haya cancelación).
    async fn finish(self) -> Result<TableSummary, GeneratorError> {
        let mut first_error = None;
        let mut tally = WorkerTally::default();
        for handle in self.workers {
            match handle.await {
                Ok(Ok(t)) => tally.merge(&t),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(source) => {
                    first_error.get_or_insert(GeneratorError::Join { task: format!("{} worker", self.table),
                                                                     source });
                }
            }
        }
        let issued = self.sequencer
                         .await
                         .map_err(|source| GeneratorError::Join { task: format!("{} sequencer", self.table),
                                                                  source });
        if let Some(e) = first_error {
            return Err(e);
        }
        Ok(TableSummary { table: self.table,
                          rows_before: self.rows_before,
                          generate_count: self.generate_count,
                          anchor: self.anchor,
                          buckets_issued: issued?,
                          buckets_processed: tally.buckets,
                          rows_produced: self.counter.get(),
                          rows_copied: tally.rows_copied,
                          duplicate_buckets: tally.duplicate_buckets,
                          orphan_buckets: tally.orphan_buckets,
                          elapsed: self.started.elapsed() })
    }
}
