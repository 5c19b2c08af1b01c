//! Worker de copia masiva.
//!
//! Toma fuentes del canal compartido de su tabla y copia cada bucket en el
//! pool de hilos bloqueantes. Un conflicto esperable (duplicado/huérfano) se
//! registra y se sigue; cualquier otro error cancela la corrida completa.

use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use wfload_core::{BulkSink, CopyOutcome, RecordSource, RowGenerator, SkipReason, TableKind};

use crate::errors::GeneratorError;
use crate::shutdown::Shutdown;

pub(crate) type SharedReceiver<G> = Arc<Mutex<mpsc::Receiver<RecordSource<G>>>>;

/// Lo que hizo un worker; se agrega por tabla al final.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct WorkerTally {
    pub buckets: u64,
    pub rows_copied: u64,
    pub duplicate_buckets: u64,
    pub orphan_buckets: u64,
}

impl WorkerTally {
    pub(crate) fn merge(&mut self, other: &WorkerTally) {
        self.buckets += other.buckets;
        self.rows_copied += other.rows_copied;
        self.duplicate_buckets += other.duplicate_buckets;
        self.orphan_buckets += other.orphan_buckets;
    }
}

pub(crate) async fn run_worker<G, S>(table: TableKind,
                                     id: usize,
                                     rx: SharedReceiver<G>,
                                     sink: Arc<S>,
                                     shutdown: Shutdown)
                                     -> Result<WorkerTally, GeneratorError>
    where G: RowGenerator,
          S: BulkSink<G::Record>
{
    let mut tally = WorkerTally::default();
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            source = async { rx.lock().await.recv().await } => source,
        };
        let Some(source) = next else {
            break;
        };

        let bucket = *source.bucket();
        let started = Instant::now();
        let sink = Arc::clone(&sink);
        // Generación y COPY fuera del runtime async; la conexión vive sólo
        // dentro de `copy_in`.
        let joined = tokio::task::spawn_blocking(move || {
                         let records: Vec<G::Record> = source.collect();
                         sink.copy_in(records.as_slice())
                     }).await;

        let outcome = match joined {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => {
                error!("copy:failed table={table} worker={id} bucket={} start={} error={e}",
                       bucket.index, bucket.start);
                shutdown.cancel();
                return Err(GeneratorError::insert(table, e));
            }
            Err(join) => {
                error!("copy:panicked table={table} worker={id} bucket={} error={join}", bucket.index);
                shutdown.cancel();
                return Err(GeneratorError::Join { task: format!("{table} worker {id}"),
                                                  source: join });
            }
        };

        tally.buckets += 1;
        match outcome {
            CopyOutcome::Copied(rows) => {
                tally.rows_copied += rows;
                let took = started.elapsed();
                let rate = if took.as_secs_f64() > 0.0 { rows as f64 / took.as_secs_f64() } else { 0.0 };
                info!("copy:done table={table} worker={id} bucket={} rows={rows} took={took:?} rate={rate:.0}/s",
                      bucket.index);
            }
            CopyOutcome::Skipped { reason, message } => {
                match reason {
                    SkipReason::Duplicate => tally.duplicate_buckets += 1,
                    SkipReason::Orphan => tally.orphan_buckets += 1,
                }
                warn!("copy:skipped table={table} worker={id} bucket={} start={} reason={reason} detail={message}",
                      bucket.index, bucket.start);
            }
        }
    }
    Ok(tally)
}
