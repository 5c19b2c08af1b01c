//! Tarea secuenciadora: emite fuentes de registros, del bucket más reciente
//! al más antiguo, a un canal acotado.

use log::debug;
use std::sync::Arc;
use tokio::sync::mpsc;
use wfload_core::{GenerationCursor, ProgressCounter, RecordSource, RowGenerator, TableKind};

use crate::shutdown::Shutdown;

/// Corre hasta agotar el plan, alcanzar el objetivo o ser cancelada.
/// Devuelve la cantidad de buckets entregados al canal.
pub(crate) async fn run_sequencer<G: RowGenerator>(table: TableKind,
                                                   mut cursor: GenerationCursor,
                                                   generator: Arc<G>,
                                                   counter: ProgressCounter,
                                                   tx: mpsc::Sender<RecordSource<G>>,
                                                   shutdown: Shutdown)
                                                   -> u64 {
    let delta = cursor.plan().delta();
    let target = cursor.plan().generate_count();
    let mut sent: u64 = 0;
    while counter.get() < target {
        let Some(bucket) = cursor.next_bucket() else {
            break;
        };
        debug!("bucket:issue table={} index={} start={} end={} rows={}",
               table, bucket.index, bucket.start, bucket.end, bucket.rows);
        let source = RecordSource::new(bucket, delta, Arc::clone(&generator), counter.clone());
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("sequencer:cancelled table={table} sent={sent}");
                break;
            }
            res = tx.send(source) => {
                if res.is_err() {
                    // Ya no quedan workers escuchando.
                    debug!("sequencer:closed table={table} sent={sent}");
                    break;
                }
                sent += 1;
            }
        }
    }
    debug!("sequencer:done table={table} buckets={sent} scheduled_rows={}", cursor.rows_emitted());
    sent
}
