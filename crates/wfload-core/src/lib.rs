//! wfload-core: generación determinista de filas sintéticas por buckets de tiempo.
//!
//! Este crate no conoce la base de datos ni el runtime async. Define:
//! - `record`: registros de las tres tablas destino y su orden de columnas.
//! - `generator`: productores de filas (instancias, jobs, input/output).
//! - `error_code`: distribución sesgada de códigos de error.
//! - `bucket`: planificación hacia atrás en ventanas de tiempo contiguas.
//! - `source`: fuente perezosa de registros de un bucket.
//! - `progress`: contador de progreso compartido y cálculo de throughput.
//! - `sink`: contratos que implementa la capa de persistencia.
pub mod bucket;
pub mod constants;
pub mod error_code;
pub mod errors;
pub mod generator;
pub mod progress;
pub mod record;
pub mod sink;
pub mod source;

pub use bucket::{generate_count, resolve_anchor, BucketPlan, BucketSpec, GenerationCursor};
pub use error_code::ErrorCodeSampler;
pub use errors::CoreError;
pub use generator::{InputOutputGenerator, InstanceGenerator, JobGenerator, RowGenerator};
pub use progress::{ProgressCounter, ThroughputSample, ThroughputTracker};
pub use record::{InputOutputRecord, InstanceRecord, JobRecord, Record, TableKind};
pub use sink::{BulkSink, CopyOutcome, SkipReason, StatsSource, TableStats};
pub use source::RecordSource;
