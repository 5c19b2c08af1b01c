//! wfload: generador de carga sintética para las tablas de workflows.
//!
//! - `config`: parámetros de la corrida y parseo de duraciones/tablas.
//! - `fixtures`: payloads leídos al arrancar.
//! - `pipeline`: secuenciadores, workers de copia y resumen de la corrida.
//! - `reporter`: línea periódica de throughput.
//! - `shutdown`: token de cancelación.
//!
//! La lógica de generación vive en `wfload-core`; Postgres en
//! `wfload-persistence`.

pub mod config;
pub mod errors;
pub mod fixtures;
pub mod pipeline;
pub mod reporter;
pub mod shutdown;

pub use config::{FixturePaths, GeneratorConfig};
pub use errors::GeneratorError;
pub use fixtures::Fixtures;
pub use pipeline::{collect_stats, generate, preflight, LoadTarget, RunSummary, TableSummary};
pub use shutdown::Shutdown;
