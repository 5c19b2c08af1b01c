//! Contratos hacia la capa de persistencia.
//!
//! El pipeline sólo conoce estos traits; Postgres los implementa en
//! `wfload-persistence` y los tests usan destinos en memoria.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::record::{Record, TableKind};

/// Motivo por el que un bucket completo no se insertó sin que sea fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Violación de unicidad: filas ya sembradas por una corrida anterior.
    Duplicate,
    /// Violación de FK: filas hijas cuya instancia aún no existe.
    Orphan,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Duplicate => f.write_str("duplicate"),
            SkipReason::Orphan => f.write_str("orphan"),
        }
    }
}

/// Resultado no fatal de una copia masiva.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied(u64),
    Skipped { reason: SkipReason, message: String },
}

/// Destino de copia masiva para una variante de registro.
///
/// Contrato:
/// - Una llamada = una copia masiva de todas las filas recibidas.
/// - La conexión se adquiere y libera dentro de la llamada.
/// - Conflictos esperables se devuelven como `Ok(CopyOutcome::Skipped)`;
///   cualquier `Err` se considera fatal para la corrida.
pub trait BulkSink<R: Record>: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn copy_in(&self, records: &[R]) -> Result<CopyOutcome, Self::Error>;
}

/// Estado de una tabla antes de generar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableStats {
    pub row_count: i64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// Consultas de preparación (una sola vez por corrida).
pub trait StatsSource: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Falla si la tabla no existe.
    fn ensure_table(&self, table: TableKind) -> Result<(), Self::Error>;

    fn table_stats(&self, table: TableKind) -> Result<TableStats, Self::Error>;
}
