//! Errores del core (sólo validación: la generación en sí no falla).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CoreError {
    #[error("unknown table: {0}")] UnknownTable(String),
    #[error("job payload set is empty")] EmptyJobPayloads,
    #[error("invalid bucket plan: {0}")] InvalidPlan(String),
}
