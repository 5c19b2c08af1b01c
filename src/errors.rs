//! Errores de la aplicación (configuración, preparación, fixtures y corrida).

use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;
use wfload_core::{CoreError, TableKind};
use wfload_persistence::PersistenceError;

/// Error opaco del destino (Postgres o destinos de test).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("fixture {}: {source}", .path.display())]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("setup failed for {table}: {source}")]
    Setup {
        table: TableKind,
        #[source]
        source: BoxError,
    },
    #[error("bulk copy into {table} failed: {source}")]
    Insert {
        table: TableKind,
        #[source]
        source: BoxError,
    },
    #[error("{task} task failed: {source}")]
    Join {
        task: String,
        #[source]
        source: tokio::task::JoinError,
    },
    #[error(transparent)]
    Plan(#[from] CoreError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl GeneratorError {
    pub(crate) fn setup<E>(table: TableKind, err: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Self::Setup { table,
                      source: Box::new(err) }
    }

    pub(crate) fn insert<E>(table: TableKind, err: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Self::Insert { table,
                       source: Box::new(err) }
    }

    /// Código de salida del binario para este error.
    pub fn exit_code(&self) -> i32 {
        match self {
            GeneratorError::Config(_) | GeneratorError::Plan(_) => 2,
            GeneratorError::Fixture { .. } => 3,
            GeneratorError::Setup { .. } | GeneratorError::Persistence(_) => 4,
            GeneratorError::Insert { .. } | GeneratorError::Join { .. } => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_error_names_the_table() {
        let err = GeneratorError::insert(TableKind::Jobs, PersistenceError::CheckViolation("status".into()));
        assert_eq!(err.to_string(), "bulk copy into jobs failed: check violation: status");
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn fixture_error_shows_path() {
        let err = GeneratorError::Fixture { path: PathBuf::from("./io-data/wf_input.json"),
                                            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing") };
        assert_eq!(err.to_string(), "fixture ./io-data/wf_input.json: missing");
    }

    #[test]
    fn core_errors_convert() {
        let err: GeneratorError = CoreError::EmptyJobPayloads.into();
        assert_eq!(err.to_string(), "job payload set is empty");
        assert_eq!(err.exit_code(), 2);
    }
}
