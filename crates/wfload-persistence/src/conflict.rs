//! Política de conflictos de la copia masiva.
//!
//! - Violación de unicidad (`23505`): el bucket ya fue sembrado por una
//!   corrida anterior; se descarta y se sigue.
//! - Violación de FK (`23503`): filas hijas cuya instancia no existe (todavía);
//!   la FK las rechaza y se descarta el bucket.
//! - Cualquier otro error es fatal.
//!
//! `COPY` es atómico: un conflicto descarta el bucket entero.

use wfload_core::{CopyOutcome, SkipReason};

use crate::error::PersistenceError;

/// Clasifica el resultado de una copia.
pub fn classify_copy(result: Result<usize, PersistenceError>) -> Result<CopyOutcome, PersistenceError> {
    match result {
        Ok(rows) => Ok(CopyOutcome::Copied(rows as u64)),
        Err(PersistenceError::UniqueViolation(message)) => Ok(CopyOutcome::Skipped { reason: SkipReason::Duplicate,
                                                                                    message }),
        Err(PersistenceError::ForeignKeyViolation(message)) => Ok(CopyOutcome::Skipped { reason: SkipReason::Orphan,
                                                                                        message }),
        // Algunos drivers/paths de COPY no exponen el SQLSTATE; best-effort por texto.
        Err(PersistenceError::Unknown(message)) if is_duplicate_message(&message) => {
            Ok(CopyOutcome::Skipped { reason: SkipReason::Duplicate,
                                      message })
        }
        Err(other) => Err(other),
    }
}

fn is_duplicate_message(message: &str) -> bool {
    let m = message.to_lowercase();
    m.contains("duplicate key value violates unique constraint")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copied_rows_pass_through() {
        assert_eq!(classify_copy(Ok(100)).unwrap(), CopyOutcome::Copied(100));
    }

    #[test]
    fn unique_violation_is_skipped() {
        let out = classify_copy(Err(PersistenceError::UniqueViolation("dup (ts, key)".into()))).unwrap();
        assert_eq!(out,
                   CopyOutcome::Skipped { reason: SkipReason::Duplicate,
                                          message: "dup (ts, key)".into() });
    }

    #[test]
    fn foreign_key_violation_is_skipped_as_orphan() {
        let out = classify_copy(Err(PersistenceError::ForeignKeyViolation("fk".into()))).unwrap();
        assert!(matches!(out, CopyOutcome::Skipped { reason: SkipReason::Orphan, .. }));
    }

    #[test]
    fn duplicate_text_in_unknown_error_is_skipped() {
        let msg = "db error kind Unknown: duplicate key value violates unique constraint \"workflow_instances_pkey\"";
        let out = classify_copy(Err(PersistenceError::Unknown(msg.into()))).unwrap();
        assert!(matches!(out, CopyOutcome::Skipped { reason: SkipReason::Duplicate, .. }));
    }

    #[test]
    fn everything_else_is_fatal() {
        assert!(classify_copy(Err(PersistenceError::TransientIo("pool timeout".into()))).is_err());
        assert!(classify_copy(Err(PersistenceError::CheckViolation("status".into()))).is_err());
        assert!(classify_copy(Err(PersistenceError::Unknown("syntax error".into()))).is_err());
    }
}
