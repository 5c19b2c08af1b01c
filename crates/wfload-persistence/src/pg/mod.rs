//! Implementación Postgres (Diesel + r2d2) de los contratos del core.
//!
//! - `PgTarget`: destino de copia masiva (`COPY ... FROM STDIN`) para las
//!   tres tablas y fuente de estadísticas de preparación.
//! - Cada copia toma una conexión del pool sólo durante la llamada; el guard
//!   de r2d2 la devuelve en todos los caminos de salida (incluido panic).
//! - Las consultas de preparación reintentan errores transitorios; las copias
//!   no (su resultado se clasifica una sola vez).

mod copy;
mod stats;

pub use copy::{NewInputOutputRow, NewInstanceRow, NewJobRow};

use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use log::{info, warn};

use crate::error::PersistenceError;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Espera máxima por una conexión (construcción del pool y checkout).
pub const POOL_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub type PooledPg = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Contrato:
/// - Debe devolver una conexión válida o `PersistenceError::TransientIo`.
/// - La conexión devuelta no se comparte: un solo usuario a la vez.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PooledPg, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PooledPg, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Determina si un error es transitorio (recomendado reintentar con backoff).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        // Best-effort por texto, sin acoplar a SQLSTATE.
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("terminating connection due to administrator command")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Retry simple con backoff lineal (hasta 3 reintentos: 15ms, 30ms, 45ms).
pub(crate) fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms", attempts + 1, e, delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Destino Postgres de la generación.
pub struct PgTarget<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgTarget<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl PgTarget<PoolProvider> {
    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(PoolProvider { pool })
    }
}

/// Construye un pool Postgres r2d2 a partir de URL.
///
/// - Ajusta tamaños (0 → 1; si `min > max`, usa `min = max`).
/// - Hace un checkout inicial para fallar temprano ante URL/credenciales
///   inválidas.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = if min_size == 0 { 1 } else { min_size };
    let validated_max = if max_size == 0 { 1 } else { max_size };
    if validated_min > validated_max {
        warn!("pool:build min_size > max_size ({} > {}), adjusting min=max", validated_min, validated_max);
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(final_min))
                                    .max_size(validated_max)
                                    .connection_timeout(POOL_CONNECT_TIMEOUT)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let _probe = pool.get()
                         .map_err(|e| PersistenceError::TransientIo(format!("pool get: {e}")))?;
    }
    info!("pool:ready min_idle={final_min} max_size={validated_max}");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retries_transient_errors_then_succeeds() {
        let calls = Cell::new(0);
        let out = with_retry(|| {
                      calls.set(calls.get() + 1);
                      if calls.get() < 3 {
                          Err(PersistenceError::TransientIo("pool error: timed out".into()))
                      } else {
                          Ok(7)
                      }
                  });
        assert_eq!(out.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn gives_up_after_three_retries() {
        let calls = Cell::new(0);
        let out: Result<(), _> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::SerializationConflict)
        });
        assert!(matches!(out, Err(PersistenceError::SerializationConflict)));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn does_not_retry_constraint_errors() {
        let calls = Cell::new(0);
        let out: Result<(), _> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::UniqueViolation("dup".into()))
        });
        assert!(out.is_err());
        assert_eq!(calls.get(), 1);
    }
}
