//! wfload-persistence: destino Postgres para la generación de carga.
//!
//! Módulos:
//! - `config`: lectura de `DATABASE_URL` y tamaños de pool (con `.env`).
//! - `error`: mapeo de errores Diesel/r2d2 a variantes semánticas.
//! - `conflict`: qué errores de copia se descartan y cuáles son fatales.
//! - `schema`: tablas Diesel (las tablas las crea un proceso externo).
//! - `pg`: pool, proveedor de conexiones y `PgTarget`.
pub mod config;
pub mod conflict;
pub mod error;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use conflict::classify_copy;
pub use error::PersistenceError;
pub use pg::{build_pool, ConnectionProvider, PgPool, PgTarget, PoolProvider};
