use diesel::connection::SimpleConnection;
use once_cell::sync::Lazy;
use std::sync::{Mutex, MutexGuard, PoisonError};
use wfload_persistence::config::DbConfig;
use wfload_persistence::pg::{build_pool, PgPool};

// Esquema mínimo equivalente al provisto en producción (sólo para tests).
const TEST_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS workflow_instances (
    ts timestamptz NOT NULL,
    startts timestamptz NOT NULL,
    endts timestamptz,
    key bigint NOT NULL,
    workflowkey bigint NOT NULL,
    alternateid1 text,
    alternateid2 text,
    action smallint,
    callbackurl text,
    operationstatus smallint,
    completionstatus smallint,
    callbackperformed boolean,
    category text,
    msisdn text,
    imsi text,
    errorcode text,
    PRIMARY KEY (ts, key)
);
CREATE TABLE IF NOT EXISTS workflows_input_output (
    ts timestamptz NOT NULL,
    key bigint NOT NULL,
    input text NOT NULL,
    output text NOT NULL,
    PRIMARY KEY (ts, key),
    FOREIGN KEY (ts, key) REFERENCES workflow_instances (ts, key)
);
CREATE TABLE IF NOT EXISTS workflows_jobs (
    ts timestamptz NOT NULL,
    key bigint NOT NULL,
    workflow_key bigint NOT NULL,
    output text NOT NULL,
    status smallint NOT NULL,
    startts timestamptz,
    endts timestamptz,
    FOREIGN KEY (ts, key) REFERENCES workflow_instances (ts, key)
);
"#;

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    if std::env::var("DATABASE_URL").is_err() {
        return None;
    }
    let cfg = match DbConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config de test inválida: {e}");
            return None;
        }
    };
    match build_pool(&cfg.url, 1, 4) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

// Los tests de un mismo binario comparten tablas: se serializan.
static DB_LOCK: Mutex<()> = Mutex::new(());

/// Ejecuta `f` con las tres tablas creadas y vacías. `None` si no hay base.
pub fn with_clean_db<F, R>(f: F) -> Option<R>
    where F: FnOnce(&PgPool) -> R
{
    let pool = TEST_POOL.as_ref()?;
    let _guard: MutexGuard<'_, ()> = DB_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let mut conn = pool.get().expect("conn");
    conn.batch_execute(TEST_DDL).expect("ddl");
    conn.batch_execute("TRUNCATE workflows_jobs, workflows_input_output, workflow_instances;")
        .expect("truncate");
    drop(conn);
    Some(f(pool))
}
