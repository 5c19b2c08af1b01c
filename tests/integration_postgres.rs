//! Corrida real contra Postgres (requiere DATABASE_URL; se omite si no está definido).
//! Crea las tablas si faltan y las vacía antes de empezar.


use diesel::connection::SimpleConnection;
use std::sync::Arc;
use test_support::{fixtures, small_config};
use wfload::{generate, Shutdown};
use wfload_core::{StatsSource, TableKind};
use wfload_persistence::{build_pool, DbConfig, PgTarget};

const TEST_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS workflow_instances (
    ts timestamptz NOT NULL, startts timestamptz NOT NULL, endts timestamptz,
    key bigint NOT NULL, workflowkey bigint NOT NULL,
    alternateid1 text, alternateid2 text, action smallint, callbackurl text,
    operationstatus smallint, completionstatus smallint, callbackperformed boolean,
    category text, msisdn text, imsi text, errorcode text,
    PRIMARY KEY (ts, key)
);
CREATE TABLE IF NOT EXISTS workflows_input_output (
    ts timestamptz NOT NULL, key bigint NOT NULL, input text NOT NULL, output text NOT NULL,
    PRIMARY KEY (ts, key),
    FOREIGN KEY (ts, key) REFERENCES workflow_instances (ts, key)
);
CREATE TABLE IF NOT EXISTS workflows_jobs (
    ts timestamptz NOT NULL, key bigint NOT NULL, workflow_key bigint NOT NULL,
    output text NOT NULL, status smallint NOT NULL, startts timestamptz, endts timestamptz,
    FOREIGN KEY (ts, key) REFERENCES workflow_instances (ts, key)
);
TRUNCATE workflows_jobs, workflows_input_output, workflow_instances;
"#;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn second_identical_run_adds_nothing() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL no definido: omitiendo test");
        return;
    }
    let db = DbConfig::from_env().expect("config");
    let pool = build_pool(&db.url, 1, 8).expect("pool");
    pool.get().expect("conn").batch_execute(TEST_DDL).expect("ddl");
    let target = Arc::new(PgTarget::from_pool(pool));

    // Instancias primero: los hijos de la segunda corrida caen sobre ellas.
    let cfg = small_config(1_000, &[TableKind::Instances]);
    let first = generate(&cfg, Arc::clone(&target), &fixtures(), Shutdown::new()).await
                                                                            .expect("first run");
    assert_eq!(first.table(TableKind::Instances).unwrap().rows_copied, 1_000);

    let cfg = small_config(1_000, &TableKind::ALL);
    let second = generate(&cfg, Arc::clone(&target), &fixtures(), Shutdown::new()).await
                                                                             .expect("second run");
    assert_eq!(second.table(TableKind::Instances).unwrap().buckets_issued, 0);
    for child in [TableKind::InputOutput, TableKind::Jobs] {
        let t = second.table(child).unwrap();
        assert_eq!(t.rows_copied, 1_000, "{child}");
        assert_eq!(t.orphan_buckets, 0, "{child}");
    }

    let third = generate(&cfg, Arc::clone(&target), &fixtures(), Shutdown::new()).await
                                                                            .expect("third run");
    assert_eq!(third.rows_produced(), 0);
    for table in TableKind::ALL {
        assert_eq!(target.table_stats(table).unwrap().row_count, 1_000, "{table}");
    }
}
