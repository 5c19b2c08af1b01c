//! Consultas de preparación: existencia de la tabla y conteo/rango de `ts`.
//! También los tamaños en disco que muestra `wfload stats`.

use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, max, min};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Nullable, Text};
use log::{debug, info};
use wfload_core::{StatsSource, TableKind, TableStats};

use super::{with_retry, ConnectionProvider, PgTarget};
use crate::error::PersistenceError;
use crate::schema::{workflow_instances, workflows_input_output, workflows_jobs};

#[derive(QueryableByName)]
struct RegClass {
    #[diesel(sql_type = Nullable<Text>)]
    relation: Option<String>,
}

#[derive(QueryableByName)]
struct PrettySize {
    #[diesel(sql_type = Text)]
    size: String,
}

type StatsRow = (i64, Option<DateTime<Utc>>, Option<DateTime<Utc>>);

impl<P: ConnectionProvider> StatsSource for PgTarget<P> {
    type Error = PersistenceError;

    fn ensure_table(&self, table: TableKind) -> Result<(), PersistenceError> {
        let name = table.table_name();
        let found = with_retry(|| {
                        let mut conn = self.provider.connection()?;
                        let row: RegClass = sql_query("SELECT to_regclass($1)::text AS relation").bind::<Text, _>(name)
                                                                                                .get_result(&mut *conn)?;
                        Ok(row.relation)
                    })?;
        match found {
            Some(relation) => {
                debug!("preflight:ok table={name} relation={relation}");
                Ok(())
            }
            None => Err(PersistenceError::MissingTable(name.to_string())),
        }
    }

    fn table_stats(&self, table: TableKind) -> Result<TableStats, PersistenceError> {
        let (row_count, oldest, newest) = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let row: StatsRow = match table {
                TableKind::Instances => workflow_instances::table.select((count_star(),
                                                                          min(workflow_instances::ts),
                                                                          max(workflow_instances::ts)))
                                                                 .get_result(&mut *conn)?,
                TableKind::InputOutput => workflows_input_output::table.select((count_star(),
                                                                                min(workflows_input_output::ts),
                                                                                max(workflows_input_output::ts)))
                                                                       .get_result(&mut *conn)?,
                TableKind::Jobs => workflows_jobs::table.select((count_star(),
                                                                 min(workflows_jobs::ts),
                                                                 max(workflows_jobs::ts)))
                                                        .get_result(&mut *conn)?,
            };
            Ok(row)
        })?;
        info!("stats:read table={} rows={} oldest={:?} newest={:?}",
              table.table_name(),
              row_count,
              oldest,
              newest);
        Ok(TableStats { row_count,
                        oldest,
                        newest })
    }
}

impl<P: ConnectionProvider> PgTarget<P> {
    /// Tamaño total de la tabla (datos, índices y TOAST), legible (`pg_size_pretty`).
    pub fn table_size(&self, table: TableKind) -> Result<String, PersistenceError> {
        let name = table.table_name();
        let row: PrettySize = with_retry(|| {
                                  let mut conn = self.provider.connection()?;
                                  Ok(sql_query("SELECT pg_size_pretty(pg_total_relation_size($1::regclass)) AS size")
                                      .bind::<Text, _>(name)
                                      .get_result(&mut *conn)?)
                              })?;
        debug!("stats:size table={name} size={}", row.size);
        Ok(row.size)
    }

    /// Tamaño de la base de datos actual.
    pub fn database_size(&self) -> Result<String, PersistenceError> {
        let row: PrettySize = with_retry(|| {
                                  let mut conn = self.provider.connection()?;
                                  Ok(sql_query("SELECT pg_size_pretty(pg_database_size(current_database())) AS size")
                                      .get_result(&mut *conn)?)
                              })?;
        Ok(row.size)
    }
}
