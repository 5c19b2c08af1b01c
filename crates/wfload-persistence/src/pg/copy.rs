//! Copia masiva (`COPY ... FROM STDIN (FORMAT binary)`) de un bucket.
//!
//! Las filas insertables toman prestados los campos de texto del registro;
//! no se clona ningún payload para copiar.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use wfload_core::{BulkSink, CopyOutcome, InputOutputRecord, InstanceRecord, JobRecord, Record};

use super::{ConnectionProvider, PgTarget};
use crate::conflict::classify_copy;
use crate::error::PersistenceError;
use crate::schema::{workflow_instances, workflows_input_output, workflows_jobs};

#[derive(Debug, Insertable)]
#[diesel(table_name = workflow_instances)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewInstanceRow<'a> {
    pub ts: DateTime<Utc>,
    pub startts: DateTime<Utc>,
    pub endts: Option<DateTime<Utc>>,
    pub key: i64,
    pub workflowkey: i64,
    pub alternateid1: Option<&'a str>,
    pub alternateid2: Option<&'a str>,
    pub action: Option<i16>,
    pub callbackurl: Option<&'a str>,
    pub operationstatus: Option<i16>,
    pub completionstatus: Option<i16>,
    pub callbackperformed: Option<bool>,
    pub category: Option<&'a str>,
    pub msisdn: Option<&'a str>,
    pub imsi: Option<&'a str>,
    pub errorcode: Option<&'a str>,
}

impl<'a> From<&'a InstanceRecord> for NewInstanceRow<'a> {
    fn from(r: &'a InstanceRecord) -> Self {
        Self { ts: r.ts,
               startts: r.start_ts,
               endts: r.end_ts,
               key: r.key,
               workflowkey: r.workflow_key,
               alternateid1: Some(r.alternate_id1.as_str()),
               alternateid2: Some(r.alternate_id2.as_str()),
               action: Some(r.action),
               callbackurl: Some(r.callback_url),
               operationstatus: Some(r.operation_status),
               completionstatus: Some(r.completion_status),
               callbackperformed: Some(r.callback_performed),
               category: Some(r.category),
               msisdn: Some(r.msisdn),
               imsi: Some(r.imsi),
               errorcode: Some(r.error_code) }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = workflows_input_output)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewInputOutputRow<'a> {
    pub ts: DateTime<Utc>,
    pub key: i64,
    pub input: &'a str,
    pub output: &'a str,
}

impl<'a> From<&'a InputOutputRecord> for NewInputOutputRow<'a> {
    fn from(r: &'a InputOutputRecord) -> Self {
        Self { ts: r.ts,
               key: r.key,
               input: &r.input,
               output: &r.output }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = workflows_jobs)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewJobRow<'a> {
    pub ts: DateTime<Utc>,
    pub key: i64,
    pub workflow_key: i64,
    pub output: &'a str,
    pub status: i16,
    pub startts: Option<DateTime<Utc>>,
    pub endts: Option<DateTime<Utc>>,
}

impl<'a> From<&'a JobRecord> for NewJobRow<'a> {
    fn from(r: &'a JobRecord) -> Self {
        Self { ts: r.ts,
               key: r.key,
               workflow_key: r.workflow_key,
               output: &r.output,
               status: r.status,
               startts: r.start_ts,
               endts: r.end_ts }
    }
}

// Cada variante difiere sólo en la tabla y en la fila insertable; los bounds
// de `copy_from` dependen de la tabla concreta, de ahí la macro.
macro_rules! impl_bulk_sink {
    ($record:ty, $row:ident, $table:path) => {
        impl<P: ConnectionProvider> BulkSink<$record> for PgTarget<P> {
            type Error = PersistenceError;

            fn copy_in(&self, records: &[$record]) -> Result<CopyOutcome, PersistenceError> {
                if records.is_empty() {
                    return Ok(CopyOutcome::Copied(0));
                }
                let rows: Vec<$row<'_>> = records.iter().map($row::from).collect();
                let mut conn = self.provider.connection()?;
                let result = diesel::copy_from($table).from_insertable(rows)
                                                      .execute(&mut *conn)
                                                      .map_err(PersistenceError::from);
                let outcome = classify_copy(result)?;
                debug!("copy:done table={} rows={} outcome={:?}",
                       <$record as Record>::TABLE.table_name(),
                       records.len(),
                       outcome);
                Ok(outcome)
            }
        }
    };
}

impl_bulk_sink!(InstanceRecord, NewInstanceRow, workflow_instances::table);
impl_bulk_sink!(InputOutputRecord, NewInputOutputRow, workflows_input_output::table);
impl_bulk_sink!(JobRecord, NewJobRow, workflows_jobs::table);
