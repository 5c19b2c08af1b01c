//! Registros sintéticos de las tres tablas destino.
//!
//! Las tres variantes comparten el eje de tiempo: `(ts, key)` identifica una
//! fila y `key` se deriva de `ts` en nanosegundos, de modo que el job y el
//! input/output generados para un instante apuntan a la instancia de ese
//! mismo instante.

use chrono::{DateTime, SubsecRound, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::CoreError;

/// Tabla destino de un flujo de generación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    Instances,
    InputOutput,
    Jobs,
}

const INSTANCE_COLUMNS: &[&str] = &["ts",
                                    "startts",
                                    "endts",
                                    "key",
                                    "workflowkey",
                                    "alternateid1",
                                    "alternateid2",
                                    "action",
                                    "callbackurl",
                                    "operationstatus",
                                    "completionstatus",
                                    "callbackperformed",
                                    "category",
                                    "msisdn",
                                    "imsi",
                                    "errorcode"];
const INPUT_OUTPUT_COLUMNS: &[&str] = &["ts", "key", "input", "output"];
const JOB_COLUMNS: &[&str] = &["ts", "key", "workflow_key", "output", "status", "startts", "endts"];

impl TableKind {
    /// Orden de padres a hijos (las tablas hijas tienen FK a instancias).
    pub const ALL: [TableKind; 3] = [TableKind::Instances, TableKind::InputOutput, TableKind::Jobs];

    /// Nombre físico de la tabla.
    pub fn table_name(self) -> &'static str {
        match self {
            TableKind::Instances => "workflow_instances",
            TableKind::InputOutput => "workflows_input_output",
            TableKind::Jobs => "workflows_jobs",
        }
    }

    /// Columnas en el orden exacto en que se copian.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            TableKind::Instances => INSTANCE_COLUMNS,
            TableKind::InputOutput => INPUT_OUTPUT_COLUMNS,
            TableKind::Jobs => JOB_COLUMNS,
        }
    }

    /// Etiqueta corta usada en logs y en la CLI.
    pub fn label(self) -> &'static str {
        match self {
            TableKind::Instances => "instances",
            TableKind::InputOutput => "io",
            TableKind::Jobs => "jobs",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TableKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instances" | "instance" | "workflow_instances" => Ok(TableKind::Instances),
            "io" | "input_output" | "workflows_input_output" => Ok(TableKind::InputOutput),
            "jobs" | "job" | "workflows_jobs" => Ok(TableKind::Jobs),
            other => Err(CoreError::UnknownTable(other.to_string())),
        }
    }
}

/// Trunca a microsegundos, la precisión de `timestamptz`.
pub fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Clave derivada del instante: nanosegundos desde epoch (con `ts` ya
/// truncado a microsegundos, por lo que el valor es múltiplo de 1000).
pub fn key_for(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros().saturating_mul(1_000)
}

/// Registro con posición en el eje de tiempo compartido.
pub trait Record {
    const TABLE: TableKind;
    fn ts(&self) -> DateTime<Utc>;
    fn key(&self) -> i64;
}

/// Fila de `workflow_instances`.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRecord {
    pub ts: DateTime<Utc>,
    pub start_ts: DateTime<Utc>,
    pub end_ts: Option<DateTime<Utc>>,
    pub key: i64,
    pub workflow_key: i64,
    pub alternate_id1: String,
    pub alternate_id2: String,
    pub action: i16,
    pub callback_url: &'static str,
    pub operation_status: i16,
    pub completion_status: i16,
    pub callback_performed: bool,
    pub category: &'static str,
    pub msisdn: &'static str,
    pub imsi: &'static str,
    pub error_code: &'static str,
}

/// Fila de `workflows_jobs`. El payload se comparte entre filas.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub ts: DateTime<Utc>,
    pub key: i64,
    pub workflow_key: i64,
    pub output: Arc<str>,
    pub status: i16,
    pub start_ts: Option<DateTime<Utc>>,
    pub end_ts: Option<DateTime<Utc>>,
}

/// Fila de `workflows_input_output`. Ambos payloads se cargan una vez.
#[derive(Debug, Clone, PartialEq)]
pub struct InputOutputRecord {
    pub ts: DateTime<Utc>,
    pub key: i64,
    pub input: Arc<str>,
    pub output: Arc<str>,
}

impl Record for InstanceRecord {
    const TABLE: TableKind = TableKind::Instances;
    fn ts(&self) -> DateTime<Utc> {
        self.ts
    }
    fn key(&self) -> i64 {
        self.key
    }
}

impl Record for JobRecord {
    const TABLE: TableKind = TableKind::Jobs;
    fn ts(&self) -> DateTime<Utc> {
        self.ts
    }
    fn key(&self) -> i64 {
        self.key
    }
}

impl Record for InputOutputRecord {
    const TABLE: TableKind = TableKind::InputOutput;
    fn ts(&self) -> DateTime<Utc> {
        self.ts
    }
    fn key(&self) -> i64 {
        self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_table_aliases() {
        assert_eq!("instances".parse::<TableKind>().unwrap(), TableKind::Instances);
        assert_eq!(" IO ".parse::<TableKind>().unwrap(), TableKind::InputOutput);
        assert_eq!("workflows_jobs".parse::<TableKind>().unwrap(), TableKind::Jobs);
        assert!(matches!("events".parse::<TableKind>(), Err(CoreError::UnknownTable(_))));
    }

    #[test]
    fn column_lists_match_table_arity() {
        assert_eq!(TableKind::Instances.columns().len(), 16);
        assert_eq!(TableKind::InputOutput.columns().len(), 4);
        assert_eq!(TableKind::Jobs.columns().len(), 7);
        for table in TableKind::ALL {
            assert_eq!(table.columns()[0], "ts");
            assert_eq!(table.columns().iter().filter(|c| **c == "key").count(), 1);
        }
    }

    #[test]
    fn key_is_nanoseconds_of_truncated_ts() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let truncated = truncate_to_micros(ts);
        assert_eq!(truncated.timestamp_subsec_nanos(), 123_456_000);
        assert_eq!(key_for(truncated), 1_700_000_000_123_456_000);
    }
}
