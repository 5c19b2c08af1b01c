//! Valores fijos de las filas sintéticas.
//!
//! Los campos de instancia que no varían entre filas se emiten tal cual; sólo
//! `ts`, `key`, los identificadores alternativos y `errorcode` cambian.

/// Duración simulada de una instancia o job (`endts = ts + 10s`).
pub const RUN_DURATION_SECS: i64 = 10;

pub const INSTANCE_ACTION: i16 = 0;
pub const INSTANCE_CALLBACK_URL: &str = "";
pub const INSTANCE_OPERATION_STATUS: i16 = 1;
pub const INSTANCE_COMPLETION_STATUS: i16 = 1;
pub const INSTANCE_CATEGORY: &str = "80";
pub const INSTANCE_MSISDN: &str = "01_generated";
pub const INSTANCE_IMSI: &str = "401015699499878";

/// Rango (inclusive) del segundo identificador alternativo.
pub const ALTERNATE_ID_MIN: u32 = 100_001;
pub const ALTERNATE_ID_MAX: u32 = 1_000_000;

/// Estado con el que se insertan todos los jobs.
pub const JOB_STATUS: i16 = 10;
