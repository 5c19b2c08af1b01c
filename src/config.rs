//! Configuración de una corrida de generación.
//! Los valores llegan desde la CLI (o variables `WFLOAD_*`); la conexión a la
//! base se lee aparte con `wfload_persistence::DbConfig`.
use std::path::PathBuf;
use std::time::Duration;

use wfload_core::TableKind;

use crate::errors::GeneratorError;

pub const DEFAULT_INSTANCE_TOTAL: i64 = 100_000;
pub const DEFAULT_BATCH_SIZE: i64 = 1_000;
pub const DEFAULT_DELTA_RECORD: Duration = Duration::from_millis(5);
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(30);

pub const DEFAULT_INPUT_FIXTURE: &str = "./io-data/wf_input.json";
pub const DEFAULT_OUTPUT_FIXTURE: &str = "./io-data/wf_output.json";
pub const DEFAULT_JOB_FIXTURES: &str = "./io-data/jobs";

/// Rutas de los payloads leídos al arrancar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePaths {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Directorio con `N.json` para los jobs.
    pub job_dir: PathBuf,
}

impl Default for FixturePaths {
    fn default() -> Self {
        Self { input: PathBuf::from(DEFAULT_INPUT_FIXTURE),
               output: PathBuf::from(DEFAULT_OUTPUT_FIXTURE),
               job_dir: PathBuf::from(DEFAULT_JOB_FIXTURES) }
    }
}

/// Parámetros de una corrida.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Filas que debe tener cada tabla al terminar.
    pub instance_total: i64,
    /// Workers de copia por tabla.
    pub workers: usize,
    pub workflow_id: i64,
    /// Filas por bucket.
    pub batch_size: i64,
    /// Separación temporal entre filas consecutivas.
    pub delta_record: Duration,
    /// Buckets en vuelo por tabla antes de que el secuenciador espere.
    pub channel_capacity: usize,
    pub report_interval: Duration,
    pub fixtures: FixturePaths,
    pub tables: Vec<TableKind>,
}

impl GeneratorConfig {
    /// Valores por defecto; `workflow_id` no tiene valor implícito.
    pub fn new(workflow_id: i64) -> Self {
        let workers = default_workers();
        Self { instance_total: DEFAULT_INSTANCE_TOTAL,
               workers,
               workflow_id,
               batch_size: DEFAULT_BATCH_SIZE,
               delta_record: DEFAULT_DELTA_RECORD,
               channel_capacity: workers,
               report_interval: DEFAULT_REPORT_INTERVAL,
               fixtures: FixturePaths::default(),
               tables: TableKind::ALL.to_vec() }
    }

    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.batch_size <= 0 {
            return Err(GeneratorError::Config(format!("batch_size must be positive (got {})", self.batch_size)));
        }
        if self.delta_record.is_zero() {
            return Err(GeneratorError::Config("delta_record must be positive".into()));
        }
        if self.workers == 0 {
            return Err(GeneratorError::Config("workers must be at least 1".into()));
        }
        if self.channel_capacity == 0 {
            return Err(GeneratorError::Config("channel_capacity must be at least 1".into()));
        }
        if self.report_interval.is_zero() {
            return Err(GeneratorError::Config("report_interval must be positive".into()));
        }
        if self.tables.is_empty() {
            return Err(GeneratorError::Config("no table selected".into()));
        }
        Ok(())
    }

    /// Conexiones necesarias: una por worker y tabla más una para consultas.
    pub fn pool_size(&self) -> u32 {
        let needed = self.workers.saturating_mul(self.tables.len()).saturating_add(1);
        u32::try_from(needed).unwrap_or(u32::MAX)
    }
}

/// Mitad del paralelismo disponible, al menos 1.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get() / 2)
                                        .unwrap_or(1)
                                        .max(1)
}

/// Interpreta `5ms`, `250us`, `1s`, `2m`, `1h`, `100ns`.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let s = raw.trim();
    let split = s.find(|c: char| !c.is_ascii_digit())
                 .ok_or_else(|| format!("missing unit in duration {raw:?} (use ns, us, ms, s, m or h)"))?;
    let (digits, unit) = s.split_at(split);
    let value: u64 = digits.parse()
                           .map_err(|_| format!("invalid number in duration {raw:?}"))?;
    let out = match unit {
        "ns" => Duration::from_nanos(value),
        "us" | "µs" => Duration::from_micros(value),
        "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        "h" => Duration::from_secs(value.saturating_mul(3_600)),
        other => return Err(format!("unknown duration unit {other:?} in {raw:?}")),
    };
    Ok(out)
}

/// Lista separada por comas; conserva el orden padres → hijos y elimina repetidas.
pub fn parse_tables(raw: &str) -> Result<Vec<TableKind>, String> {
    let mut picked = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let table: TableKind = part.parse().map_err(|e: wfload_core::CoreError| e.to_string())?;
        if !picked.contains(&table) {
            picked.push(table);
        }
    }
    if picked.is_empty() {
        return Err("at least one table is required".into());
    }
    picked.sort();
    Ok(picked)
}
