//! Planificación de buckets de tiempo hacia atrás.
//!
//! A partir de un instante ancla (el registro más antiguo de la tabla, o
//! "ahora" si está vacía) se emiten ventanas contiguas `[start, end)` de
//! `batch_size × delta_record`, cada una inmediatamente anterior a la previa.
//! El último bucket se estrecha para no programar más de `generate_count`
//! filas.

use chrono::{DateTime, Duration, Utc};

use crate::errors::CoreError;
use crate::record::{truncate_to_micros, TableKind};
use crate::sink::TableStats;

/// Filas que faltan para llegar al objetivo (puede ser <= 0).
pub fn generate_count(target_total: i64, current_rows: i64) -> i64 {
    target_total.saturating_sub(current_rows)
}

/// Instante desde el que una tabla genera hacia atrás.
///
/// - Con filas propias: su fila más antigua (continúa la serie existente).
/// - Tabla hija vacía con instancias presentes: un delta después de la
///   instancia más reciente, para que sus filas caigan sobre instancias ya
///   sembradas.
/// - En otro caso: `now` (el mismo para todas las tablas de la corrida).
pub fn resolve_anchor(table: TableKind,
                      own: &TableStats,
                      instances: &TableStats,
                      delta: Duration,
                      now: DateTime<Utc>)
                      -> DateTime<Utc> {
    if let Some(oldest) = own.oldest {
        return oldest;
    }
    match (table, instances.newest) {
        (TableKind::Instances, _) | (_, None) => now,
        (_, Some(newest)) => newest.checked_add_signed(delta).unwrap_or(newest),
    }
}

/// Parámetros validados de una secuencia de buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPlan {
    batch_size: i64,
    delta_us: i64,
    generate_count: i64,
}

impl BucketPlan {
    /// Valida tamaño de lote y separación entre filas.
    ///
    /// `delta_record` debe ser un número entero de microsegundos: las filas se
    /// persisten con precisión de microsegundos y la clave se deriva de `ts`.
    pub fn new(batch_size: i64, delta_record: std::time::Duration, generate_count: i64) -> Result<Self, CoreError> {
        if batch_size <= 0 {
            return Err(CoreError::InvalidPlan(format!("batch_size must be positive (got {batch_size})")));
        }
        if delta_record.is_zero() {
            return Err(CoreError::InvalidPlan("delta_record must be positive".into()));
        }
        if delta_record.subsec_nanos() % 1_000 != 0 {
            return Err(CoreError::InvalidPlan(format!("delta_record must be a whole number of microseconds (got {delta_record:?})")));
        }
        let delta_us = i64::try_from(delta_record.as_micros()).map_err(|_| CoreError::InvalidPlan("delta_record too large".into()))?;
        delta_us.checked_mul(batch_size)
                .ok_or_else(|| CoreError::InvalidPlan("batch_size × delta_record overflows".into()))?;
        Ok(Self { batch_size,
                  delta_us,
                  generate_count })
    }

    pub fn batch_size(&self) -> i64 {
        self.batch_size
    }

    pub fn generate_count(&self) -> i64 {
        self.generate_count
    }

    pub fn delta(&self) -> Duration {
        Duration::microseconds(self.delta_us)
    }

    /// Ancho de un bucket completo.
    pub fn bucket_interval(&self) -> Duration {
        Duration::microseconds(self.delta_us * self.batch_size)
    }

    /// Cantidad de buckets que emitirá el cursor si nada lo interrumpe.
    pub fn expected_buckets(&self) -> i64 {
        if self.generate_count <= 0 {
            0
        } else {
            (self.generate_count + self.batch_size - 1) / self.batch_size
        }
    }
}

/// Ventana de tiempo `[start, end)` con `rows` filas separadas por delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSpec {
    /// Posición del bucket en la secuencia (0 = el más reciente).
    pub index: u64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub rows: i64,
}

/// Estado mutable de un secuenciador. Pertenece a una sola tarea.
#[derive(Debug, Clone)]
pub struct GenerationCursor {
    current_end_time: DateTime<Utc>,
    bucket_interval: Duration,
    rows_emitted: i64,
    issued: u64,
    plan: BucketPlan,
}

impl GenerationCursor {
    pub fn new(anchor: DateTime<Utc>, plan: BucketPlan) -> Self {
        Self { current_end_time: truncate_to_micros(anchor),
               bucket_interval: plan.bucket_interval(),
               rows_emitted: 0,
               issued: 0,
               plan }
    }

    pub fn plan(&self) -> &BucketPlan {
        &self.plan
    }

    pub fn current_end_time(&self) -> DateTime<Utc> {
        self.current_end_time
    }

    pub fn bucket_interval(&self) -> Duration {
        self.bucket_interval
    }

    /// Filas ya programadas en buckets emitidos.
    pub fn rows_emitted(&self) -> i64 {
        self.rows_emitted
    }

    pub fn buckets_issued(&self) -> u64 {
        self.issued
    }

    pub fn remaining(&self) -> i64 {
        (self.plan.generate_count - self.rows_emitted).max(0)
    }

    /// Siguiente bucket hacia atrás, o `None` si ya se programó todo (o si la
    /// ventana se saldría del rango representable de fechas).
    pub fn next_bucket(&mut self) -> Option<BucketSpec> {
        let rows = self.remaining().min(self.plan.batch_size);
        if rows <= 0 {
            return None;
        }
        let width = if rows == self.plan.batch_size {
            self.bucket_interval
        } else {
            Duration::microseconds(self.plan.delta_us * rows)
        };
        let start = self.current_end_time.checked_sub_signed(width)?;
        let bucket = BucketSpec { index: self.issued,
                                  start,
                                  end: self.current_end_time,
                                  rows };
        self.current_end_time = start;
        self.rows_emitted += rows;
        self.issued += 1;
        Some(bucket)
    }
}

impl Iterator for GenerationCursor {
    type Item = BucketSpec;

    fn next(&mut self) -> Option<BucketSpec> {
        self.next_bucket()
    }
}
