//! Contador de progreso y cálculo de throughput.
//!
//! El contador se inyecta explícitamente en secuenciadores, fuentes y
//! reporter; no existe estado global, por lo que varias corridas pueden
//! convivir en el mismo proceso (tests) sin contaminarse.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Filas producidas (no insertadas): los duplicados también cuentan.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter {
    inner: Arc<AtomicI64>,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.inner.fetch_add(1, Ordering::Relaxed);
    }

    /// Lectura sin coordinación; suficiente para gating y reportes.
    pub fn get(&self) -> i64 {
        self.inner.load(Ordering::Relaxed)
    }
}

/// Una línea de reporte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSample {
    pub elapsed: Duration,
    pub total: i64,
    pub period_rate: f64,
    pub overall_rate: f64,
}

impl fmt::Display for ThroughputSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,
               "at {}s, row rate {:.2}/sec (period), row rate {:.2}/sec (overall), {} total rows",
               self.elapsed.as_secs(),
               self.period_rate,
               self.overall_rate,
               self.total)
    }
}

/// Mantiene la muestra anterior para calcular la tasa del periodo.
#[derive(Debug, Clone)]
pub struct ThroughputTracker {
    started: Instant,
    last_at: Instant,
    last_total: i64,
}

impl ThroughputTracker {
    pub fn new(now: Instant) -> Self {
        Self { started: now,
               last_at: now,
               last_total: 0 }
    }

    pub fn sample(&mut self, now: Instant, total: i64) -> ThroughputSample {
        let period = now.saturating_duration_since(self.last_at);
        let elapsed = now.saturating_duration_since(self.started);
        let sample = ThroughputSample { elapsed,
                                        total,
                                        period_rate: rate(total - self.last_total, period),
                                        overall_rate: rate(total, elapsed) };
        self.last_at = now;
        self.last_total = total;
        sample
    }
}

fn rate(rows: i64, over: Duration) -> f64 {
    let secs = over.as_secs_f64();
    if secs <= 0.0 {
        0.0
    } else {
        rows as f64 / secs
    }
}
