//! Reporte periódico de throughput.
//!
//! Sólo lee los contadores (cargas atómicas); nunca frena el pipeline.

use log::info;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use wfload_core::{ProgressCounter, ThroughputSample, ThroughputTracker};

use crate::shutdown::Shutdown;

/// Suma de los contadores de todas las tablas.
pub fn total(counters: &[ProgressCounter]) -> i64 {
    counters.iter().map(ProgressCounter::get).sum()
}

/// Lanza el reporter; termina (con una última línea) cuando se cancela `stop`.
pub fn spawn_reporter(counters: Vec<ProgressCounter>, every: Duration, stop: Shutdown) -> JoinHandle<ThroughputSample> {
    tokio::spawn(async move {
        let started = Instant::now();
        let mut tracker = ThroughputTracker::new(started.into_std());
        let mut ticker = interval_at(started + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                now = ticker.tick() => {
                    let sample = tracker.sample(now.into_std(), total(&counters));
                    info!("{sample}");
                }
            }
        }
        let last = tracker.sample(Instant::now().into_std(), total(&counters));
        info!("{last}");
        last
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn reports_until_stopped() {
        let a = ProgressCounter::new();
        let b = ProgressCounter::new();
        let stop = Shutdown::new();
        let handle = spawn_reporter(vec![a.clone(), b.clone()], Duration::from_secs(10), stop.clone());

        (0..300).for_each(|_| a.increment());
        tokio::time::sleep(Duration::from_secs(25)).await;
        (0..200).for_each(|_| b.increment());
        stop.cancel();
        let last = handle.await.unwrap();
        assert_eq!(last.total, 500);
        // La última muestra usa el mismo reloj que el ticker.
        assert_eq!(last.elapsed, Duration::from_secs(25));
        assert!((last.overall_rate - 20.0).abs() < 1e-9, "{last}");
        assert!((last.period_rate - 40.0).abs() < 1e-9, "{last}");
        assert_eq!(total(&[a, b]), 500);
    }
}
