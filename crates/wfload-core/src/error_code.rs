//! Distribución de códigos de error de instancias.
//!
//! Modela el sesgo real de las tasas de error: las primeras llamadas devuelven
//! siempre el código más común y cada tramo posterior devuelve un código más
//! raro. Pasadas 100 000 llamadas, el código se sortea uniformemente entre los
//! códigos extendidos.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

pub const ERROR_CODES: [&str; 35] = ["ATR000", "ATR100", "ATR101", "ATR102", "ATR103", "ATR104", "ATR105", "ATR902",
                                     "ATR200", "ATR201", "ATR903", "ATR300", "ATR301", "ATR904", "ATR400", "ATR401",
                                     "ATR905", "ATR906", "ATR410", "ATR411", "ATR910", "ATR420", "ATR421", "ATR920",
                                     "ATR430", "ATR431", "ATR930", "ATR440", "ATR441", "ATR940", "ATR450", "ATR451",
                                     "ATR950", "ATR907", "ATR908"];

/// Cantidad de códigos asignados por tramos; el resto es el conjunto extendido.
pub const TIERED_CODES: usize = 7;

/// Límite superior (inclusive, 1-based) de cada tramo.
const TIER_LIMITS: [u64; TIERED_CODES] = [100, 1_000, 5_000, 10_000, 20_000, 50_000, 100_000];

/// Índice del código para la llamada `call` (1-based), o `None` si la llamada
/// cae fuera de los tramos y corresponde un sorteo.
pub fn tier_for(call: u64) -> Option<usize> {
    TIER_LIMITS.iter().position(|limit| call <= *limit)
}

/// Códigos que pueden salir del sorteo.
pub fn extended_codes() -> &'static [&'static str] {
    &ERROR_CODES[TIERED_CODES..]
}

/// Muestreador compartido entre todos los workers de instancias.
///
/// El contador de llamadas es global al muestreador (no por bucket), así que
/// el orden en que los workers consumen fuentes decide qué filas reciben los
/// códigos de los primeros tramos.
#[derive(Debug)]
pub struct ErrorCodeSampler {
    calls: AtomicU64,
    rng: Mutex<StdRng>,
}

impl ErrorCodeSampler {
    pub fn new() -> Self {
        Self { calls: AtomicU64::new(0),
               rng: Mutex::new(StdRng::from_entropy()) }
    }

    /// Semilla fija para que el tramo aleatorio sea reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self { calls: AtomicU64::new(0),
               rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    /// Llamadas atendidas hasta ahora.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn next_code(&self) -> &'static str {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        match tier_for(call) {
            Some(idx) => ERROR_CODES[idx],
            None => {
                let extended = extended_codes();
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                extended[rng.gen_range(0..extended.len())]
            }
        }
    }
}

impl Default for ErrorCodeSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(tier_for(1), Some(0));
        assert_eq!(tier_for(100), Some(0));
        assert_eq!(tier_for(101), Some(1));
        assert_eq!(tier_for(1_000), Some(1));
        assert_eq!(tier_for(1_001), Some(2));
        assert_eq!(tier_for(5_000), Some(2));
        assert_eq!(tier_for(10_000), Some(3));
        assert_eq!(tier_for(20_000), Some(4));
        assert_eq!(tier_for(50_001), Some(6));
        assert_eq!(tier_for(100_000), Some(6));
        assert_eq!(tier_for(100_001), None);
    }

    #[test]
    fn extended_set_has_28_codes() {
        assert_eq!(extended_codes().len(), 28);
        assert_eq!(extended_codes()[0], "ATR902");
        assert_eq!(*extended_codes().last().unwrap(), "ATR908");
    }

    #[test]
    fn sequence_follows_tiers_then_draws_from_extended_set() {
        let sampler = ErrorCodeSampler::with_seed(7);
        let mut seen = Vec::with_capacity(100_500);
        for _ in 0..100_500 {
            seen.push(sampler.next_code());
        }
        assert_eq!(sampler.calls(), 100_500);
        assert!(seen[..100].iter().all(|c| *c == "ATR000"));
        assert!(seen[100..1_000].iter().all(|c| *c == "ATR100"));
        assert!(seen[1_000..5_000].iter().all(|c| *c == "ATR101"));
        assert!(seen[5_000..10_000].iter().all(|c| *c == "ATR102"));
        assert!(seen[10_000..20_000].iter().all(|c| *c == "ATR103"));
        assert!(seen[20_000..50_000].iter().all(|c| *c == "ATR104"));
        assert!(seen[50_000..100_000].iter().all(|c| *c == "ATR105"));
        assert!(seen[100_000..].iter().all(|c| extended_codes().contains(c)));
    }

    #[test]
    fn same_seed_same_tail() {
        let a = ErrorCodeSampler::with_seed(42);
        let b = ErrorCodeSampler::with_seed(42);
        let tail = |s: &ErrorCodeSampler| -> Vec<&'static str> { (0..100_050).map(|_| s.next_code()).skip(100_000).collect() };
        assert_eq!(tail(&a), tail(&b));
    }
}
