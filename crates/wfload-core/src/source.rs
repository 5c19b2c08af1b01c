//! Fuente perezosa de registros de un bucket.
//!
//! Protocolo pull de tres operaciones (`has_next`, `next_values`, `error`)
//! más `Iterator`. El cursor arranca en `start` y se detiene al alcanzar
//! `end`; cada fila producida incrementa el contador de progreso en el
//! momento de producirse, antes de saber si la inserción prospera.
//! Se consume una sola vez y no se reinicia.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::bucket::BucketSpec;
use crate::errors::CoreError;
use crate::generator::RowGenerator;
use crate::progress::ProgressCounter;

pub struct RecordSource<G: RowGenerator> {
    bucket: BucketSpec,
    cursor: DateTime<Utc>,
    delta: Duration,
    generator: Arc<G>,
    counter: ProgressCounter,
}

impl<G: RowGenerator> RecordSource<G> {
    pub fn new(bucket: BucketSpec, delta: Duration, generator: Arc<G>, counter: ProgressCounter) -> Self {
        Self { cursor: bucket.start,
               bucket,
               delta,
               generator,
               counter }
    }

    pub fn bucket(&self) -> &BucketSpec {
        &self.bucket
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.bucket.end
    }

    /// Registro en la posición actual; avanza el cursor un delta.
    pub fn next_values(&mut self) -> Option<G::Record> {
        if !self.has_next() {
            return None;
        }
        let record = self.generator.generate(self.cursor);
        self.cursor = self.cursor + self.delta;
        self.counter.increment();
        Some(record)
    }

    /// La generación no falla; existe para completar el protocolo.
    pub fn error(&self) -> Option<&CoreError> {
        None
    }

    fn remaining(&self) -> usize {
        if !self.has_next() {
            return 0;
        }
        let left = (self.bucket.end - self.cursor).num_microseconds().unwrap_or(i64::MAX);
        let step = self.delta.num_microseconds().unwrap_or(1).max(1);
        usize::try_from((left + step - 1) / step).unwrap_or(usize::MAX)
    }
}

impl<G: RowGenerator> Iterator for RecordSource<G> {
    type Item = G::Record;

    fn next(&mut self) -> Option<G::Record> {
        self.next_values()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<G: RowGenerator> std::fmt::Debug for RecordSource<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSource")
         .field("table", &<G::Record as crate::record::Record>::TABLE)
         .field("bucket", &self.bucket)
         .field("cursor", &self.cursor)
         .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::{BucketPlan, GenerationCursor};
    use crate::generator::InputOutputGenerator;
    use crate::record::{key_for, Record};
    use chrono::TimeZone;
    use std::time::Duration as StdDuration;

    fn io_gen() -> Arc<InputOutputGenerator> {
        Arc::new(InputOutputGenerator::new(Arc::from("in"), Arc::from("out")))
    }

    #[test]
    fn yields_bucket_rows_in_increasing_order_and_counts_them() {
        let anchor = Utc.with_ymd_and_hms(2024, 5, 5, 5, 5, 5).unwrap();
        let plan = BucketPlan::new(4, StdDuration::from_millis(5), 4).unwrap();
        let bucket = GenerationCursor::new(anchor, plan).next_bucket().unwrap();
        let counter = ProgressCounter::new();
        let mut source = RecordSource::new(bucket, plan.delta(), io_gen(), counter.clone());

        assert_eq!(source.size_hint(), (4, Some(4)));
        assert!(source.error().is_none());
        let mut ts = Vec::new();
        while source.has_next() {
            let rec = source.next_values().unwrap();
            assert_eq!(rec.key(), key_for(rec.ts));
            ts.push(rec.ts);
        }
        assert_eq!(ts.len(), 4);
        assert_eq!(ts[0], bucket.start);
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
        assert!(*ts.last().unwrap() < bucket.end);
        assert_eq!(counter.get(), 4);
        assert!(source.next_values().is_none());
        assert_eq!(counter.get(), 4);
    }

    #[test]
    fn nothing_is_counted_until_consumed() {
        let anchor = Utc.with_ymd_and_hms(2024, 5, 5, 5, 5, 5).unwrap();
        let plan = BucketPlan::new(10, StdDuration::from_millis(1), 10).unwrap();
        let bucket = GenerationCursor::new(anchor, plan).next_bucket().unwrap();
        let counter = ProgressCounter::new();
        let source = RecordSource::new(bucket, plan.delta(), io_gen(), counter.clone());
        assert_eq!(counter.get(), 0);
        assert_eq!(source.count(), 10);
        assert_eq!(counter.get(), 10);
    }
}
