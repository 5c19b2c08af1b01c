use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use wfload_core::{BucketPlan, ErrorCodeSampler, GenerationCursor, InstanceGenerator, ProgressCounter, RecordSource};

// Buckets contiguos: el inicio del bucket i es el fin del bucket i+1.
#[test]
fn buckets_are_contiguous_and_strictly_decreasing() {
    let anchor = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
    let plan = BucketPlan::new(37, Duration::from_micros(1_250), 1_000).unwrap();
    let buckets: Vec<_> = GenerationCursor::new(anchor, plan).collect();
    assert_eq!(buckets.len() as i64, plan.expected_buckets());
    assert_eq!(buckets.iter().map(|b| b.rows).sum::<i64>(), 1_000);
    for pair in buckets.windows(2) {
        assert_eq!(pair[0].start, pair[1].end, "gap between bucket {} and {}", pair[0].index, pair[1].index);
        assert!(pair[0].end > pair[1].end);
    }
    for (i, b) in buckets.iter().enumerate() {
        assert_eq!(b.index, i as u64);
        assert!(b.start < b.end);
    }
}

// Todas las instancias de una corrida tienen (ts, key) distinto y el contador
// coincide con las filas producidas.
#[test]
fn instance_keys_are_unique_across_a_run() {
    let anchor = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
    let plan = BucketPlan::new(100, Duration::from_millis(5), 1_000).unwrap();
    let generator = Arc::new(InstanceGenerator::new(9, Arc::new(ErrorCodeSampler::with_seed(3))));
    let counter = ProgressCounter::new();

    let mut seen = HashSet::new();
    let mut buckets = 0;
    for bucket in GenerationCursor::new(anchor, plan) {
        buckets += 1;
        for record in RecordSource::new(bucket, plan.delta(), Arc::clone(&generator), counter.clone()) {
            assert!(record.ts < anchor);
            assert!(seen.insert((record.ts, record.key)), "duplicate key {}", record.key);
        }
    }
    assert_eq!(buckets, 10);
    assert_eq!(seen.len(), 1_000);
    assert_eq!(counter.get(), 1_000);
}

// Dos cursores desde el mismo ancla producen exactamente las mismas ventanas.
#[test]
fn planning_is_deterministic() {
    let anchor = Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap();
    let plan = BucketPlan::new(250, Duration::from_millis(2), 900).unwrap();
    let a: Vec<_> = GenerationCursor::new(anchor, plan).collect();
    let b: Vec<_> = GenerationCursor::new(anchor, plan).collect();
    assert_eq!(a, b);
    assert_eq!(a.last().unwrap().rows, 150);
}
