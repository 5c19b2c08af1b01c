//! Productores de filas sintéticas.
//!
//! Un generador es función del instante del cursor y de sus parámetros
//! estáticos; el avance del cursor lo hace `RecordSource`. Los generadores se
//! comparten (vía `Arc`) entre todos los workers de una tabla.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::*;
use crate::error_code::ErrorCodeSampler;
use crate::errors::CoreError;
use crate::record::{key_for, InputOutputRecord, InstanceRecord, JobRecord, Record};

/// Produce exactamente un registro para el instante `ts`. No falla.
pub trait RowGenerator: Send + Sync + 'static {
    type Record: Record + Send + 'static;

    fn generate(&self, ts: DateTime<Utc>) -> Self::Record;
}

/// Filas de `workflow_instances`.
#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    workflow_id: i64,
    error_codes: Arc<ErrorCodeSampler>,
}

impl InstanceGenerator {
    pub fn new(workflow_id: i64, error_codes: Arc<ErrorCodeSampler>) -> Self {
        Self { workflow_id, error_codes }
    }
}

impl RowGenerator for InstanceGenerator {
    type Record = InstanceRecord;

    fn generate(&self, ts: DateTime<Utc>) -> InstanceRecord {
        let alternate = rand::thread_rng().gen_range(ALTERNATE_ID_MIN..=ALTERNATE_ID_MAX);
        InstanceRecord { ts,
                         start_ts: ts,
                         end_ts: Some(ts + Duration::seconds(RUN_DURATION_SECS)),
                         key: key_for(ts),
                         workflow_key: self.workflow_id,
                         alternate_id1: Uuid::new_v4().to_string(),
                         alternate_id2: alternate.to_string(),
                         action: INSTANCE_ACTION,
                         callback_url: INSTANCE_CALLBACK_URL,
                         operation_status: INSTANCE_OPERATION_STATUS,
                         completion_status: INSTANCE_COMPLETION_STATUS,
                         callback_performed: true,
                         category: INSTANCE_CATEGORY,
                         msisdn: INSTANCE_MSISDN,
                         imsi: INSTANCE_IMSI,
                         error_code: self.error_codes.next_code() }
    }
}

/// Filas de `workflows_jobs`; los payloads se reparten en round-robin.
#[derive(Debug)]
pub struct JobGenerator {
    workflow_id: i64,
    outputs: Vec<Arc<str>>,
    next: AtomicUsize,
}

impl JobGenerator {
    pub fn new(workflow_id: i64, outputs: Vec<Arc<str>>) -> Result<Self, CoreError> {
        if outputs.is_empty() {
            return Err(CoreError::EmptyJobPayloads);
        }
        Ok(Self { workflow_id,
                  outputs,
                  next: AtomicUsize::new(0) })
    }
}

impl RowGenerator for JobGenerator {
    type Record = JobRecord;

    fn generate(&self, ts: DateTime<Utc>) -> JobRecord {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.outputs.len();
        JobRecord { ts,
                    key: key_for(ts),
                    workflow_key: self.workflow_id,
                    output: Arc::clone(&self.outputs[idx]),
                    status: JOB_STATUS,
                    start_ts: Some(ts),
                    end_ts: Some(ts + Duration::seconds(RUN_DURATION_SECS)) }
    }
}

/// Filas de `workflows_input_output` con los payloads de fixtures.
#[derive(Debug, Clone)]
pub struct InputOutputGenerator {
    input: Arc<str>,
    output: Arc<str>,
}

impl InputOutputGenerator {
    pub fn new(input: Arc<str>, output: Arc<str>) -> Self {
        Self { input, output }
    }
}

impl RowGenerator for InputOutputGenerator {
    type Record = InputOutputRecord;

    fn generate(&self, ts: DateTime<Utc>) -> InputOutputRecord {
        InputOutputRecord { ts,
                            key: key_for(ts),
                            input: Arc::clone(&self.input),
                            output: Arc::clone(&self.output) }
    }
}
