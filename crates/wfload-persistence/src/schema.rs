//! Esquema Diesel de las tablas destino (provistas externamente).
//! `workflows_jobs` no tiene PK propia; se declara `(ts, key)` sólo para Diesel.

diesel::table! {
    workflow_instances (ts, key) {
        ts -> Timestamptz,
        startts -> Timestamptz,
        endts -> Nullable<Timestamptz>,
        key -> BigInt,
        workflowkey -> BigInt,
        alternateid1 -> Nullable<Text>,
        alternateid2 -> Nullable<Text>,
        action -> Nullable<SmallInt>,
        callbackurl -> Nullable<Text>,
        operationstatus -> Nullable<SmallInt>,
        completionstatus -> Nullable<SmallInt>,
        callbackperformed -> Nullable<Bool>,
        category -> Nullable<Text>,
        msisdn -> Nullable<Text>,
        imsi -> Nullable<Text>,
        errorcode -> Nullable<Text>,
    }
}

diesel::table! {
    workflows_input_output (ts, key) {
        ts -> Timestamptz,
        key -> BigInt,
        input -> Text,
        output -> Text,
    }
}

diesel::table! {
    workflows_jobs (ts, key) {
        ts -> Timestamptz,
        key -> BigInt,
        workflow_key -> BigInt,
        output -> Text,
        status -> SmallInt,
        startts -> Nullable<Timestamptz>,
        endts -> Nullable<Timestamptz>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    workflow_instances,
    workflows_input_output,
    workflows_jobs,
);
