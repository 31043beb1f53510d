use lazy_static::lazy_static;
use prometheus::{
    Counter, Histogram, IntCounterVec, register_counter, register_histogram,
    register_int_counter_vec,
};

lazy_static! {
    pub static ref INTERACTIONS_TOTAL: Counter =
        register_counter!("story_interactions_total", "Total number of interactions received").unwrap();
    pub static ref ADMISSIONS: IntCounterVec = register_int_counter_vec!(
        "story_admissions_total",
        "Admission decisions by outcome",
        &["outcome"]
    )
    .unwrap();
    pub static ref STORE_CONFLICTS: Counter =
        register_counter!("story_store_conflicts_total", "Quota record writes lost to a concurrent writer").unwrap();
    pub static ref GENERATION_FAILURES: Counter =
        register_counter!("story_generation_failures_total", "Generation backend failures").unwrap();
    pub static ref GENERATION_LATENCY: Histogram = register_histogram!(
        "story_generation_latency_seconds",
        "Generation backend latency in seconds"
    )
    .unwrap();
}
