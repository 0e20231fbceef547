use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_int_counter, CounterVec, IntCounter};

lazy_static! {
    pub static ref SIGNUPS_CREATED_COUNTER: CounterVec = register_counter_vec!(
        "api_signups_created_total",
        "Applications submitted per tenant",
        &["tenant"]
    )
    .unwrap();

    pub static ref SIGNUP_TRANSITIONS_COUNTER: CounterVec = register_counter_vec!(
        "api_signup_transitions_total",
        "Signup status changes per tenant and target status",
        &["tenant", "status"]
    )
    .unwrap();

    pub static ref CAPACITY_REJECTIONS_COUNTER: IntCounter = register_int_counter!(
        "api_capacity_rejections_total",
        "Approvals refused because the opportunity had no spots left"
    )
    .unwrap();
}

pub fn record_signup_created(tenant: &str) {
    SIGNUPS_CREATED_COUNTER.with_label_values(&[tenant]).inc();
}

pub fn record_transition(tenant: &str, status: &str) {
    SIGNUP_TRANSITIONS_COUNTER.with_label_values(&[tenant, status]).inc();
}

pub fn record_capacity_rejection() {
    CAPACITY_REJECTIONS_COUNTER.inc();
}

/// Forces registration of every counter with the default registry.
pub fn register() {
    lazy_static::initialize(&SIGNUPS_CREATED_COUNTER);
    lazy_static::initialize(&SIGNUP_TRANSITIONS_COUNTER);
    lazy_static::initialize(&CAPACITY_REJECTIONS_COUNTER);
}
