//! Business metrics.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `volunteer_registrations_total{outcome}` - register/unregister requests by outcome
//! - `volunteer_events_created_total` - events created
//! - `volunteer_store_registration_rejections_total{reason}` - inserts refused by
//!   the store's own capacity and uniqueness checks (recorded by `volunteer-postgres`)

use metrics::describe_counter;
use volunteer_core::RegistrationOutcome;

/// Register metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "volunteer_registrations_total",
        "Register and unregister requests by outcome"
    );
    describe_counter!(
        "volunteer_events_created_total",
        "Total number of events created"
    );
    describe_counter!(
        "volunteer_store_registration_rejections_total",
        "Registration inserts rejected inside the storage transaction"
    );

    tracing::info!("Business metrics registered");
}

/// Count a register or unregister request.
pub fn record_registration(outcome: RegistrationOutcome) {
    metrics::counter!("volunteer_registrations_total", "outcome" => outcome.as_str())
        .increment(1);
}

/// Count a created event.
pub fn record_event_created() {
    metrics::counter!("volunteer_events_created_total").increment(1);
}
