use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static USERS_REGISTERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "eventra_users_registered_total",
        "Total user accounts registered"
    )
    .expect("register users_registered_total")
});

pub static LOGINS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "eventra_logins_total",
        "Login attempts by outcome",
        &["outcome"]
    )
    .expect("register logins_total")
});

pub static EVENTS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "eventra_events_created_total",
        "Total events created"
    )
    .expect("register events_created_total")
});

pub static EVENT_VIEWS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "eventra_event_views_total",
        "Total event detail views"
    )
    .expect("register event_views_total")
});

pub static ORDERS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "eventra_orders_created_total",
        "Total service orders placed"
    )
    .expect("register orders_created_total")
});

pub static REVIEWS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "eventra_reviews_created_total",
        "Total reviews written"
    )
    .expect("register reviews_created_total")
});

pub static REPORTS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "eventra_reports_created_total",
        "Total event reports filed"
    )
    .expect("register reports_created_total")
});

pub fn record_login(outcome: &str) {
    LOGINS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_output() {
        ORDERS_CREATED_TOTAL.inc();
        record_login("success");
        let (status, body) = encode_metrics();
        assert_eq!(status, axum::http::StatusCode::OK);
        assert!(body.contains("eventra_orders_created_total"));
        assert!(body.contains("eventra_logins_total{outcome=\"success\"}"));
    }
}
