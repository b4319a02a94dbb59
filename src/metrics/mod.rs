//! Prometheus metrics for the tarmac scheduler and its HTTP service
//!
//! This module provides metrics tracking for:
//! - Scheduler: assignments, rejections, departures, rearranges, queue depth, lock timeouts
//! - Notifications: observer deliveries and failures
//! - Service: API requests and their latency
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter,
    CounterVec, Encoder, Gauge, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all scheduler metrics
struct SchedulerMetrics {
    flights_assigned: CounterVec,
    assignment_rejections: CounterVec,
    departures: CounterVec,
    rearrange_assigned: Counter,
    rearrange_failures: Counter,
    queued_flights: Gauge,
    lock_timeouts: CounterVec,
    operation_duration: HistogramVec,
    deliveries: CounterVec,
    delivery_failures: CounterVec,
}

/// Container for HTTP service metrics
struct ServiceMetrics {
    api_requests: CounterVec,
    api_duration: HistogramVec,
}

/// Global storage for scheduler metrics
static SCHEDULER_METRICS: OnceLock<SchedulerMetrics> = OnceLock::new();

/// Global storage for service metrics
static SERVICE_METRICS: OnceLock<ServiceMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, subsequent metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = tarmac::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    // Prevent double initialization
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let scheduler = SchedulerMetrics {
        flights_assigned: register_counter_vec!(
            "tarmac_flights_assigned_total",
            "Flights placed on a runway queue",
            &["runway"]
        )?,
        assignment_rejections: register_counter_vec!(
            "tarmac_assignment_rejections_total",
            "Runway requests no runway could serve",
            &["category"]
        )?,
        departures: register_counter_vec!(
            "tarmac_departures_total",
            "Flights departed per runway",
            &["runway"]
        )?,
        rearrange_assigned: register_counter!(
            "tarmac_rearrange_assigned_total",
            "Flights placed again by rearranges"
        )?,
        rearrange_failures: register_counter!(
            "tarmac_rearrange_failures_total",
            "Flights dropped by rearranges for lack of a runway"
        )?,
        queued_flights: register_gauge!(
            "tarmac_queued_flights",
            "Flights currently waiting across all runways"
        )?,
        lock_timeouts: register_counter_vec!(
            "tarmac_lock_timeouts_total",
            "Lock acquisitions that exhausted their retries",
            &["lock"]
        )?,
        operation_duration: register_histogram_vec!(
            "tarmac_operation_duration_seconds",
            "Duration of bulk scheduler operations in seconds",
            &["operation"],
            vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
        )?,
        deliveries: register_counter_vec!(
            "tarmac_notification_deliveries_total",
            "Observer events delivered",
            &["event"]
        )?,
        delivery_failures: register_counter_vec!(
            "tarmac_notification_failures_total",
            "Observer events that failed or timed out",
            &["event"]
        )?,
    };

    let service = ServiceMetrics {
        api_requests: register_counter_vec!(
            "tarmac_api_requests_total",
            "Total API requests by endpoint and status",
            &["endpoint", "status"]
        )?,
        api_duration: register_histogram_vec!(
            "tarmac_api_request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
    };

    SCHEDULER_METRICS
        .set(scheduler)
        .map_err(|_| "Scheduler metrics already initialized")?;
    SERVICE_METRICS
        .set(service)
        .map_err(|_| "Service metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    SCHEDULER_METRICS.get().is_some() && SERVICE_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a flight joining a runway queue
pub fn record_assignment(runway: &str) {
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.flights_assigned.with_label_values(&[runway]).inc();
    }
}

/// Record a runway request nothing could serve
pub fn record_rejection(category: &str) {
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.assignment_rejections.with_label_values(&[category]).inc();
    }
}

/// Record a departure
pub fn record_departure(runway: &str) {
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.departures.with_label_values(&[runway]).inc();
    }
}

/// Record the outcome of a rearrange
pub fn record_rearrange(assigned: usize, failed: usize) {
    let Some(m) = SCHEDULER_METRICS.get() else {
        return;
    };

    if assigned > 0 {
        m.rearrange_assigned.inc_by(assigned as f64);
    }
    if failed > 0 {
        m.rearrange_failures.inc_by(failed as f64);
    }
}

/// Update the queued flights gauge
pub fn set_queued(queued: usize) {
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.queued_flights.set(queued as f64);
    }
}

/// Record a lock that could not be acquired
pub fn record_lock_timeout(lock: &str) {
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.lock_timeouts.with_label_values(&[lock]).inc();
    }
}

/// Record one observer delivery
pub fn record_delivery(event: &str, success: bool) {
    let Some(m) = SCHEDULER_METRICS.get() else {
        return;
    };

    if success {
        m.deliveries.with_label_values(&[event]).inc();
    } else {
        m.delivery_failures.with_label_values(&[event]).inc();
    }
}

/// Record API request
pub fn record_api_request(endpoint: &str, status: u16, duration_secs: f64) {
    let Some(m) = SERVICE_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.api_requests
        .with_label_values(&[endpoint, &status_str])
        .inc();
    m.api_duration
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start timing a scheduler operation (`tick`, `rearrange`)
pub fn start_operation_timer(operation: &str) -> MetricsTimer {
    match SCHEDULER_METRICS.get() {
        Some(m) => MetricsTimer::new(
            m.operation_duration
                .with_label_values(&[operation])
                .start_timer(),
        ),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
