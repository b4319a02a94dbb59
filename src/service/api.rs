//! REST API handlers for the airport server
//!
//! This module defines the API routes and handlers. Every handler is a thin
//! translation onto one [`RunwayScheduler`](crate::scheduler::RunwayScheduler)
//! operation; scheduler errors map onto status codes in [`error_response`].

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream;
use serde::{Deserialize, Serialize};

use crate::metrics;
use crate::notifications::EventStreamObserver;
use crate::scheduler::{Category, DepartureFilter, ErrorKind, SchedulerError};

use super::server::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Error response with a stable machine-readable kind
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub kind: ErrorKind,
}

impl ErrorResponse {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            kind,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub runways: usize,
}

/// Body of `POST /api/runways`
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRunwayRequest {
    pub name: String,
    pub category: String,
}

/// Body of `POST /api/flights`
#[derive(Debug, Serialize, Deserialize)]
pub struct FlightRequest {
    pub flight_id: String,
    pub destination: String,
    pub airline: String,
    pub category: String,
}

/// Query of `GET /api/departures`
#[derive(Debug, Default, Deserialize)]
pub struct DeparturesQuery {
    pub runway: Option<String>,
    pub airline: Option<String>,
}

impl DeparturesQuery {
    fn into_filter(self) -> Result<DepartureFilter, SchedulerError> {
        match (self.runway, self.airline) {
            (None, None) => Ok(DepartureFilter::All),
            (Some(runway), None) => Ok(DepartureFilter::Runway(runway)),
            (None, Some(airline)) => Ok(DepartureFilter::Airline(airline)),
            (Some(_), Some(_)) => Err(SchedulerError::invalid_input(
                "query",
                "filter by runway or by airline, not both",
            )),
        }
    }
}

/// Query of `GET /api/flights/{id}/track`
#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub airline: String,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/api/health", get(health_check))
        // Runway endpoints
        .route("/api/runways", get(list_runways).post(create_runway))
        .route("/api/runways/{name}", get(get_runway))
        .route("/api/runways/{name}/open", post(open_runway))
        .route("/api/runways/{name}/close", post(close_runway))
        // Flight endpoints
        .route("/api/flights", post(request_runway))
        .route("/api/flights/{id}/track", get(track_flight))
        // Departure endpoints
        .route("/api/departures", get(query_departures))
        .route("/api/departures/issue", post(issue_departure))
        .route("/api/departures/rearrange", post(rearrange))
        // Metrics
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_requests))
        .with_state(state)
}

/// Record request count and latency per matched route
async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    metrics::record_api_request(
        &endpoint,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Map a scheduler error onto its HTTP status and JSON body
pub fn error_response(error: SchedulerError) -> Response {
    let status = match error.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists | ErrorKind::InvalidState => StatusCode::CONFLICT,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::SERVICE_UNAVAILABLE,
    };

    if error.is_internal() {
        tracing::error!(error = %error, "Request failed with internal fault");
    } else {
        tracing::debug!(error = %error, "Request rejected");
    }

    (status, Json(ErrorResponse::new(error.kind(), error.to_string()))).into_response()
}

fn ok<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponse::success(data))).into_response()
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Response {
    match state.scheduler.runways().await {
        Ok(runways) => ok(
            StatusCode::OK,
            HealthResponse {
                status: "healthy".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                uptime_secs: state.start_time.elapsed().as_secs(),
                runways: runways.len(),
            },
        ),
        Err(e) => error_response(e),
    }
}

/// Prometheus text exposition
async fn metrics_handler() -> Response {
    match metrics::encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

// ============================================================================
// Runway Handlers
// ============================================================================

/// List every runway
async fn list_runways(State(state): State<AppState>) -> Response {
    match state.scheduler.runways().await {
        Ok(runways) => ok(StatusCode::OK, runways),
        Err(e) => error_response(e),
    }
}

/// Create a runway
async fn create_runway(
    State(state): State<AppState>,
    Json(request): Json<CreateRunwayRequest>,
) -> Response {
    let category = match Category::from_id(&request.category) {
        Ok(category) => category,
        Err(e) => return error_response(e),
    };

    if let Err(e) = state.scheduler.create_runway(&request.name, category).await {
        return error_response(e);
    }

    match state.scheduler.runway_status(&request.name).await {
        Ok(status) => ok(StatusCode::CREATED, status),
        Err(e) => error_response(e),
    }
}

/// Get a runway's status
async fn get_runway(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.scheduler.runway_status(&name).await {
        Ok(status) => ok(StatusCode::OK, status),
        Err(e) => error_response(e),
    }
}

/// Open a runway
async fn open_runway(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    set_runway_open(state, name, true).await
}

/// Close a runway
async fn close_runway(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    set_runway_open(state, name, false).await
}

async fn set_runway_open(state: AppState, name: String, open: bool) -> Response {
    let result = if open {
        state.scheduler.open_runway(&name).await
    } else {
        state.scheduler.close_runway(&name).await
    };

    if let Err(e) = result {
        return error_response(e);
    }

    match state.scheduler.runway_status(&name).await {
        Ok(status) => ok(StatusCode::OK, status),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Flight Handlers
// ============================================================================

/// Request a runway for a flight
async fn request_runway(
    State(state): State<AppState>,
    Json(request): Json<FlightRequest>,
) -> Response {
    let category = match Category::from_id(&request.category) {
        Ok(category) => category,
        Err(e) => return error_response(e),
    };

    match state
        .scheduler
        .request_runway(&request.flight_id, &request.destination, &request.airline, category)
        .await
    {
        Ok(assignment) => ok(StatusCode::CREATED, assignment),
        Err(e) => error_response(e),
    }
}

/// Stream a flight's events as server-sent events until tracking ends
async fn track_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<String>,
    Query(query): Query<TrackQuery>,
) -> Response {
    let (observer, rx) = EventStreamObserver::channel(format!("sse:{}", query.airline));

    if let Err(e) = state
        .scheduler
        .subscribe(&flight_id, &query.airline, Arc::new(observer))
        .await
    {
        return error_response(e);
    }

    let events = stream::unfold(Some(rx), |rx| async move {
        let mut rx = rx?;
        let event = rx.recv().await?;
        let next = if event.is_terminal() { None } else { Some(rx) };

        let frame = Event::default()
            .event(event.as_str())
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().comment("unserializable event"));
        Some((Ok::<_, Infallible>(frame), next))
    });

    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

// ============================================================================
// Departure Handlers
// ============================================================================

/// Run one departure tick
async fn issue_departure(State(state): State<AppState>) -> Response {
    match state.scheduler.issue_departure().await {
        Ok(summary) => ok(StatusCode::OK, summary),
        Err(e) => error_response(e),
    }
}

/// Rearrange every queued flight
async fn rearrange(State(state): State<AppState>) -> Response {
    match state.scheduler.rearrange().await {
        Ok(summary) => ok(StatusCode::OK, summary),
        Err(e) => error_response(e),
    }
}

/// Query departures, optionally by runway or airline
async fn query_departures(
    State(state): State<AppState>,
    Query(query): Query<DeparturesQuery>,
) -> Response {
    let filter = match query.into_filter() {
        Ok(filter) => filter,
        Err(e) => return error_response(e),
    };

    match state.scheduler.departures(&filter).await {
        Ok(records) => ok(StatusCode::OK, records),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Tests
// ============================================================================
