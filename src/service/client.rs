//! Airport client
//!
//! This module provides a client for the airport HTTP service. The CLI uses
//! it for every remote command.

use futures::{Stream, StreamExt};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

use crate::notifications::FlightEvent;
use crate::scheduler::{
    Assignment, Category, DepartureFilter, DepartureRecord, DepartureSummary, ErrorKind,
    RearrangeSummary, RunwayStatus,
};

use super::api::{CreateRunwayRequest, FlightRequest, HealthResponse};

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the airport client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Airport server URL
    pub server_url: String,

    /// Request timeout
    pub timeout: Duration,

    /// Retry count for failed read requests
    pub retry_count: u32,

    /// Retry delay
    pub retry_delay: Duration,
}

impl ClientConfig {
    /// Create a new client config
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(70),
            retry_count: 2,
            retry_delay: Duration::from_millis(500),
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry count
    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    /// Set retry delay
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

// ============================================================================
// API Response Wrapper
// ============================================================================

/// Generic API response from the server
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: Option<T>,
}

/// Error body from the server
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
    kind: Option<ErrorKind>,
}

/// Health status from the server
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub version: String,
    pub uptime_secs: u64,
    pub runways: usize,
}

// ============================================================================
// Airport Client
// ============================================================================

/// Client for the airport HTTP service
pub struct AirportClient {
    config: ClientConfig,
    http_client: Client,

    /// No overall timeout: tracking streams stay open until the flight leaves
    stream_client: Client,
}

impl AirportClient {
    /// Create a new airport client
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        let stream_client = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            stream_client,
        })
    }

    /// Create a client with default settings
    pub fn connect(server_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(ClientConfig::new(server_url))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.server_url, path)
    }

    /// Check server health
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let health: HealthResponse = self.get_with_retry(&self.url("/api/health")).await?;

        Ok(HealthStatus {
            healthy: health.status == "healthy",
            version: health.version,
            uptime_secs: health.uptime_secs,
            runways: health.runways,
        })
    }

    /// Register a runway
    pub async fn create_runway(&self, name: &str, category: Category) -> Result<RunwayStatus, ClientError> {
        let request = CreateRunwayRequest {
            name: name.to_string(),
            category: category.id().to_string(),
        };
        self.post(&self.url("/api/runways"), &request).await
    }

    /// Get the status of a runway
    pub async fn runway_status(&self, name: &str) -> Result<RunwayStatus, ClientError> {
        self.get_with_retry(&self.url(&format!("/api/runways/{name}"))).await
    }

    /// Whether a runway is open
    pub async fn is_runway_open(&self, name: &str) -> Result<bool, ClientError> {
        Ok(self.runway_status(name).await?.open)
    }

    /// Open a runway
    pub async fn open_runway(&self, name: &str) -> Result<RunwayStatus, ClientError> {
        self.post(&self.url(&format!("/api/runways/{name}/open")), &()).await
    }

    /// Close a runway
    pub async fn close_runway(&self, name: &str) -> Result<RunwayStatus, ClientError> {
        self.post(&self.url(&format!("/api/runways/{name}/close")), &()).await
    }

    /// Request a runway for a flight
    pub async fn request_runway(
        &self,
        flight_id: &str,
        destination: &str,
        airline: &str,
        category: Category,
    ) -> Result<Assignment, ClientError> {
        let request = FlightRequest {
            flight_id: flight_id.to_string(),
            destination: destination.to_string(),
            airline: airline.to_string(),
            category: category.id().to_string(),
        };
        self.post(&self.url("/api/flights"), &request).await
    }

    /// Run one departure tick
    pub async fn issue_departure(&self) -> Result<DepartureSummary, ClientError> {
        self.post(&self.url("/api/departures/issue"), &()).await
    }

    /// Rearrange all queued flights
    pub async fn rearrange(&self) -> Result<RearrangeSummary, ClientError> {
        self.post(&self.url("/api/departures/rearrange"), &()).await
    }

    /// Query departures
    pub async fn departures(&self, filter: &DepartureFilter) -> Result<Vec<DepartureRecord>, ClientError> {
        let query = match filter {
            DepartureFilter::All => Vec::new(),
            DepartureFilter::Runway(name) => vec![("runway", name.as_str())],
            DepartureFilter::Airline(airline) => vec![("airline", airline.as_str())],
        };

        let request = self.http_client.get(self.url("/api/departures")).query(&query);
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;
        decode(response).await
    }

    /// Follow a flight's events until tracking ends
    pub async fn track(&self, flight_id: &str, airline: &str) -> Result<FlightEventStream, ClientError> {
        let response = self
            .stream_client
            .get(self.url(&format!("/api/flights/{flight_id}/track")))
            .query(&[("airline", airline)])
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        Ok(FlightEventStream::new(response))
    }

    // Internal: GET request with retry on transport failures
    async fn get_with_retry<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay).await;
            }

            match self.http_client.get(url).send().await {
                Ok(response) => return decode(response).await,
                Err(e) => {
                    tracing::debug!(url = %url, attempt, error = %e, "Request failed");
                    last_error = Some(ClientError::NetworkError(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ClientError::NetworkError("Unknown error".to_string())))
    }

    // Internal: POST request, never retried since mutations are not idempotent
    async fn post<B: Serialize, R: DeserializeOwned>(&self, url: &str, body: &B) -> Result<R, ClientError> {
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(error_from(response).await);
    }

    let envelope: ApiEnvelope<T> = response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(e.to_string()))?;

    envelope
        .data
        .ok_or_else(|| ClientError::InvalidResponse("Missing data".to_string()))
}

async fn error_from(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(ErrorEnvelope {
            error,
            kind: Some(kind),
        }) => ClientError::Api {
            status,
            kind,
            message: error,
        },
        Ok(ErrorEnvelope { error, kind: None }) => ClientError::HttpError {
            status,
            message: error,
        },
        Err(_) => ClientError::HttpError {
            status,
            message: body,
        },
    }
}

// ============================================================================
// Event Stream
// ============================================================================

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, reqwest::Error>> + Send>>;

/// Server-sent flight events, decoded one at a time
pub struct FlightEventStream {
    body: ByteStream,
    buffer: String,
    ended: bool,
}

impl FlightEventStream {
    fn new(response: Response) -> Self {
        Self {
            body: Box::pin(response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec()))),
            buffer: String::new(),
            ended: false,
        }
    }

    /// Next event, or `None` once tracking ended or the server hung up
    pub async fn next_event(&mut self) -> Result<Option<FlightEvent>, ClientError> {
        loop {
            if self.ended {
                return Ok(None);
            }

            if let Some(frame) = take_frame(&mut self.buffer) {
                if let Some(event) = parse_sse_frame(&frame)? {
                    self.ended = event.is_terminal();
                    return Ok(Some(event));
                }
                continue;
            }

            match self.body.next().await {
                Some(Ok(chunk)) => {
                    self.buffer.push_str(&String::from_utf8_lossy(&chunk).replace('\r', ""));
                }
                Some(Err(e)) => return Err(ClientError::NetworkError(e.to_string())),
                None => {
                    self.ended = true;
                }
            }
        }
    }
}

fn take_frame(buffer: &mut String) -> Option<String> {
    let end = buffer.find("\n\n")?;
    let frame = buffer[..end].to_string();
    buffer.drain(..end + 2);
    Some(frame)
}

/// Decode one SSE frame; comment-only frames yield `None`
pub fn parse_sse_frame(frame: &str) -> Result<Option<FlightEvent>, ClientError> {
    let data: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();

    if data.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&data.join("\n"))
        .map(Some)
        .map_err(|e| ClientError::ParseError(e.to_string()))
}

// ============================================================================
// Client Errors
// ============================================================================

/// Client errors
#[derive(Debug, Clone)]
pub enum ClientError {
    /// Initialization error
    InitError(String),

    /// Network error
    NetworkError(String),

    /// The server rejected the request with a typed error
    Api {
        status: u16,
        kind: ErrorKind,
        message: String,
    },

    /// HTTP error without a typed body
    HttpError { status: u16, message: String },

    /// Parse error
    ParseError(String),

    /// Invalid response
    InvalidResponse(String),
}

impl ClientError {
    /// Scheduler error kind, when the server reported one
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NetworkError(_) => true,
            Self::Api { kind, .. } => *kind != ErrorKind::Internal,
            _ => false,
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InitError(msg) => write!(f, "Initialization error: {msg}"),
            Self::NetworkError(msg) => write!(f, "Network error: {msg}"),
            Self::Api { message, .. } => write!(f, "{message}"),
            Self::HttpError { status, message } => {
                write!(f, "HTTP error ({status}): {message}")
            }
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_creation() {
        let config = ClientConfig::new("http://localhost:7070/")
            .with_retry_count(5)
            .with_timeout(Duration::from_secs(3));

        assert_eq!(config.server_url, "http://localhost:7070");
        assert_eq!(config.retry_count, 5);
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_take_frame() {
        let mut buffer = String::from("data: 1\n\ndata: 2\n");
        assert_eq!(take_frame(&mut buffer).as_deref(), Some("data: 1"));
        assert_eq!(take_frame(&mut buffer), None);
        assert_eq!(buffer, "data: 2\n");
    }

    #[test]
    fn test_parse_sse_frame() {
        let frame = "event: departed\ndata: {\"event\":\"departed\",\"flight_id\":\"F1\",\"destination\":\"EZE\",\"runway\":\"R1\"}";
        let event = parse_sse_frame(frame).unwrap().unwrap();
        assert_eq!(event.flight_id(), "F1");
        assert_eq!(event.as_str(), "departed");

        assert!(parse_sse_frame(":keep-alive").unwrap().is_none());
        assert!(matches!(
            parse_sse_frame("data: {oops"),
            Err(ClientError::ParseError(_))
        ));
    }

    #[test]
    fn test_error_classification() {
        let not_found = ClientError::Api {
            status: 404,
            kind: ErrorKind::NotFound,
            message: "Runway not found: R9".to_string(),
        };
        assert_eq!(not_found.kind(), Some(ErrorKind::NotFound));
        assert!(not_found.is_recoverable());
        assert_eq!(not_found.to_string(), "Runway not found: R9");

        let fault = ClientError::Api {
            status: 503,
            kind: ErrorKind::Internal,
            message: "Exceeded lock retries".to_string(),
        };
        assert!(!fault.is_recoverable());
        assert!(ClientError::NetworkError("refused".into()).is_recoverable());
    }
}
