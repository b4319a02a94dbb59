use anyhow::{Context, Result};
use std::path::Path;

use tarmac::batch;
use tarmac::scheduler::{DepartureFilter, ErrorKind};
use tarmac::service::AirportClient;

/// Submit every flight in a request file
pub async fn request(client: &AirportClient, input: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read request file: {}", input.display()))?;

    let rows = batch::parse_requests(&content)
        .with_context(|| format!("Malformed request file: {}", input.display()))?;

    tracing::info!(flights = rows.len(), input = %input.display(), "Submitting runway requests");

    let mut assigned = 0usize;
    for row in &rows {
        match client
            .request_runway(&row.flight_id, &row.destination, &row.airline, row.category)
            .await
        {
            Ok(assignment) => {
                tracing::debug!(flight = %row.flight_id, runway = %assignment.runway, "Flight assigned");
                assigned += 1;
            }
            Err(e) if e.kind().is_some_and(|kind| kind != ErrorKind::Internal) => {
                tracing::debug!(flight = %row.flight_id, error = %e, "Flight rejected");
                println!("Cannot assign Flight {}.", row.flight_id);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Request for flight {} failed", row.flight_id));
            }
        }
    }

    println!("{assigned} flights assigned.");
    Ok(())
}

/// Print a flight's events until tracking ends
pub async fn track(client: &AirportClient, flight_id: &str, airline: &str) -> Result<()> {
    let mut events = match client.track(flight_id, airline).await {
        Ok(events) => events,
        Err(e) if e.kind() == Some(ErrorKind::NotFound) => {
            println!("Flight {flight_id} of airline: {airline} does not exist.");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to subscribe"),
    };

    while let Some(event) = events.next_event().await? {
        println!("{}", event.describe());
    }

    Ok(())
}

/// Write departures to a report file
pub async fn query(client: &AirportClient, output: &Path, filter: DepartureFilter) -> Result<()> {
    let records = client.departures(&filter).await.context("Departure query failed")?;

    tokio::fs::write(output, batch::format_report(&records))
        .await
        .with_context(|| format!("Failed to write report: {}", output.display()))?;

    println!("{} departures written to {}", records.len(), output.display());
    Ok(())
}
