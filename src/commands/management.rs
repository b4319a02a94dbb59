use anyhow::{Context, Result};

use tarmac::scheduler::{Category, ErrorKind};
use tarmac::service::AirportClient;

/// Runway management action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunwayAction {
    Add,
    Open,
    Close,
    Status,
}

/// Run one runway management action and report the outcome
pub async fn runway(
    client: &AirportClient,
    action: RunwayAction,
    name: &str,
    category: Option<&str>,
) -> Result<()> {
    let outcome = match action {
        RunwayAction::Add => {
            let category = category.context("Missing category for new runway (--category)")?;
            let category = Category::from_id(category)?;
            client.create_runway(name, category).await.map(|_| true)
        }
        RunwayAction::Open => client.open_runway(name).await.map(|status| status.open),
        RunwayAction::Close => client.close_runway(name).await.map(|status| status.open),
        RunwayAction::Status => client.is_runway_open(name).await,
    };

    match outcome {
        Ok(open) => println!("Runway {name} is {}.", open_word(open)),
        Err(e) => match e.kind() {
            Some(ErrorKind::NotFound) => println!("Runway {name} not found."),
            Some(ErrorKind::AlreadyExists) => println!("Runway {name} already exists."),
            Some(ErrorKind::InvalidState) => {
                println!("Runway {name} is already {}.", open_word(action == RunwayAction::Open))
            }
            _ => return Err(e).context(format!("Runway {name} action failed")),
        },
    }

    Ok(())
}

fn open_word(open: bool) -> &'static str {
    if open {
        "open"
    } else {
        "closed"
    }
}

/// Issue one departure on every open runway
pub async fn takeoff(client: &AirportClient) -> Result<()> {
    let summary = client.issue_departure().await.context("Departure failed")?;

    tracing::debug!(departed = summary.departed.len(), "Departure issued");
    println!("Flights in runways departed.");
    Ok(())
}

/// Rearrange every waiting flight
pub async fn reorder(client: &AirportClient) -> Result<()> {
    let summary = client.rearrange().await.context("Rearrange failed")?;

    for flight_id in &summary.failed {
        println!("Cannot assign Flight {flight_id}.");
    }
    println!("{} flights assigned.", summary.assigned);
    Ok(())
}
