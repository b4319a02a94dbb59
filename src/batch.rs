//! Semicolon separated batch files
//!
//! Flight request files feed `tarmac request`; departure reports are what
//! `tarmac query` writes. Both carry one header line.

use crate::scheduler::{Category, DepartureRecord, SchedulerError, SchedulerResult};

/// Header of a flight request file
pub const REQUEST_HEADER: &str = "FlightCode;DestinyAirport;AirlineName;MinimumCategory";

/// Header of a departure report
pub const REPORT_HEADER: &str = "TakeOffOrders;RunwayName;FlightCode;DestinyAirport;AirlineName";

const SEPARATOR: char = ';';

/// One row of a flight request file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightRow {
    pub flight_id: String,
    pub destination: String,
    pub airline: String,
    pub category: Category,
}

/// Parse a flight request file
///
/// The first line is skipped whatever it holds. Blank lines are ignored;
/// any other malformed row fails the whole file, naming its line.
pub fn parse_requests(content: &str) -> SchedulerResult<Vec<FlightRow>> {
    content
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_row(index + 1, line))
        .collect()
}

fn parse_row(line_number: usize, line: &str) -> SchedulerResult<FlightRow> {
    let field = format!("line {line_number}");
    let columns: Vec<&str> = line.split(SEPARATOR).map(str::trim).collect();

    let [flight_id, destination, airline, category] = columns.as_slice() else {
        return Err(SchedulerError::invalid_input(
            field,
            format!("expected 4 fields, found {}", columns.len()),
        ));
    };

    let category = Category::from_id(category)
        .map_err(|_| SchedulerError::invalid_input(field, format!("unknown category '{category}'")))?;

    Ok(FlightRow {
        flight_id: flight_id.to_string(),
        destination: destination.to_string(),
        airline: airline.to_string(),
        category,
    })
}

/// Render departures as a report, header included
pub fn format_report(records: &[DepartureRecord]) -> String {
    let mut out = String::from(REPORT_HEADER);
    out.push('\n');

    for record in records {
        out.push_str(&format!(
            "{};{};{};{};{}\n",
            record.flights_before_departure,
            record.runway,
            record.flight_id,
            record.destination,
            record.airline
        ));
    }

    out
}
