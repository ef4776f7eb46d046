//! LDB API response DTOs.
//!
//! These types map directly to the departure-board JSON responses. They use
//! `Option` liberally because the service omits fields rather than sending
//! null in many cases.

use serde::Deserialize;

/// Response from `GetDepartureBoard`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationBoard {
    /// Human-readable name of the board's origin station.
    pub location_name: String,

    /// Filter direction (`"to"` or `"from"`), when a filter was applied.
    pub filter_type: Option<String>,

    /// Human-readable name of the filter destination, when filtered.
    pub filter_location_name: Option<String>,

    /// Train services at this station. Omitted when nothing is running.
    pub train_services: Option<Vec<ServiceItem>>,

    /// Network-wide advisory messages.
    pub nrcc_messages: Option<Vec<NrccMessage>>,
}

/// A single service on the departure board.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    /// Ephemeral service id, only valid while the service is on a board.
    #[serde(rename = "serviceID")]
    pub service_id: String,

    /// Scheduled time of departure, `HH:MM`.
    pub std: Option<String>,

    /// Estimated time of departure; may be "On time", "Delayed",
    /// "Cancelled", or a time like "10:15".
    pub etd: Option<String>,

    /// Platform number/letter, when known.
    pub platform: Option<String>,

    /// Train operating company name.
    pub operator: Option<String>,

    /// Destination station(s). The first entry is displayed.
    pub destination: Option<Vec<ServiceLocation>>,
}

/// Origin or destination location of a service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLocation {
    /// Human-readable station name.
    pub location_name: String,
}

/// A network advisory message. Bodies may contain HTML entities.
#[derive(Debug, Clone, Deserialize)]
pub struct NrccMessage {
    /// Message body.
    #[serde(alias = "Value")]
    pub value: String,
}

/// Response from `GetServiceDetails`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetailsResponse {
    /// Calling-point lists for each subsequent leg; the first list is the
    /// leg displayed.
    pub subsequent_calling_points: Option<Vec<CallingPointList>>,
}

/// One leg's ordered calling points.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallingPointList {
    /// Stops in running order.
    pub calling_point: Vec<CallingPointItem>,
}

/// A single calling point of a service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallingPointItem {
    /// Scheduled time at this stop, `HH:MM`.
    pub st: Option<String>,

    /// Estimated time or status at this stop.
    pub et: Option<String>,

    /// Human-readable stop name.
    pub location_name: String,
}
