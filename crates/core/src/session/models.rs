#![allow(missing_docs)]

use std::fmt;

use crate::stations::StationCode;

/// Opaque identifier used to look up calling-point details for a service.
///
/// Ids are ephemeral: they are only valid while the service still appears on
/// a departure board, and they are positionally aligned with the rendered
/// board rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Direction of a board filter. Only `to` is deployed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    #[default]
    To,
    From,
}

impl FilterKind {
    /// Wire value expected by the remote service.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::To => "to",
            FilterKind::From => "from",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The origin/destination pair controlling which board is fetched.
///
/// `to = None` means "all destinations".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub from: StationCode,
    pub to: Option<StationCode>,
}

impl Filter {
    pub fn new(from: StationCode, to: Option<StationCode>) -> Self {
        Self { from, to }
    }

    /// Swap origin and destination in place. Returns `false` (and leaves the
    /// filter untouched) when there is no destination to switch with.
    pub fn switch(&mut self) -> bool {
        match self.to {
            Some(to) => {
                self.to = Some(self.from);
                self.from = to;
                true
            }
            None => false,
        }
    }
}

/// One departure row on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub id: ServiceId,
    pub scheduled: String,
    pub destination: String,
    pub platform: Option<String>,
    pub estimated: String,
    pub operator: String,
}

impl ServiceSummary {
    /// Render the row as displayed on the departures list.
    pub fn row(&self) -> String {
        format!(
            "{} {:<25} {:<4} {:<10} {}",
            self.scheduled,
            self.destination,
            self.platform.as_deref().unwrap_or(""),
            self.estimated,
            self.operator
        )
    }
}

/// A fetched departure board. Replaced atomically on every successful
/// refresh; never merged with or patched over the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub origin_name: String,
    pub filter_kind: FilterKind,
    pub destination_name: Option<String>,
    pub services: Vec<ServiceSummary>,
    pub messages: Vec<String>,
}

impl Board {
    /// Title for this board: `"{origin} {kind} {destination}"`, falling back
    /// to "all destinations" when unfiltered.
    pub fn title(&self) -> String {
        format!(
            "{} {} {}",
            self.origin_name,
            self.filter_kind,
            self.destination_name.as_deref().unwrap_or("all destinations")
        )
    }

    /// Rendered departure rows, positionally aligned with [`Board::service_ids`].
    pub fn rows(&self) -> Vec<String> {
        self.services.iter().map(ServiceSummary::row).collect()
    }

    /// Service ids in row order.
    pub fn service_ids(&self) -> Vec<ServiceId> {
        self.services.iter().map(|s| s.id.clone()).collect()
    }
}

/// One stop of a specific service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallingPoint {
    pub scheduled: String,
    pub location: String,
    pub estimated: String,
}

impl CallingPoint {
    pub fn row(&self) -> String {
        format!(
            "{} {:<25}      {:<10}",
            self.scheduled, self.location, self.estimated
        )
    }
}

/// Calling points for the first subsequent leg of a selected service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDetail {
    pub calling_points: Vec<CallingPoint>,
}

impl ServiceDetail {
    pub fn rows(&self) -> Vec<String> {
        self.calling_points.iter().map(CallingPoint::row).collect()
    }
}
