//! Mock LDB client for offline use and tests.
//!
//! Serves synthetic departure boards shaped like the live service's
//! responses: ten services spaced four minutes apart toward the filtered
//! destination, and a fixed nine-stop calling-point leg.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Local};

use crate::session::{
    Board, CallingPoint, Filter, FilterKind, ServiceDetail, ServiceId, ServiceSummary,
};
use crate::stations::{StationCode, StationDirectory};

use super::error::LdbError;
use super::LdbApi;

/// Services generated per synthetic board.
const SERVICE_COUNT: usize = 10;

/// Minutes between consecutive synthetic departures and calling points.
const SPACING_MINUTES: i64 = 4;

/// Calling points of every synthetic service, in running order.
const CALLING_POINTS: [&str; 9] = [
    "Lewisham",
    "Lewisham2",
    "Lewisham3",
    "Lewisham4",
    "Lewisham5",
    "St Johns",
    "New Cross",
    "London Bridge",
    "London Cannon Street",
];

/// In-process stand-in for the live LDB service.
///
/// Failure injection flags are shared across clones so a test can flip them
/// after handing the client to a session controller.
#[derive(Clone)]
pub struct MockLdbClient {
    directory: Arc<StationDirectory>,
    fail_boards: Arc<AtomicBool>,
    fail_details: Arc<AtomicBool>,
}

impl MockLdbClient {
    /// Create a mock client resolving names through the given directory.
    pub fn new(directory: Arc<StationDirectory>) -> Self {
        Self {
            directory,
            fail_boards: Arc::new(AtomicBool::new(false)),
            fail_details: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent board fetch fail until cleared.
    pub fn set_board_failure(&self, fail: bool) {
        self.fail_boards.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent detail fetch fail until cleared.
    pub fn set_detail_failure(&self, fail: bool) {
        self.fail_details.store(fail, Ordering::SeqCst);
    }

    fn name_for(&self, code: &StationCode) -> String {
        self.directory
            .display_name(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string())
    }
}

#[async_trait]
impl LdbApi for MockLdbClient {
    async fn fetch_board(&self, filter: &Filter) -> Result<Board, LdbError> {
        if self.fail_boards.load(Ordering::SeqCst) {
            return Err(LdbError::Api {
                status: 503,
                message: "injected board failure".to_string(),
            });
        }

        let destination_name = filter.to.as_ref().map(|code| self.name_for(code));
        let row_destination = destination_name
            .clone()
            .unwrap_or_else(|| "London Charing Cross".to_string());

        let mut time = Local::now();
        let services = (0..SERVICE_COUNT)
            .map(|i| {
                let service = ServiceSummary {
                    id: ServiceId::new(format!("svc-{i}")),
                    scheduled: time.format("%H:%M").to_string(),
                    destination: row_destination.clone(),
                    platform: Some("1".to_string()),
                    estimated: "On time".to_string(),
                    operator: "Southeastern".to_string(),
                };
                time += Duration::minutes(SPACING_MINUTES);
                service
            })
            .collect();

        Ok(Board {
            origin_name: self.name_for(&filter.from),
            filter_kind: FilterKind::To,
            destination_name,
            services,
            messages: vec!["Engineering works may affect weekend services.".to_string()],
        })
    }

    async fn fetch_service_detail(&self, _id: &ServiceId) -> Result<ServiceDetail, LdbError> {
        if self.fail_details.load(Ordering::SeqCst) {
            return Err(LdbError::Api {
                status: 503,
                message: "injected detail failure".to_string(),
            });
        }

        let mut time = Local::now();
        let calling_points = CALLING_POINTS
            .iter()
            .map(|location| {
                let point = CallingPoint {
                    scheduled: time.format("%H:%M").to_string(),
                    location: location.to_string(),
                    estimated: "On time".to_string(),
                };
                time += Duration::minutes(SPACING_MINUTES);
                point
            })
            .collect();

        Ok(ServiceDetail { calling_points })
    }
}
