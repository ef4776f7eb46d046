//! Remote rail-information service: live HTTP client, offline mock, and the
//! port trait the session controller talks through.

pub mod client;
pub mod convert;
pub mod error;
pub mod mock;
pub mod types;

pub use client::{LdbClient, LdbConfig};
pub use error::{failure_message, FailureKind, LdbError};
pub use mock::MockLdbClient;

use async_trait::async_trait;

use crate::session::{Board, Filter, ServiceDetail, ServiceId};

/// Async port over the departure-board service.
///
/// Implementations are cheap to clone; the session controller clones one per
/// in-flight request and discards superseded completions itself.
#[async_trait]
pub trait LdbApi: Clone + Send + Sync + 'static {
    /// Fetch the departure board for a filter.
    async fn fetch_board(&self, filter: &Filter) -> Result<Board, LdbError>;

    /// Fetch calling-point details for a service id.
    async fn fetch_service_detail(&self, id: &ServiceId) -> Result<ServiceDetail, LdbError>;
}
