//! Session state and orchestration: filter, board, refresh scheduling.

pub mod controller;
pub mod models;
pub mod scheduler;

pub use controller::{BoardPhase, Intent, RenderUpdate, SessionController, SessionEvent};
pub use models::{
    Board, CallingPoint, Filter, FilterKind, ServiceDetail, ServiceId, ServiceSummary,
};
pub use scheduler::{spawn_ticker, RefreshScheduler, DEFAULT_REFRESH_PERIOD};
