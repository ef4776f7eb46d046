#![warn(clippy::all, missing_docs)]

//! Core domain logic for the depboard terminal client.
//!
//! This crate hosts the station directory, the remote departure-board
//! client (live and mock), the session controller, and configuration
//! handling used by the terminal UI and any future frontends.

pub mod config;
pub mod ldb;
pub mod session;
pub mod stations;

pub use config::AppConfig;
pub use ldb::{LdbApi, LdbClient, LdbConfig, LdbError, MockLdbClient};
pub use session::{
    Board, BoardPhase, Filter, Intent, RenderUpdate, SessionController, SessionEvent,
};
pub use stations::{StationCode, StationDirectory};
