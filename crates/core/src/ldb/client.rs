//! LDB HTTP client.
//!
//! Async methods for querying the live departure board service. Handles
//! bearer authentication, status mapping, and conversion to domain types.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::session::{Board, Filter, ServiceDetail, ServiceId};

use super::convert::{board_from_wire, detail_from_wire};
use super::error::LdbError;
use super::types::{ServiceDetailsResponse, StationBoard};
use super::LdbApi;

/// Default base URL for the LDB API.
const DEFAULT_BASE_URL: &str = "https://api1.raildata.org.uk/1010-live-departure-board/LDBWS";

/// Number of board rows requested per fetch.
const ROW_LIMIT: u8 = 10;

/// Minutes offset from now for the board window.
const TIME_OFFSET: i16 = 0;

/// Minutes covered by the board window.
const TIME_WINDOW: u16 = 120;

/// How many characters of a bad response body to keep for the log.
const BODY_SNIPPET_LEN: usize = 500;

/// Configuration for the LDB client.
#[derive(Debug, Clone)]
pub struct LdbConfig {
    /// Bearer token attached to every call.
    pub token: String,
    /// Base URL for the API (defaults to production).
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl LdbConfig {
    /// Create a new config with the given bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// LDB API client.
///
/// Stateless from the session's point of view: the bearer token is installed
/// as a default header and carries no session state.
#[derive(Debug, Clone)]
pub struct LdbClient {
    http: reqwest::Client,
    base_url: String,
}

impl LdbClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LdbConfig) -> Result<Self, LdbError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.token)).map_err(|_| {
            LdbError::Api {
                status: 0,
                message: "token is not a valid header value".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    fn check_status(status: reqwest::StatusCode) -> Option<LdbError> {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Some(LdbError::Unauthorized);
        }
        if status.is_success() {
            return None;
        }
        Some(LdbError::Api {
            status: status.as_u16(),
            message: String::new(),
        })
    }
}

#[async_trait]
impl LdbApi for LdbClient {
    async fn fetch_board(&self, filter: &Filter) -> Result<Board, LdbError> {
        let url = format!(
            "{}/api/20220120/GetDepartureBoard/{}",
            self.base_url, filter.from
        );

        let mut query = vec![
            ("numRows", ROW_LIMIT.to_string()),
            ("timeOffset", TIME_OFFSET.to_string()),
            ("timeWindow", TIME_WINDOW.to_string()),
        ];
        if let Some(to) = &filter.to {
            query.push(("filterCrs", to.as_str().to_string()));
            query.push(("filterType", "to".to_string()));
        }

        let response = self.http.get(&url).query(&query).send().await?;
        let status = response.status();

        if let Some(err) = Self::check_status(status) {
            let body = response.text().await.unwrap_or_default();
            return Err(match err {
                LdbError::Api { status, .. } => LdbError::Api {
                    status,
                    message: body,
                },
                other => other,
            });
        }

        let body = response.text().await?;
        let board: StationBoard = serde_json::from_str(&body).map_err(|e| LdbError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(BODY_SNIPPET_LEN).collect()),
        })?;

        Ok(board_from_wire(board))
    }

    async fn fetch_service_detail(&self, id: &ServiceId) -> Result<ServiceDetail, LdbError> {
        let url = format!(
            "{}/api/20220120/GetServiceDetails/{}",
            self.base_url,
            id.as_str()
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LdbError::ServiceNotFound);
        }
        if let Some(err) = Self::check_status(status) {
            let body = response.text().await.unwrap_or_default();
            return Err(match err {
                LdbError::Api { status, .. } => LdbError::Api {
                    status,
                    message: body,
                },
                other => other,
            });
        }

        let body = response.text().await?;

        // The service answers null/empty for expired ids.
        if body.is_empty() || body == "null" {
            return Err(LdbError::ServiceNotFound);
        }

        let details: ServiceDetailsResponse =
            serde_json::from_str(&body).map_err(|e| LdbError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(BODY_SNIPPET_LEN).collect()),
            })?;

        Ok(detail_from_wire(details))
    }
}
