//! Launch-argument handling.
//!
//! Supported invocations:
//! - no arguments: interactive station search on startup
//! - `TOKEN`: bearer token only
//! - `FROM TO`: station codes, token taken from configuration (`TO` may be
//!   the literal `ALL` for all destinations)
//! - `FROM TO TOKEN`

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use depboard_core::stations::{StationCode, StationDirectory};

/// Destination argument meaning "all destinations".
const ALL_CODE: &str = "ALL";

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("failed to compile token regex")
});

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// Start with the station search prompt.
    Interactive { token: Option<String> },
    /// Start with a filter from the command line. Codes are kept raw here:
    /// validation against the directory happens at startup and is non-fatal.
    Filtered {
        from: String,
        to: Option<String>,
        token: Option<String>,
    },
}

impl Launch {
    /// Token supplied on the command line, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Launch::Interactive { token } | Launch::Filtered { token, .. } => token.as_deref(),
        }
    }
}

/// Parse the process arguments (program name already stripped).
pub fn parse_launch(args: &[String]) -> Result<Launch> {
    match args {
        [] => Ok(Launch::Interactive { token: None }),
        [token] => Ok(Launch::Interactive {
            token: Some(token.clone()),
        }),
        [from, to] => Ok(Launch::Filtered {
            from: from.clone(),
            to: destination(to),
            token: None,
        }),
        [from, to, token] => Ok(Launch::Filtered {
            from: from.clone(),
            to: destination(to),
            token: Some(token.clone()),
        }),
        _ => bail!("usage: depboard [TOKEN | FROM TO [TOKEN]]"),
    }
}

fn destination(raw: &str) -> Option<String> {
    if raw == ALL_CODE {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Whether a bearer token is syntactically valid (UUID-shaped).
pub fn is_valid_token(token: &str) -> bool {
    TOKEN_RE.is_match(token)
}

/// How the session begins once arguments have been checked against the
/// station directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Startup {
    /// Arguments resolved; search immediately.
    Filter {
        from: StationCode,
        to: Option<StationCode>,
    },
    /// Prompt for origin and destination.
    PromptOrigin,
    /// Origin resolved but the destination argument did not; prompt for the
    /// destination only.
    PromptDestination { from: StationCode },
}

/// Validate launch codes against the directory. An invalid code is reported
/// (second tuple element) but never fatal: the session starts anyway.
pub fn resolve_startup(launch: &Launch, directory: &StationDirectory) -> (Startup, Option<String>) {
    let Launch::Filtered { from, to, .. } = launch else {
        return (Startup::PromptOrigin, None);
    };

    let resolve = |raw: &str| {
        StationCode::parse(raw)
            .ok()
            .filter(|code| directory.contains(code))
    };

    let Some(from_code) = resolve(from) else {
        return (
            Startup::PromptOrigin,
            Some(format!("Invalid station code: {from}")),
        );
    };

    match to {
        None => (
            Startup::Filter {
                from: from_code,
                to: None,
            },
            None,
        ),
        Some(raw) => match resolve(raw) {
            Some(to_code) => (
                Startup::Filter {
                    from: from_code,
                    to: Some(to_code),
                },
                None,
            ),
            None => (
                Startup::PromptDestination { from: from_code },
                Some(format!("Invalid station code: {raw}")),
            ),
        },
    }
}
