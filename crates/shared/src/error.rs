use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of the integer carried by a load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorCode {
    Internal,
    InvalidRequest,
    Network,
    NoFill,
    Other(i64),
}

impl LoadErrorCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => LoadErrorCode::Internal,
            1 => LoadErrorCode::InvalidRequest,
            2 => LoadErrorCode::Network,
            3 => LoadErrorCode::NoFill,
            other => LoadErrorCode::Other(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            LoadErrorCode::Internal => 0,
            LoadErrorCode::InvalidRequest => 1,
            LoadErrorCode::Network => 2,
            LoadErrorCode::NoFill => 3,
            LoadErrorCode::Other(code) => *code,
        }
    }

    /// Whether asking again later can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LoadErrorCode::Network | LoadErrorCode::NoFill)
    }
}

impl fmt::Display for LoadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadErrorCode::Internal => f.write_str("internal error"),
            LoadErrorCode::InvalidRequest => f.write_str("invalid request"),
            LoadErrorCode::Network => f.write_str("network error"),
            LoadErrorCode::NoFill => f.write_str("no fill"),
            LoadErrorCode::Other(code) => write!(f, "error code {code}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("controller id must not be empty")]
pub struct InvalidControllerId;
