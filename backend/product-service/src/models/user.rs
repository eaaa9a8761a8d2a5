use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a user snapshot is a placeholder instead of live data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// Breaker open, no request was sent
    CircuitOpen,
    /// Every attempt failed or timed out
    Unavailable,
    /// The user service answered that the user does not exist
    NotFound,
    /// The inbound request ran out of time
    DeadlineExceeded,
}

impl DegradedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradedReason::CircuitOpen => "circuit_open",
            DegradedReason::Unavailable => "unavailable",
            DegradedReason::NotFound => "not_found",
            DegradedReason::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User as seen from this service, live or degraded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<DegradedReason>,
}

impl RemoteUser {
    pub fn degraded(id: i64, reason: DegradedReason) -> Self {
        Self {
            id,
            name: "User unavailable".to_string(),
            email: "N/A".to_string(),
            phone: None,
            address: None,
            degraded: true,
            degraded_reason: Some(reason),
        }
    }
}
