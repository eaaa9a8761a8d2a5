//! Resilient client for the user service
//!
//! Every lookup goes through one [`Resilient`] policy owned by the client:
//! breaker admission, time-bounded attempts, fixed backoff between them.
//! The caller always gets a [`RemoteUser`]; failures turn into a degraded
//! placeholder tagged with the reason.

use crate::models::{DegradedReason, RemoteUser};
use actix_middleware::CORRELATION_ID_HEADER;
use reqwest::{Client, RequestBuilder, StatusCode};
use resilience::{CircuitSnapshot, ResilienceError, Resilient, ServiceConfig};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

const DEPENDENCY: &str = "user-service";

/// Per-request context forwarded to the peer
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub bearer: Option<String>,
    pub correlation_id: Option<String>,
    pub deadline: Option<Instant>,
}

#[derive(Debug, Error)]
enum PeerError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
    #[error("peer answered {0}")]
    Status(StatusCode),
    #[error("unreadable user payload: {0}")]
    Decode(reqwest::Error),
}

pub struct UserClient {
    http: Client,
    base_url: String,
    policy: Resilient,
}

impl UserClient {
    pub fn new(base_url: &str, config: ServiceConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            policy: Resilient::new(DEPENDENCY, config),
        }
    }

    pub fn circuit(&self) -> CircuitSnapshot {
        self.policy.snapshot()
    }

    /// Fetch a user, degrading instead of failing
    pub async fn fetch_user(&self, id: i64, ctx: &CallContext) -> RemoteUser {
        let url = format!("{}/users/{}", self.base_url, id);

        let outcome = self
            .policy
            .invoke(ctx.deadline, |attempt| {
                let mut req = self.http.get(&url);
                if let Some(token) = &ctx.bearer {
                    req = req.bearer_auth(token);
                }
                if let Some(cid) = &ctx.correlation_id {
                    req = req.header(CORRELATION_ID_HEADER, cid);
                }

                debug!(user_id = id, attempt, "Calling user service");
                fetch_once(req)
            })
            .await;

        let reason = match outcome {
            Ok(Some(user)) => return user,
            Ok(None) => DegradedReason::NotFound,
            Err(ResilienceError::CircuitOpen) => DegradedReason::CircuitOpen,
            Err(ResilienceError::DeadlineExceeded { .. }) => DegradedReason::DeadlineExceeded,
            Err(ref e @ (ResilienceError::Timeout { .. } | ResilienceError::Failed { .. })) => {
                debug!(user_id = id, error = %e, "User lookup failed");
                DegradedReason::Unavailable
            }
        };

        warn!(user_id = id, reason = %reason, "Falling back to degraded user");
        RemoteUser::degraded(id, reason)
    }
}

async fn fetch_once(req: RequestBuilder) -> Result<Option<RemoteUser>, PeerError> {
    let resp = req.send().await.map_err(PeerError::Transport)?;
    match resp.status() {
        // Answered, just absent
        StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => resp
            .json::<RemoteUser>()
            .await
            .map(Some)
            .map_err(PeerError::Decode),
        status => Err(PeerError::Status(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resilience::CircuitState;

    #[tokio::test]
    async fn test_unreachable_peer_degrades() {
        let mut config = resilience::internal_http_config();
        config.retry = None;
        // Nothing listens on port 9 locally
        let client = UserClient::new("http://127.0.0.1:9/", config);

        let user = client.fetch_user(3, &CallContext::default()).await;
        assert_eq!(user.id, 3);
        assert_eq!(user.degraded_reason, Some(DegradedReason::Unavailable));
        assert_eq!(client.circuit().state, CircuitState::Closed);
        assert_eq!(client.circuit().calls_in_window, 1);
    }
}
