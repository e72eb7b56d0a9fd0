use serde::Serialize;

/// Result of one remote write as seen by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionResponse {
    Success,
    /// Credentials were rejected; fatal for the whole run
    AuthenticationFailure,
    /// The service is throttling us; trips the circuit breaker
    RateLimited,
    /// Any other non-2xx, malformed or timed-out response
    OtherFailure(String),
}
