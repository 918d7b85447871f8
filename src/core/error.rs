use thiserror::Error;

/// Failures on the routing-critical path. Each variant maps to one HTTP
/// status at the boundary; none of them is retried.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    /// The parameter store could not be read
    #[error("Configuration store unavailable: {0}")]
    ConfigUnavailable(String),

    /// No registered record carries the requested name
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// The outbound call failed or exceeded its time bound
    #[error("Backend unreachable at {url}: {reason}")]
    BackendUnreachable {
        url: String,
        reason: String,
        timed_out: bool,
    },
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
