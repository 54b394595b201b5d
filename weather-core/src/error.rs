use thiserror::Error;

/// Message key shown for every failed weather fetch.
pub const ERROR_GENERIC_KEY: &str = "ErrorGeneric";
/// Text key for a malformed request target. [`AppState`](crate::AppState)
/// reports every failure as [`ERROR_GENERIC_KEY`], so only front ends that
/// call the client directly use this one.
pub const ERROR_BAD_URL_KEY: &str = "ErrorBadUrl";

/// Failure of a single request/response round trip.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request target could not be built from the given input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Transport failure, non-2xx status, or an undecodable body.
    #[error("service error: {0}")]
    Service(String),
}

/// User-facing text for a message key. Unknown keys get the generic text.
pub fn user_message(key: &str) -> &'static str {
    match key {
        ERROR_BAD_URL_KEY => "Bad url",
        _ => "Oops, something went wrong. Please try again later.",
    }
}
