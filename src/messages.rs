//! User-visible messages and pipeline constants

use std::time::Duration;

/// Default synthesis endpoint
pub const DEFAULT_API_URL: &str = "http://sermo.home/speech";

/// Default per-attempt timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default number of attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base of the linear backoff: attempt `k` is followed by a `k * base` wait
pub const RETRY_DELAY_BASE: Duration = Duration::from_millis(1000);

/// Longest preview shown in the "Speaking: ..." notice (display columns)
pub const MAX_PREVIEW_LENGTH: usize = 50;

pub const NO_TEXT_SELECTED: &str = "No text selected";
pub const CURRENT_LINE_EMPTY: &str = "Current line is empty";
pub const NO_TEXT_GIVEN: &str = "No text to speak";
pub const SPEAKING_PREFIX: &str = "Speaking: ";
pub const RETRYING: &str = "Retrying...";
pub const FAILED_AFTER_RETRIES: &str = "Failed after multiple attempts";
pub const REQUEST_FAILED: &str = "TTS request failed";

/// Descriptive message for a non-success HTTP status
///
/// Used when the error body does not carry a message of its own.
pub fn http_error_message(status: u16) -> &'static str {
    match status {
        400 => "Bad request - check your text input",
        401 => "Unauthorized - check your API credentials",
        403 => "Forbidden - access denied",
        404 => "API endpoint not found",
        429 => "Too many requests - rate limited, please wait",
        500 => "Server error - please try again later",
        502 => "Bad gateway - server temporarily unavailable",
        503 => "Service unavailable - server is down",
        _ => "Request failed",
    }
}

/// Progress notice emitted before the wait that follows a failed attempt
pub fn retry_notice(attempt: u32, max_retries: u32) -> String {
    format!("{} ({}/{})", RETRYING, attempt, max_retries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses_are_distinct() {
        let statuses = [400, 401, 403, 404, 429, 500, 502, 503];
        let mut seen: Vec<&str> = statuses.iter().map(|&s| http_error_message(s)).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), statuses.len());
    }

    #[test]
    fn test_unknown_status_is_generic() {
        assert_eq!(http_error_message(418), "Request failed");
        assert_eq!(http_error_message(504), "Request failed");
    }

    #[test]
    fn test_retry_notice() {
        assert_eq!(retry_notice(1, 3), "Retrying... (1/3)");
    }
}
