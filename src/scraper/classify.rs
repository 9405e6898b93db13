//! Transport error classification for `ping.errors` labels.

use crate::metrics::ErrorType;

/// Classify an error by its message. `None` classifies as [`ErrorType::Unknown`].
pub fn categorize_error<E>(err: Option<&E>) -> ErrorType
where
    E: std::error::Error + ?Sized,
{
    match err {
        Some(err) => categorize_message(&err.to_string()),
        None => ErrorType::Unknown,
    }
}

/// Case-insensitive substring match; the first rule that matches wins.
pub fn categorize_message(message: &str) -> ErrorType {
    let msg = message.to_lowercase();

    if msg.contains("timeout") {
        ErrorType::Timeout
    } else if msg.contains("no such host") {
        ErrorType::DnsFailure
    } else if msg.contains("network is unreachable") {
        ErrorType::NetworkUnreachable
    } else if msg.contains("permission denied") || msg.contains("operation not permitted") {
        ErrorType::PermissionDenied
    } else {
        ErrorType::Unknown
    }
}
