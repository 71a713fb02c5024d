use serde::Deserialize;
use serde_json::Value;

/// Failure taxonomy shared by every asynchronous operation against the service.
///
/// Each variant carries a human-readable reason suitable for showing inline.
/// Search failures are not represented here: the debouncer swallows them and
/// commits an empty result set instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Credential missing, rejected or expired. Ends the session.
    #[error("{0}")]
    Auth(String),
    /// Malformed payload, either caught locally or rejected by the service (400/422).
    #[error("{0}")]
    Validation(String),
    /// Network failure, undecodable response, or any other server error.
    #[error("{0}")]
    Transport(String),
}

impl ClientError {
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Auth(msg) | Self::Validation(msg) | Self::Transport(msg) => msg,
        }
    }

    /// Classify a non-success HTTP response.
    ///
    /// `body` is the raw response body; the reason is taken from its `detail`
    /// field when present.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = detail_message(body);
        match status {
            401 | 403 => Self::Auth(detail.unwrap_or_else(|| "Not authenticated".to_string())),
            400 | 422 => Self::Validation(detail.unwrap_or_else(|| DEFAULT_REASON.to_string())),
            _ => Self::Transport(match detail {
                Some(d) => format!("Server returned {status}: {d}"),
                None => format!("Server returned {status}"),
            }),
        }
    }
}

pub const DEFAULT_REASON: &str = "An error occurred";

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// Pull a message out of a FastAPI-style error body.
///
/// `detail` is either a plain string or a list of `{loc, msg, type}` objects
/// (request validation errors); list entries are joined with "; ".
#[must_use]
pub fn detail_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Array(entries) => {
            let msgs: Vec<String> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}
