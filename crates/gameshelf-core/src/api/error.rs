use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Shown when nothing more specific is known
const GENERIC_MESSAGE: &str = "An error occurred. Please try again.";

/// Shown when a 2xx body does not have the expected shape
pub(crate) const UNEXPECTED_RESPONSE_MESSAGE: &str =
    "Received an unexpected response format from the server.";

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// The server's `message` field when the body is a JSON error envelope
    fn server_message(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::server_message(body).unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Text suitable for showing to the user in a status line or overlay
    pub fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::AccessDenied(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServerError(msg)
                if is_presentable(msg) =>
            {
                msg.clone()
            }
            ApiError::Unauthorized(msg) if is_presentable(msg) => msg.clone(),
            ApiError::Unauthorized(_) => "Invalid email or password".to_string(),
            ApiError::AccessDenied(_) => "You do not have permission to do that".to_string(),
            ApiError::NotFound(_) => "Not found".to_string(),
            ApiError::RateLimited => "Too many requests - please wait and try again".to_string(),
            ApiError::ServerError(_) => "Server error - please try again later".to_string(),
            ApiError::NetworkError(e) if e.is_timeout() => {
                "The server took too long to respond".to_string()
            }
            ApiError::NetworkError(_) => {
                "Unable to connect to server. Check your connection and the API URL.".to_string()
            }
            ApiError::BadRequest(_) => GENERIC_MESSAGE.to_string(),
            ApiError::InvalidResponse(_) => UNEXPECTED_RESPONSE_MESSAGE.to_string(),
        }
    }
}

/// Short server messages are shown verbatim; raw HTML or long dumps are not
fn is_presentable(msg: &str) -> bool {
    !msg.is_empty() && msg.len() <= 200 && !msg.trim_start().starts_with('<')
}

/// User-facing text for any error surfaced by the client
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api_err) => api_err.user_message(),
        None => match err.downcast_ref::<reqwest::Error>() {
            Some(_) => {
                "Unable to connect to server. Check your connection and the API URL.".to_string()
            }
            None => GENERIC_MESSAGE.to_string(),
        },
    }
}

/// Whether an error chain carries a 401 from the server
pub fn is_unauthorized(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_unauthorized)
}
