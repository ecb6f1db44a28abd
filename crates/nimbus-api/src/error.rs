use thiserror::Error;

/// Weather API client errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}")]
    Status { status: u16 },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify an error raised while reading/decoding a response body.
    pub(crate) fn from_body_error(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::Transport(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = ApiError::Status { status: 503 };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_decode_display() {
        let err = ApiError::Decode("missing field `hash`".to_string());
        assert!(err.to_string().contains("malformed"));
    }
}
