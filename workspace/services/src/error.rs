use thiserror::Error;

/// Failures surfaced by the external collaborators.
///
/// Each variant maps to a documented fallback or user-visible message;
/// nothing in this crate panics or lets a transport error escape raw.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing user input (empty extraction request,
    /// oversized description).
    #[error("{0}")]
    Validation(String),

    /// The external service failed: network error, non-2xx response, or
    /// an error reported by the service itself.
    #[error("{service} error: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    /// The service answered, but not in the expected structure.
    #[error("invalid response format")]
    InvalidResponse,
}

impl ServiceError {
    /// Short machine-readable kind, for error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            ServiceError::InvalidResponse => "INVALID_RESPONSE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_service_display() {
        let err = ServiceError::ExternalService {
            service: "completion service",
            message: "status 500".to_string(),
        };
        assert_eq!(err.to_string(), "completion service error: status 500");
    }

    #[test]
    fn test_invalid_response_display() {
        assert_eq!(
            ServiceError::InvalidResponse.to_string(),
            "invalid response format"
        );
    }
}
