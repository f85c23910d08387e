use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Raised before any network call when a field, schema or call argument is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field: {0} is required")]
    Required(String),

    #[error("Invalid field: {0}")]
    UnknownKey(String),

    #[error("Invalid value for field: {0}")]
    InvalidValue(String),

    #[error("Invalid collection response: {0}")]
    CollectionResponse(String),
}

impl ValidationError {
    /// The attribute the error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Required(key) | Self::UnknownKey(key) | Self::InvalidValue(key) => Some(key),
            Self::CollectionResponse(_) => None,
        }
    }
}

/// A failed round trip, classified by HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpClientError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UnprocessableEntity(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("HTTP {status}: {message}")]
    Other {
        status: u16,
        message: String,
    },
}

impl HttpClientError {
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            400 =>
                Self::BadRequest(
                    message.unwrap_or_else(||
                        "Bad Request - The request could not be understood due to malformed syntax.".to_string()
                    )
                ),
            401 =>
                Self::Unauthorized(
                    message.unwrap_or_else(|| "Unauthorized - Your API key is wrong.".to_string())
                ),
            404 =>
                Self::NotFound(
                    message.unwrap_or_else(||
                        "Not Found - The requested resource is not found.".to_string()
                    )
                ),
            409 =>
                Self::Conflict(
                    message.unwrap_or_else(|| "Conflict - When a resource already exists.".to_string())
                ),
            422 =>
                Self::UnprocessableEntity(
                    message.unwrap_or_else(||
                        "Unprocessable Entity - Request is well-formed, but cannot be processed.".to_string()
                    )
                ),
            503 =>
                Self::ServiceUnavailable(
                    message.unwrap_or_else(||
                        "Service Unavailable - We're temporarily offline. Please try again later.".to_string()
                    )
                ),
            _ =>
                Self::Other {
                    status,
                    message: message.unwrap_or_else(|| "Unknown error occurred.".to_string()),
                },
        }
    }

    /// Fixed error for operations a backend does not offer.
    pub fn not_implemented() -> Self {
        Self::Other {
            status: 403,
            message: "Not implemented".to_string(),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::UnprocessableEntity(_) => 422,
            Self::ServiceUnavailable(_) => 503,
            Self::Other { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::UnprocessableEntity(message)
            | Self::ServiceUnavailable(message)
            | Self::Other { message, .. } => message,
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Http(#[from] HttpClientError),

    #[error("Unsupported service type: {0}")]
    UnsupportedService(String),

    #[error("Invalid {service} configuration: {reason}")]
    Config {
        service: String,
        reason: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SearchError {
    /// Status code of the underlying HTTP failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(err) => Some(err.status()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_statuses_to_kinds() {
        assert!(matches!(HttpClientError::from_status(400, None), HttpClientError::BadRequest(_)));
        assert!(
            matches!(HttpClientError::from_status(401, None), HttpClientError::Unauthorized(_))
        );
        assert!(matches!(HttpClientError::from_status(404, None), HttpClientError::NotFound(_)));
        assert!(matches!(HttpClientError::from_status(409, None), HttpClientError::Conflict(_)));
        assert!(
            matches!(
                HttpClientError::from_status(422, None),
                HttpClientError::UnprocessableEntity(_)
            )
        );
        assert!(
            matches!(
                HttpClientError::from_status(503, None),
                HttpClientError::ServiceUnavailable(_)
            )
        );
    }

    #[test]
    fn unknown_status_keeps_code_and_message() {
        let err = HttpClientError::from_status(418, Some("teapot".to_string()));
        assert_eq!(err.status(), 418);
        assert_eq!(err.message(), "teapot");
        assert_eq!(err.to_string(), "HTTP 418: teapot");

        let err = HttpClientError::from_status(500, None);
        assert_eq!(err.message(), "Unknown error occurred.");
    }

    #[test]
    fn supplied_message_overrides_default() {
        let err = HttpClientError::from_status(404, Some("no such index".to_string()));
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "no such index");
    }

    #[test]
    fn not_implemented_is_forbidden() {
        let err = SearchError::from(HttpClientError::not_implemented());
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.to_string(), "HTTP 403: Not implemented");
    }

    #[test]
    fn validation_messages() {
        assert_eq!(ValidationError::Required("name".into()).to_string(), "Field: name is required");
        assert_eq!(ValidationError::UnknownKey("foo".into()).to_string(), "Invalid field: foo");
        assert_eq!(
            ValidationError::InvalidValue("facet".into()).to_string(),
            "Invalid value for field: facet"
        );
        assert_eq!(ValidationError::InvalidValue("facet".into()).key(), Some("facet"));
    }
}
