use serde::Serialize;

/// A single rejected field on an incoming draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("failed to decode record: {0}")]
    Decode(String),
    #[error("failed to allocate record id: {0}")]
    Id(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token not provided. Send the header Authorization: Bearer <token>")]
    MissingToken,
    #[error("Invalid token format. Use Authorization: Bearer <token>")]
    MalformedHeader,
    #[error("Invalid token. Check that the token is correct and unaltered")]
    InvalidToken,
    #[error("Token expired. Please log in again")]
    Expired,
    #[error("No account found for the provided token")]
    UnknownSubject,
    #[error("Token is valid for neither admin nor hero")]
    UnsupportedToken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("failed to hash credential")]
    Hashing,
    #[error("failed to sign token")]
    Signing,
}

impl AuthError {
    /// Faults on our side rather than in what the caller sent.
    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::Hashing | AuthError::Signing)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    // uniform message, never says whether the record exists
    #[error("access denied")]
    Forbidden,
    #[error("validation failed")]
    ValidationFailed(Vec<FieldError>),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::ValidationFailed(vec![FieldError::new(field, message)])
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid bind address: {0}")]
    InvalidBind(String),
    #[error("token secret cannot be empty")]
    EmptySecret,
    #[error("token ttl must be between 1 and 2592000 seconds: {0}")]
    InvalidTtl(String),
    #[error("database path cannot be empty")]
    EmptyDbPath,
}
