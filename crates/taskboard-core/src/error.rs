use thiserror::Error;

/// How a failure is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// User-fixable input problem, shown inline in the originating dialog.
    Validation,
    /// Session or permission problem, shown as a notification.
    Authorization,
    /// The entity vanished remotely.
    NotFound,
    /// Server or network trouble; worth retrying.
    Transient,
}

/// Failure returned by a remote gateway call.
///
/// Every variant carries the store's human-readable message when the
/// response body had one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Bad request{}", detail(.0))]
    BadRequest(Option<String>),

    #[error("Unauthorized{}", detail(.0))]
    Unauthorized(Option<String>),

    #[error("Forbidden{}", detail(.0))]
    Forbidden(Option<String>),

    #[error("Not found{}", detail(.0))]
    NotFound(Option<String>),

    #[error("Server error{}", detail(.0))]
    Server(Option<String>),

    #[error("Network error{}", detail(.0))]
    Network(Option<String>),
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {}", message),
        None => String::new(),
    }
}

impl GatewayError {
    /// Map an HTTP status code onto the failure taxonomy.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            400 | 409 | 422 => GatewayError::BadRequest(message),
            401 => GatewayError::Unauthorized(message),
            403 => GatewayError::Forbidden(message),
            404 | 410 => GatewayError::NotFound(message),
            _ => GatewayError::Server(message),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::BadRequest(Some(message.into()))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            GatewayError::BadRequest(m)
            | GatewayError::Unauthorized(m)
            | GatewayError::Forbidden(m)
            | GatewayError::NotFound(m)
            | GatewayError::Server(m)
            | GatewayError::Network(m) => m.as_deref(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            GatewayError::BadRequest(_) => ErrorClass::Validation,
            GatewayError::Unauthorized(_) | GatewayError::Forbidden(_) => {
                ErrorClass::Authorization
            }
            GatewayError::NotFound(_) => ErrorClass::NotFound,
            GatewayError::Server(_) | GatewayError::Network(_) => ErrorClass::Transient,
        }
    }
}

#[derive(Error, Debug)]
pub enum BoardError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Board view was closed before the operation completed")]
    ViewClosed,
}

impl BoardError {
    pub fn class(&self) -> ErrorClass {
        match self {
            BoardError::Gateway(e) => e.class(),
            BoardError::Validation(_) | BoardError::Conflict(_) => ErrorClass::Validation,
            BoardError::NotFound(_) => ErrorClass::NotFound,
            BoardError::Config(_)
            | BoardError::Io(_)
            | BoardError::Internal(_)
            | BoardError::ViewClosed => ErrorClass::Transient,
        }
    }

    /// Message suitable for showing verbatim, if one exists.
    ///
    /// Gateway failures only have one when the store sent it; local
    /// validation failures always carry their own.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            BoardError::Gateway(e) => e.message(),
            BoardError::Validation(m) | BoardError::Conflict(m) => Some(m),
            _ => None,
        }
    }
}
