/// Error Handling Module
///
/// Every failure in the service maps to one `AppError` variant. Handlers
/// return `Result<HttpResponse, AppError>` and the `ResponseError`
/// implementation turns the error into a JSON body with a precise status,
/// so clients can tell "log in again" (401) from "bad request" (400) from
/// "retry shortly" (425).

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::logger::{current_request_id, REQUEST_ID_HEADER};

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Reasons a signed token can be rejected by the verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not three base64url segments, bad JSON, or the wrong claims shape
    Malformed,
    /// Header names an algorithm outside the HMAC family
    UnexpectedAlgorithm,
    InvalidSignature,
    Expired,
    WrongIssuer,
    WrongAudience,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "token is malformed"),
            TokenError::UnexpectedAlgorithm => write!(f, "unexpected signing method"),
            TokenError::InvalidSignature => write!(f, "token signature is invalid"),
            TokenError::Expired => write!(f, "token expired"),
            TokenError::WrongIssuer => write!(f, "incorrect token issuer"),
            TokenError::WrongAudience => write!(f, "incorrect token audience"),
        }
    }
}

impl StdError for TokenError {}

/// Authentication failures, all answered with 401
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    MissingHeader,
    MalformedHeader,
    MissingRefreshCookie,
    Token(TokenError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::MissingHeader => write!(f, "authorization header required"),
            AuthError::MalformedHeader => {
                write!(f, "authorization header format must be Bearer {{token}}")
            }
            AuthError::MissingRefreshCookie => write!(f, "no refresh token found in cookie"),
            AuthError::Token(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for AuthError {}

/// User store errors
#[derive(Debug)]
pub enum DatabaseError {
    NotFound(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    /// Unparseable form or JSON payload, or a subject that is not a user id
    MalformedInput(String),
    Unauthenticated(AuthError),
    /// The presented refresh token failed verification
    InvalidRefreshToken(TokenError),
    /// Refresh attempted while more than the throttle window remains
    NotYetDue { remaining_secs: i64 },
    /// A valid token whose subject has no matching user
    UnknownSubject(String),
    Signing(String),
    Database(DatabaseError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            AppError::Unauthenticated(e) => write!(f, "{}", e),
            AppError::InvalidRefreshToken(e) => write!(f, "Invalid refresh token: {}", e),
            AppError::NotYetDue { remaining_secs } => write!(
                f,
                "refresh token does not need renewed yet ({}s remaining)",
                remaining_secs
            ),
            AppError::UnknownSubject(sub) => write!(f, "unknown user: {}", sub),
            AppError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Unauthenticated(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => {
                AppError::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Database(DatabaseError::ConnectionPool(err.to_string()))
            }
            _ => AppError::Database(DatabaseError::UnexpectedError(err.to_string())),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// 425 Too Early
pub fn too_early() -> StatusCode {
    StatusCode::from_u16(425).unwrap_or(StatusCode::BAD_REQUEST)
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingHeader => "MISSING_AUTHORIZATION",
            AuthError::MalformedHeader => "MALFORMED_AUTHORIZATION",
            AuthError::MissingRefreshCookie => "MISSING_REFRESH_COOKIE",
            AuthError::Token(TokenError::Expired) => "TOKEN_EXPIRED",
            AuthError::Token(_) => "TOKEN_INVALID",
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let status = ResponseError::status_code(self);
        let (code, message) = match self {
            AppError::MalformedInput(_) => ("MALFORMED_INPUT", self.to_string()),
            AppError::Unauthenticated(AuthError::InvalidCredentials) => {
                ("INVALID_CREDENTIALS", "unauthorized".to_string())
            }
            AppError::Unauthenticated(e) => (e.code(), e.to_string()),
            AppError::InvalidRefreshToken(_) => ("INVALID_REFRESH_TOKEN", self.to_string()),
            AppError::NotYetDue { .. } => ("TOO_EARLY", self.to_string()),
            AppError::UnknownSubject(_) => ("UNKNOWN_USER", "unknown user".to_string()),
            AppError::Signing(_) => ("SIGNING_ERROR", "Internal server error".to_string()),
            AppError::Database(DatabaseError::NotFound(_)) => ("NOT_FOUND", self.to_string()),
            AppError::Database(DatabaseError::ConnectionPool(_)) => (
                "SERVICE_UNAVAILABLE",
                "User store temporarily unavailable".to_string(),
            ),
            AppError::Database(_) => ("DATABASE_ERROR", "Database error occurred".to_string()),
            AppError::Internal(_) => ("INTERNAL_ERROR", "Internal server error".to_string()),
        };

        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::MalformedInput(_)
            | AppError::InvalidRefreshToken(_)
            | AppError::UnknownSubject(_) => {
                tracing::warn!(request_id = request_id, error = %self, "Rejected request");
            }
            AppError::Unauthenticated(AuthError::InvalidCredentials) => {
                tracing::warn!(request_id = request_id, error = %self, "Invalid credentials attempt");
            }
            AppError::Unauthenticated(_) => {
                tracing::warn!(request_id = request_id, error = %self, "Authentication error");
            }
            AppError::NotYetDue { remaining_secs } => {
                tracing::info!(
                    request_id = request_id,
                    remaining_secs = remaining_secs,
                    "Refresh attempted before window opened"
                );
            }
            AppError::Database(DatabaseError::NotFound(_)) => {
                tracing::info!(request_id = request_id, error = %self, "Record not found");
            }
            AppError::Signing(_) | AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(request_id = request_id, error = %self, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        // error_id matches the request_id on the request's log span
        let request_id = current_request_id();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status)
            .insert_header((REQUEST_ID_HEADER, request_id))
            .json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MalformedInput(_)
            | AppError::InvalidRefreshToken(_)
            | AppError::UnknownSubject(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotYetDue { .. } => too_early(),
            AppError::Database(e) => match e {
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
                DatabaseError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Signing(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-request context attached to handler log lines
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Same id as the request's log span and any `error_id` returned
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: current_request_id(),
            user_id: None,
            operation: operation.into(),
        }
    }

    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }
}
