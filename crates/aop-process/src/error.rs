use aop_contracts::{ERR_INVALID_MESSAGE_JSON, ERR_MARSHAL_RESPONSE};
use thiserror::Error;

/// Failure to turn an inbound byte range into a structured record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a json object, found {0}")]
    NotAnObject(&'static str),
}

/// Recoverable failures of a single `handle` call.
///
/// Both kinds are reported to the host as a failure envelope; neither escapes the
/// call as anything other than a normal result buffer.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("message: {0}")]
    Message(#[source] DecodeError),

    #[error("serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ProcessError {
    /// Text placed in the failure envelope's `Error` field.
    pub fn envelope_text(&self) -> &'static str {
        match self {
            ProcessError::Message(_) => ERR_INVALID_MESSAGE_JSON,
            ProcessError::Serialize(_) => ERR_MARSHAL_RESPONSE,
        }
    }
}

pub type ProcessResult<T> = Result<T, ProcessError>;
