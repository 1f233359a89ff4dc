//! Message interpretation for the AO process module.
//!
//! Everything here is pure: bytes in, bytes out. The wasm boundary (memory, result
//! buffer, exported symbols) lives in `aop-wasm-module`.

pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod message;

pub use dispatch::{DispatchTable, Handler, Reply};
pub use envelope::{Envelope, ErrorRecord, ProcessResponse, Response};
pub use error::{DecodeError, ProcessError, ProcessResult};
pub use message::{Environment, Message, Tag};

use tracing::{debug, warn};

/// Last-resort bytes if even the failure envelope cannot be serialized.
const MARSHAL_FAILURE_ENVELOPE: &[u8] =
    br#"{"ok":false,"response":{"Error":"Failed to marshal response"}}"#;

#[derive(Debug, Default)]
pub struct Processor {
    table: DispatchTable,
}

impl Processor {
    pub fn new(table: DispatchTable) -> Self {
        Processor { table }
    }

    /// Decode, resolve and dispatch one message.
    ///
    /// Only a message decode failure is an error here; the environment record is
    /// decoded for shape and a failure is logged, not reported.
    pub fn evaluate(&self, msg: &[u8], env: &[u8]) -> ProcessResult<Envelope> {
        let message = Message::from_slice(msg).map_err(|e| {
            warn!(error = %e, "message decode failed");
            ProcessError::Message(e)
        })?;
        if let Err(e) = Environment::from_slice(env) {
            warn!(error = %e, "environment decode failed; ignoring");
        }

        let action = message.action();
        debug!(action = %action, "resolved action");
        Ok(Envelope::success(self.table.dispatch(action, &message)))
    }

    /// Always yields a serialized envelope; recoverable errors become failure envelopes.
    pub fn handle(&self, msg: &[u8], env: &[u8]) -> Vec<u8> {
        let res = self.evaluate(msg, env).and_then(|envelope| envelope.to_vec());
        match res {
            Ok(bytes) => bytes,
            Err(e) => failure_bytes(&e),
        }
    }
}

pub fn failure_bytes(err: &ProcessError) -> Vec<u8> {
    Envelope::failure(err.envelope_text())
        .to_vec()
        .unwrap_or_else(|_| MARSHAL_FAILURE_ENVELOPE.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_envelope_matches_the_serialized_failure() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let bytes = failure_bytes(&ProcessError::Serialize(json_err));
        assert_eq!(bytes, MARSHAL_FAILURE_ENVELOPE);
    }

    #[test]
    fn environment_decode_failure_is_not_surfaced() {
        let p = Processor::default();
        let env = p
            .evaluate(br#"{"Tags":[{"name":"Action","value":"Hello"}]}"#, b"{oops")
            .expect("message decodes");
        assert!(env.is_ok());
    }

    #[test]
    fn message_decode_failure_is_reported() {
        let p = Processor::default();
        let err = p.evaluate(b"{oops", b"{}").expect_err("bad message");
        assert!(matches!(err, ProcessError::Message(_)));
    }
}
