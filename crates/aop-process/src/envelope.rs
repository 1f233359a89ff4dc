//! The reply shape the AO loader parses.
//!
//! Field names and their order are part of the external contract:
//!
//! ```text
//! {"ok":true,"response":{"Output":"..","Error":"","Messages":[],"Spawns":[],"Assignments":[],"GasUsed":0}}
//! {"ok":false,"response":{"Error":".."}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::Reply;
use crate::error::ProcessResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(rename = "Output")]
    pub output: String,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Messages")]
    pub messages: Vec<Value>,
    #[serde(rename = "Spawns")]
    pub spawns: Vec<Value>,
    #[serde(rename = "Assignments")]
    pub assignments: Vec<Value>,
    #[serde(rename = "GasUsed")]
    pub gas_used: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorRecord {
    #[serde(rename = "Error")]
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Process(ProcessResponse),
    Failure(ErrorRecord),
}

/// Two-field reply. Built only through [`Envelope::success`] and
/// [`Envelope::failure`], so `ok` always agrees with the response variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    ok: bool,
    response: Response,
}

impl Envelope {
    pub fn success(reply: Reply) -> Self {
        Envelope {
            ok: true,
            response: Response::Process(ProcessResponse {
                output: reply.output,
                error: reply.error,
                ..ProcessResponse::default()
            }),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Envelope {
            ok: false,
            response: Response::Failure(ErrorRecord {
                error: message.into(),
            }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn to_vec(&self) -> ProcessResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
