use serde::{Deserialize, Serialize};

use crate::types::{SensorEvent, Verdict};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Route(SensorEvent),
    Exit,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireMessage {
    Route { event: SensorEvent },
    Exit,
}

/// One NDJSON line from a client. A line that fails to deserialize is a
/// malformed input: rejected immediately, no retry.
pub fn parse_client_message(line: &str) -> Result<ClientMessage, serde_json::Error> {
    let wire: WireMessage = serde_json::from_str(line)?;
    let message = match wire {
        WireMessage::Route { event } => ClientMessage::Route(event),
        WireMessage::Exit => ClientMessage::Exit,
    };
    Ok(message)
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Verdict {
        #[serde(flatten)]
        verdict: Verdict,
    },
    Error {
        message: String,
    },
}

pub fn encode_server_message(message: &ServerMessage) -> String {
    serde_json::to_string(message).unwrap_or_else(|err| {
        format!(r#"{{"type":"error","message":"failed to encode response: {}"}}"#, err)
    })
}
