//! Dev-server wire protocol.
//!
//! Frames travel as line-delimited JSON over TCP, one frame per line, tagged
//! by a `type` field. The server pushes [`ServerFrame`]s; the only thing the
//! client ever says back is [`ClientFrame::Pong`].

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// A frame sent by the dev server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// Handshake acknowledgement; the session is live.
    Connected,
    /// A fresh bundle to load.
    Bundle { bundle: String },
    /// Liveness probe; answered with a pong.
    Ping,
}

/// A frame sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Answer to a server ping.
    Pong,
}

impl ServerFrame {
    /// Parse one line of the stream.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

impl ClientFrame {
    /// Encode the frame as one line, trailing newline included.
    pub fn to_line(&self) -> String {
        // Serializing a unit-tagged enum cannot fail.
        let mut line = serde_json::to_string(self).unwrap_or_default();
        line.push('\n');
        line
    }
}

// ===========================================================================
// Tests
// ===========================================================================
