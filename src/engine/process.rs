//! Renderer engine hosted in a subprocess, driven over newline-delimited
//! JSON.
//!
//! Wire contract:
//!
//! ```text
//! engine -> {"version": "<string>"}                       (once, at startup)
//! client -> {"markup": "...", "stylesheet": "..."}        (one line per render)
//! engine -> {"ok": {"dom": ..., "style": ..., "layout": ..., "display_list": [...]}}
//!        |  {"error": "message"}
//! ```
//!
//! The child is spawned once and kept for the session; it is killed on drop.

use super::{RenderEngine, RenderError};
use crate::model::RenderResult;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::debug;

#[derive(Serialize)]
struct RenderRequest<'a> {
    markup: &'a str,
    stylesheet: &'a str,
}

#[derive(Deserialize)]
struct Handshake {
    version: String,
}

#[derive(Deserialize)]
struct RenderReply {
    ok: Option<RenderResult>,
    error: Option<String>,
}

/// Decode one engine reply line into a result or an engine error.
fn decode_reply(line: &str) -> Result<RenderResult, RenderError> {
    let reply: RenderReply = serde_json::from_str(line)?;
    match (reply.ok, reply.error) {
        (Some(result), _) => Ok(result),
        (None, Some(message)) => Err(RenderError::Engine(message)),
        (None, None) => Err(RenderError::Protocol(String::from(
            "engine reply had neither `ok` nor `error`",
        ))),
    }
}

/// A renderer subprocess speaking the wire contract above.
pub struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    version: String,
}

impl EngineProcess {
    /// Spawn `command` (program plus whitespace-separated arguments) and
    /// complete the version handshake.
    pub fn spawn(command: &str) -> Result<Self, RenderError> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| RenderError::Protocol(String::from("empty engine command")))?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::Protocol(String::from("engine stdin unavailable")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RenderError::Protocol(String::from("engine stdout unavailable")))?;

        let mut engine = EngineProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            version: String::new(),
        };

        let line = engine.read_line()?;
        let handshake: Handshake = serde_json::from_str(&line)?;
        debug!(version = %handshake.version, "engine handshake complete");
        engine.version = handshake.version;
        Ok(engine)
    }

    fn read_line(&mut self) -> Result<String, RenderError> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line)?;
        if read == 0 {
            return Err(RenderError::Protocol(String::from(
                "engine closed its output stream",
            )));
        }
        Ok(line)
    }
}

impl RenderEngine for EngineProcess {
    fn version(&self) -> &str {
        &self.version
    }

    fn render(&mut self, markup: &str, stylesheet: &str) -> Result<RenderResult, RenderError> {
        let request = serde_json::to_string(&RenderRequest { markup, stylesheet })?;
        writeln!(self.stdin, "{}", request)?;
        self.stdin.flush()?;
        let line = self.read_line()?;
        decode_reply(&line)
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_successful_reply() {
        let line = r#"{"ok": {
            "dom": {"kind": "html"},
            "style": {"kind": "html"},
            "layout": {"kind": "block"},
            "display_list": []
        }}"#;
        let result = decode_reply(line).expect("decode failed");
        assert_eq!(result.dom.kind, "html");
        assert!(result.display_list.is_empty());
    }

    #[test]
    fn decodes_an_engine_error_reply() {
        let err = decode_reply(r#"{"error": "unbalanced tag"}"#).unwrap_err();
        match err {
            RenderError::Engine(message) => assert_eq!(message, "unbalanced tag"),
            other => panic!("expected an engine error, got {:?}", other),
        }
    }

    #[test]
    fn an_empty_reply_is_a_protocol_violation() {
        assert!(matches!(
            decode_reply("{}"),
            Err(RenderError::Protocol(_))
        ));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode_reply("not json"),
            Err(RenderError::Decode(_))
        ));
    }
}
