//! Sandboxed oracle view: an independent "ground truth" rendering of the
//! current source pair, for visual comparison against the pipeline under
//! inspection.
//!
//! The source pair is composed into a minimal standalone document and loaded
//! into an isolated context — by default a fresh, short-lived subprocess per
//! load, so the oracle never shares a handle (or an address space) with the
//! engine being inspected, and a malformed input cannot affect the
//! inspector. Hosts without a sandbox command simply show the composed
//! document instead; the rest of the core is unaffected.

use crate::model::{DrawCommand, SourcePair};
use crate::raster::{rasterize, PixelSurface, RasterError};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Errors from the sandbox context.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("sandbox rejected the document: {0}")]
    Sandbox(String),

    #[error("sandbox protocol violation: {0}")]
    Protocol(String),

    #[error("sandbox i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("sandbox reply could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Compose the standalone sandbox document: stylesheet in a style block,
/// markup as the body content.
pub fn compose_document(source: &SourcePair) -> String {
    format!(
        "<html><head><style>{}</style></head><body>{}</body></html>",
        source.stylesheet, source.markup
    )
}

/// An isolated rendering context the oracle loads documents into.
///
/// Implementations must be independent of the pipeline's engine handle and
/// must not let the loaded document touch inspector state beyond the
/// returned display list.
pub trait IsolatedContext {
    fn load(&mut self, document: &str) -> Result<Vec<DrawCommand>, OracleError>;
}

#[derive(Serialize)]
struct SandboxRequest<'a> {
    document: &'a str,
}

#[derive(Deserialize)]
struct SandboxReply {
    ok: Option<SandboxRendering>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct SandboxRendering {
    display_list: Vec<DrawCommand>,
}

fn decode_sandbox_reply(line: &str) -> Result<Vec<DrawCommand>, OracleError> {
    let reply: SandboxReply = serde_json::from_str(line)?;
    match (reply.ok, reply.error) {
        (Some(rendering), _) => Ok(rendering.display_list),
        (None, Some(message)) => Err(OracleError::Sandbox(message)),
        (None, None) => Err(OracleError::Protocol(String::from(
            "sandbox reply had neither `ok` nor `error`",
        ))),
    }
}

/// Isolated context backed by a fresh subprocess per load.
///
/// The command is spawned with the single argument `sandbox`, receives one
/// `{"document": ...}` line, and must reply with one
/// `{"ok": {"display_list": [...]}}` or `{"error": ...}` line. The process
/// is killed as soon as the reply is read.
pub struct SandboxProcess {
    command: String,
}

impl SandboxProcess {
    pub fn new(command: impl Into<String>) -> Self {
        SandboxProcess {
            command: command.into(),
        }
    }
}

impl IsolatedContext for SandboxProcess {
    fn load(&mut self, document: &str) -> Result<Vec<DrawCommand>, OracleError> {
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| OracleError::Protocol(String::from("empty sandbox command")))?;

        let mut child = Command::new(program)
            .args(parts)
            .arg("sandbox")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let result = (|| {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| OracleError::Protocol(String::from("sandbox stdin unavailable")))?;
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| OracleError::Protocol(String::from("sandbox stdout unavailable")))?;

            let request = serde_json::to_string(&SandboxRequest { document })?;
            writeln!(stdin, "{}", request)?;
            stdin.flush()?;
            drop(stdin);

            let mut line = String::new();
            let read = BufReader::new(stdout).read_line(&mut line)?;
            if read == 0 {
                return Err(OracleError::Protocol(String::from(
                    "sandbox closed its output stream",
                )));
            }
            decode_sandbox_reply(&line)
        })();

        let _ = child.kill();
        let _ = child.wait();
        debug!(ok = result.is_ok(), "sandbox load finished");
        result
    }
}

/// The oracle view: composed document plus its independently rendered
/// surface. Failures keep the previous content.
pub struct OracleView {
    context: Box<dyn IsolatedContext>,
    surface: PixelSurface,
    document: String,
}

impl OracleView {
    pub fn new(context: Box<dyn IsolatedContext>, width: u32, height: u32) -> Self {
        OracleView {
            context,
            surface: PixelSurface::new(width, height),
            document: String::new(),
        }
    }

    /// Re-render the reference for `source`. On any failure the previous
    /// surface and document are retained.
    pub fn present(&mut self, source: &SourcePair) -> Result<(), OracleError> {
        let document = compose_document(source);
        let list = self.context.load(&document)?;

        let mut scratch = PixelSurface::new(self.surface.width(), self.surface.height());
        rasterize(&list, &mut scratch)?;

        self.surface = scratch;
        self.document = document;
        Ok(())
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    /// The most recently loaded sandbox document.
    pub fn document(&self) -> &str {
        &self.document
    }
}
