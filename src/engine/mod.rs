//! The pipeline invoker and the renderer contract.
//!
//! The rendering engine itself is an external collaborator: this module only
//! defines the [`RenderEngine`] contract and owns the handle's lifecycle.
//! The invoker is the single producer of [`RenderResult`] snapshots — every
//! successful call yields one atomic result, stamped with a submission
//! ticket so the coordinator can enforce last-writer-by-submission-order.
//!
//! The handle passes through two lifecycle states. At startup it is
//! [`EngineLifecycle::Uninitialized`] while the engine process loads on a
//! background thread; render requests arriving in that window are buffered,
//! never forwarded. [`PipelineInvoker::attach`] flips the handle to
//! [`EngineLifecycle::Ready`] and issues exactly one render for the buffered
//! source pair, so the first paint is never missed.

pub mod process;

use crate::model::{RenderResult, SourcePair};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the renderer or its wire protocol.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The engine understood the request and rejected the input.
    #[error("engine rejected input: {0}")]
    Engine(String),

    /// The engine broke the wire contract (bad handshake, truncated reply).
    #[error("engine protocol violation: {0}")]
    Protocol(String),

    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine reply could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Contract for the external rendering engine.
///
/// For a fixed engine version, `render` must behave as a pure function of
/// `(markup, stylesheet)`: identical inputs yield identical results. The
/// receiver is `&mut` only because implementations own process I/O.
pub trait RenderEngine {
    /// Version string reported by the engine at load time.
    fn version(&self) -> &str;

    fn render(&mut self, markup: &str, stylesheet: &str) -> Result<RenderResult, RenderError>;
}

/// Lifecycle of the renderer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineLifecycle {
    /// The engine is still loading; render requests are buffered.
    Uninitialized,
    /// The engine accepted the handshake and renders synchronously.
    Ready,
}

/// One successful invocation: the atomic result plus its submission ticket.
///
/// Tickets increase in submission order. A consumer that has applied ticket
/// `n` must drop any submission with a ticket `<= n`.
#[derive(Debug)]
pub struct Submission {
    pub ticket: u64,
    pub result: RenderResult,
}

/// Owns the renderer handle and turns source pairs into snapshots.
///
/// The invoker has no side effects beyond the engine call itself: it never
/// touches persistence or views, and a failed call leaves every previously
/// returned result untouched.
pub struct PipelineInvoker {
    engine: Option<Box<dyn RenderEngine>>,
    pending: Option<SourcePair>,
    next_ticket: u64,
}

impl PipelineInvoker {
    /// An invoker whose engine has not finished loading yet.
    pub fn new() -> Self {
        PipelineInvoker {
            engine: None,
            pending: None,
            next_ticket: 0,
        }
    }

    /// An invoker that is `Ready` from the start.
    pub fn with_engine(engine: Box<dyn RenderEngine>) -> Self {
        PipelineInvoker {
            engine: Some(engine),
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn lifecycle(&self) -> EngineLifecycle {
        if self.engine.is_some() {
            EngineLifecycle::Ready
        } else {
            EngineLifecycle::Uninitialized
        }
    }

    /// Version of the attached engine, if any.
    pub fn engine_version(&self) -> Option<&str> {
        self.engine.as_deref().map(RenderEngine::version)
    }

    /// Render `source`.
    ///
    /// While `Uninitialized` the pair is buffered (replacing any earlier
    /// buffered pair) and `Ok(None)` is returned; the deferred render fires
    /// on [`attach`](Self::attach). While `Ready` the engine is called
    /// synchronously and a [`Submission`] is returned.
    pub fn invoke(&mut self, source: &SourcePair) -> Result<Option<Submission>, RenderError> {
        let engine = match self.engine.as_mut() {
            Some(engine) => engine,
            None => {
                debug!("engine not ready; buffering render request");
                self.pending = Some(source.clone());
                return Ok(None);
            }
        };

        let result = engine.render(&source.markup, &source.stylesheet)?;
        self.next_ticket += 1;
        Ok(Some(Submission {
            ticket: self.next_ticket,
            result,
        }))
    }

    /// Transition to `Ready` and issue the deferred first render, if a pair
    /// was buffered while loading. Called exactly once per engine handle.
    pub fn attach(
        &mut self,
        engine: Box<dyn RenderEngine>,
    ) -> Result<Option<Submission>, RenderError> {
        info!(version = engine.version(), "render engine ready");
        self.engine = Some(engine);
        match self.pending.take() {
            Some(source) => self.invoke(&source),
            None => Ok(None),
        }
    }
}

impl Default for PipelineInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TreeNode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Deterministic engine that stamps results with its call input.
    struct EchoEngine {
        calls: Arc<AtomicUsize>,
    }

    impl RenderEngine for EchoEngine {
        fn version(&self) -> &str {
            "echo-1"
        }

        fn render(&mut self, markup: &str, stylesheet: &str) -> Result<RenderResult, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RenderResult {
                dom: TreeNode::leaf(markup),
                style: TreeNode::leaf(stylesheet),
                layout: TreeNode::leaf("layout"),
                display_list: Vec::new(),
            })
        }
    }

    struct FailingEngine;

    impl RenderEngine for FailingEngine {
        fn version(&self) -> &str {
            "failing-1"
        }

        fn render(&mut self, _: &str, _: &str) -> Result<RenderResult, RenderError> {
            Err(RenderError::Engine(String::from("unsupported input")))
        }
    }

    #[test]
    fn uninitialized_invoker_buffers_instead_of_forwarding() {
        let mut invoker = PipelineInvoker::new();
        assert_eq!(invoker.lifecycle(), EngineLifecycle::Uninitialized);

        let sub = invoker
            .invoke(&SourcePair::new("<p>first</p>", ""))
            .expect("buffered invoke failed");
        assert!(sub.is_none());
    }

    #[test]
    fn attach_triggers_exactly_one_render_for_the_latest_buffered_pair() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut invoker = PipelineInvoker::new();

        invoker.invoke(&SourcePair::new("<p>old</p>", "")).unwrap();
        invoker.invoke(&SourcePair::new("<p>new</p>", "")).unwrap();

        let sub = invoker
            .attach(Box::new(EchoEngine {
                calls: Arc::clone(&calls),
            }))
            .expect("attach render failed")
            .expect("expected the deferred first render");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sub.result.dom.kind, "<p>new</p>");
        assert_eq!(invoker.lifecycle(), EngineLifecycle::Ready);
        assert_eq!(invoker.engine_version(), Some("echo-1"));
    }

    #[test]
    fn attach_without_buffered_pair_renders_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut invoker = PipelineInvoker::new();
        let sub = invoker
            .attach(Box::new(EchoEngine {
                calls: Arc::clone(&calls),
            }))
            .unwrap();
        assert!(sub.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tickets_increase_in_submission_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut invoker = PipelineInvoker::with_engine(Box::new(EchoEngine { calls }));

        let a = invoker
            .invoke(&SourcePair::new("<p>a</p>", ""))
            .unwrap()
            .unwrap();
        let b = invoker
            .invoke(&SourcePair::new("<p>b</p>", ""))
            .unwrap()
            .unwrap();
        assert!(b.ticket > a.ticket);
    }

    #[test]
    fn identical_inputs_yield_identical_results() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut invoker = PipelineInvoker::with_engine(Box::new(EchoEngine { calls }));
        let source = SourcePair::new("<p>same</p>", "p { color: #000000; }");

        let first = invoker.invoke(&source).unwrap().unwrap();
        let second = invoker.invoke(&source).unwrap().unwrap();
        assert_eq!(first.result, second.result);
    }

    #[test]
    fn a_failed_call_leaves_the_invoker_usable() {
        let mut invoker = PipelineInvoker::with_engine(Box::new(FailingEngine));
        let err = invoker
            .invoke(&SourcePair::new("<p></p>", ""))
            .expect_err("expected the engine error");
        assert!(matches!(err, RenderError::Engine(_)));

        // Still Ready, still callable
        assert_eq!(invoker.lifecycle(), EngineLifecycle::Ready);
        assert!(invoker.invoke(&SourcePair::new("<p></p>", "")).is_err());
    }
}
