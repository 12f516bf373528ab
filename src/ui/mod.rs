//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into five layers:
//!
//! - **[`app`]** — the view coordinator: application state, keyboard event
//!   loop, view selection, render fan-out
//! - **[`panes`]** — stateless render functions for each visible pane
//!   (editors, canvas, oracle, trees, status bar)
//! - **[`tree`]** — the collapsible tree view adapter
//! - **[`editor`]** — plain-text editor buffers for the two source panes
//! - **[`theme`]** — centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a
//! [`PipelineInvoker`] and call [`App::run`] to start the event loop.
//!
//! [`PipelineInvoker`]: crate::engine::PipelineInvoker
//! [`App::run`]: app::App::run

pub mod app;
pub mod editor;
pub mod panes;
pub mod theme;
pub mod tree;

pub use app::{App, FocusedPane, ViewState};
