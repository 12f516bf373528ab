//! # Introduction
//!
//! renderlens drives an external HTML/CSS rendering engine and presents its
//! intermediate representations — document tree, computed style tree, layout
//! tree, and the ordered display list — as synchronized, switchable views in
//! a terminal UI, alongside a rasterized canvas and an independently
//! sandboxed "oracle" rendering for visual comparison.
//!
//! ## Inspection pipeline
//!
//! ```text
//! Sources → Pipeline Invoker → RenderResult → Rasterizer → Canvas
//!                                          ↘ Tree views (dom/style/layout/display list)
//!           Sources → Sandboxed Oracle → reference rendering
//! ```
//!
//! 1. [`model`] — the snapshot data model: [`model::SourcePair`],
//!    [`model::RenderResult`], trees and draw commands.
//! 2. [`engine`] — the renderer contract and the invoker that owns the
//!    engine handle, its `Uninitialized → Ready` lifecycle, and submission
//!    ordering.
//! 3. [`raster`] — painter's-algorithm rasterization of display lists onto
//!    an RGBA pixel surface.
//! 4. [`oracle`] — the sandboxed ground-truth rendering of the same sources
//!    through an isolated context.
//! 5. [`store`] — session persistence of the last edited source pair.
//! 6. [`ui`] — ratatui-based TUI; not part of the stable library API.
//!
//! Every successful invocation yields one atomic [`model::RenderResult`];
//! all views always derive from the same snapshot, and a failed invocation
//! leaves the previous snapshot displayed untouched.

pub mod engine;
pub mod model;
pub mod oracle;
pub mod raster;
pub mod store;
pub mod ui;
