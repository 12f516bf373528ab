//! Main TUI application state and logic: the view coordinator.
//!
//! `App` owns the source editors, the single active [`ViewState`], and the
//! last good render snapshot. Every edit event synchronously invokes the
//! full pipeline; on success the one resulting snapshot fans out to every
//! materialized view (canvas, trees, oracle) and the session store, so
//! switching tabs never shows stale content. On failure nothing is updated:
//! the previous snapshot stays displayed and the error is logged.

use crate::engine::{PipelineInvoker, RenderEngine, RenderError, Submission};
use crate::model::{RenderResult, SourcePair};
use crate::oracle::{compose_document, OracleView};
use crate::raster::{rasterize, PixelSurface};
use crate::store::SessionStore;
use crate::ui::editor::EditorBuffer;
use crate::ui::panes::{self, SourceKind};
use crate::ui::theme::DEFAULT_THEME;
use crate::ui::tree::{TreeView, DOM_DEPTH, LAYOUT_DEPTH, STYLE_DEPTH};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::Tabs,
    Frame, Terminal,
};
use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use tracing::{debug, warn};

/// Viewport the engine lays out against, matching the rasterized surface.
pub const VIEWPORT_WIDTH: u32 = 800;
pub const VIEWPORT_HEIGHT: u32 = 600;

/// Which representation the display region currently shows. Exactly one is
/// active at any time; transitions happen only on explicit tab selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Canvas,
    Oracle,
    Dom,
    Style,
    Layout,
    DisplayList,
}

impl ViewState {
    pub const ALL: [ViewState; 6] = [
        ViewState::Canvas,
        ViewState::Oracle,
        ViewState::Dom,
        ViewState::Style,
        ViewState::Layout,
        ViewState::DisplayList,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ViewState::Canvas => "Canvas",
            ViewState::Oracle => "Oracle",
            ViewState::Dom => "Dom",
            ViewState::Style => "Style",
            ViewState::Layout => "Layout",
            ViewState::DisplayList => "Display List",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|view| *view == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Which pane receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Markup,
    Stylesheet,
    View,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Markup => FocusedPane::Stylesheet,
            FocusedPane::Stylesheet => FocusedPane::View,
            FocusedPane::View => FocusedPane::Markup,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Markup => FocusedPane::View,
            FocusedPane::Stylesheet => FocusedPane::Markup,
            FocusedPane::View => FocusedPane::Stylesheet,
        }
    }
}

/// The main application state.
pub struct App {
    invoker: PipelineInvoker,
    oracle: Option<OracleView>,
    store: SessionStore,

    /// The markup source editor.
    pub markup: EditorBuffer,
    /// The stylesheet source editor.
    pub stylesheet: EditorBuffer,

    view: ViewState,
    pub focused: FocusedPane,

    /// Last good snapshot; all tree views and the canvas derive from it.
    result: Option<RenderResult>,
    surface: PixelSurface,
    dom_tree: Option<TreeView>,
    style_tree: Option<TreeView>,
    layout_tree: Option<TreeView>,
    display_tree: Option<TreeView>,

    /// Ticket of the last applied submission; older submissions are dropped.
    last_applied: u64,
    render_count: u64,

    engine_rx: Option<Receiver<Result<Box<dyn RenderEngine + Send>, RenderError>>>,

    pub should_quit: bool,
    pub status_message: String,
}

impl App {
    /// Create the app and issue the initial render request. If the engine
    /// is still loading, the request is buffered and fires on readiness, so
    /// the first paint is never missed.
    pub fn new(
        invoker: PipelineInvoker,
        oracle: Option<OracleView>,
        store: SessionStore,
        source: SourcePair,
    ) -> Self {
        let mut app = App {
            invoker,
            oracle,
            store,
            markup: EditorBuffer::from_text(&source.markup),
            stylesheet: EditorBuffer::from_text(&source.stylesheet),
            view: ViewState::Canvas,
            focused: FocusedPane::Markup,
            result: None,
            surface: PixelSurface::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            dom_tree: None,
            style_tree: None,
            layout_tree: None,
            display_tree: None,
            last_applied: 0,
            render_count: 0,
            engine_rx: None,
            should_quit: false,
            status_message: String::from("Ready!"),
        };
        app.request_render();
        app
    }

    /// Channel delivering the asynchronously loaded engine.
    pub fn set_engine_loader(
        &mut self,
        rx: Receiver<Result<Box<dyn RenderEngine + Send>, RenderError>>,
    ) {
        self.engine_rx = Some(rx);
    }

    /// The current source pair as edited.
    pub fn source(&self) -> SourcePair {
        SourcePair::new(self.markup.text(), self.stylesheet.text())
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn result(&self) -> Option<&RenderResult> {
        self.result.as_ref()
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn oracle(&self) -> Option<&OracleView> {
        self.oracle.as_ref()
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Switch the visible view. Purely presentational: never re-renders and
    /// never touches the source pair.
    pub fn select_view(&mut self, view: ViewState) {
        debug!(view = view.title(), "view selected");
        self.view = view;
    }

    /// Invoke the full pipeline for the current sources and fan the result
    /// out. Called synchronously on every edit event.
    pub fn request_render(&mut self) {
        let source = self.source();
        match self.invoker.invoke(&source) {
            Ok(Some(submission)) => self.apply(submission),
            Ok(None) => debug!("render deferred until the engine is ready"),
            Err(err) => warn!(error = %err, "render failed; keeping last snapshot"),
        }
    }

    /// The loaded engine has arrived: attach it and apply the deferred
    /// first render, if one was buffered.
    pub fn engine_ready(&mut self, engine: Box<dyn RenderEngine + Send>) {
        self.status_message = format!("Engine {} ready", engine.version());
        match self.invoker.attach(engine) {
            Ok(Some(submission)) => self.apply(submission),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "deferred first render failed"),
        }
    }

    /// Fan one submission out to every materialized view and the store.
    ///
    /// All-or-nothing: the display list is rasterized into a scratch surface
    /// first, so a bad command leaves the canvas *and* the trees on the
    /// previous snapshot. Submissions older than the last applied one are
    /// dropped (last-writer-by-submission-order).
    fn apply(&mut self, submission: Submission) {
        if submission.ticket <= self.last_applied {
            debug!(
                ticket = submission.ticket,
                applied = self.last_applied,
                "dropping superseded submission"
            );
            return;
        }

        let mut scratch = PixelSurface::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT);
        if let Err(err) = rasterize(&submission.result.display_list, &mut scratch) {
            warn!(error = %err, "raster failed; keeping last snapshot");
            return;
        }

        self.last_applied = submission.ticket;
        self.surface = scratch;
        self.dom_tree = Some(TreeView::present(&submission.result.dom, DOM_DEPTH));
        self.style_tree = Some(TreeView::present(&submission.result.style, STYLE_DEPTH));
        self.layout_tree = Some(TreeView::present(&submission.result.layout, LAYOUT_DEPTH));
        self.display_tree = Some(TreeView::from_display_list(&submission.result.display_list));
        self.result = Some(submission.result);
        self.render_count += 1;
        self.status_message = String::from("Rendered");

        let source = self.source();
        if let Some(oracle) = self.oracle.as_mut() {
            if let Err(err) = oracle.present(&source) {
                warn!(error = %err, "oracle render failed; keeping prior reference");
            }
        }
        if let Err(err) = self.store.save(&source) {
            warn!(error = %err, "state not persisted; continuing in memory");
        }
    }

    fn active_tree(&mut self) -> Option<&mut TreeView> {
        match self.view {
            ViewState::Dom => self.dom_tree.as_mut(),
            ViewState::Style => self.style_tree.as_mut(),
            ViewState::Layout => self.layout_tree.as_mut(),
            ViewState::DisplayList => self.display_tree.as_mut(),
            ViewState::Canvas | ViewState::Oracle => None,
        }
    }

    /// Handle keyboard events.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char('q') | KeyCode::Char('c') = key.code {
                self.should_quit = true;
            }
            return;
        }

        match key.code {
            KeyCode::F(n @ 1..=6) => {
                self.select_view(ViewState::ALL[(n - 1) as usize]);
            }
            KeyCode::Tab => {
                self.focused = self.focused.next();
            }
            KeyCode::BackTab => {
                self.focused = self.focused.prev();
            }
            _ => match self.focused {
                FocusedPane::Markup | FocusedPane::Stylesheet => self.handle_editor_key(key),
                FocusedPane::View => self.handle_view_key(key),
            },
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let editor = match self.focused {
            FocusedPane::Markup => &mut self.markup,
            FocusedPane::Stylesheet => &mut self.stylesheet,
            FocusedPane::View => return,
        };

        let changed = match key.code {
            KeyCode::Char(c) => editor.insert_char(c),
            KeyCode::Enter => editor.insert_newline(),
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Delete => editor.delete(),
            KeyCode::Left => {
                editor.move_left();
                false
            }
            KeyCode::Right => {
                editor.move_right();
                false
            }
            KeyCode::Up => {
                editor.move_up();
                false
            }
            KeyCode::Down => {
                editor.move_down();
                false
            }
            KeyCode::Home => {
                editor.move_home();
                false
            }
            KeyCode::End => {
                editor.move_end();
                false
            }
            _ => false,
        };

        // Every keystroke that changes a buffer is an edit event
        if changed {
            self.request_render();
        }
    }

    fn handle_view_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left => self.select_view(self.view.prev()),
            KeyCode::Right => self.select_view(self.view.next()),
            KeyCode::Up => {
                if let Some(tree) = self.active_tree() {
                    tree.select_prev();
                }
            }
            KeyCode::Down => {
                if let Some(tree) = self.active_tree() {
                    tree.select_next();
                }
            }
            KeyCode::Enter => {
                if let Some(tree) = self.active_tree() {
                    tree.toggle_selected();
                }
            }
            _ => {}
        }
    }

    /// Poll the engine loader channel, if one is pending.
    fn poll_engine(&mut self) {
        let outcome = match &self.engine_rx {
            Some(rx) => match rx.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.engine_rx = None;
                    return;
                }
            },
            None => return,
        };

        self.engine_rx = None;
        match outcome {
            Ok(engine) => self.engine_ready(engine),
            Err(err) => warn!(error = %err, "engine failed to load"),
        }
    }

    /// Run the TUI event loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            self.poll_engine();

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI.
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(main_chunks[0]);

        // Left column: markup (top) | stylesheet (bottom)
        let editors = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(columns[0]);

        panes::render_editor_pane(
            frame,
            editors[0],
            "Markup",
            &mut self.markup,
            SourceKind::Markup,
            self.focused == FocusedPane::Markup,
        );
        panes::render_editor_pane(
            frame,
            editors[1],
            "Stylesheet",
            &mut self.stylesheet,
            SourceKind::Stylesheet,
            self.focused == FocusedPane::Stylesheet,
        );

        // Right column: tab strip above the shared display region
        let view_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(columns[1]);

        let tabs = Tabs::new(ViewState::ALL.iter().map(|view| view.title()))
            .select(self.view.index())
            .style(Style::default().fg(DEFAULT_THEME.comment))
            .highlight_style(
                Style::default()
                    .fg(DEFAULT_THEME.border_focused)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, view_chunks[0]);

        let view_area = view_chunks[1];
        let view_focused = self.focused == FocusedPane::View;
        match self.view {
            ViewState::Canvas => {
                panes::render_canvas_pane(frame, view_area, &self.surface, view_focused);
            }
            ViewState::Oracle => {
                let document = compose_document(&self.source());
                panes::render_oracle_pane(
                    frame,
                    view_area,
                    self.oracle.as_ref(),
                    &document,
                    view_focused,
                );
            }
            ViewState::Dom => {
                panes::render_tree_pane(
                    frame,
                    view_area,
                    self.dom_tree.as_mut(),
                    "Document Tree",
                    view_focused,
                );
            }
            ViewState::Style => {
                panes::render_tree_pane(
                    frame,
                    view_area,
                    self.style_tree.as_mut(),
                    "Style Tree",
                    view_focused,
                );
            }
            ViewState::Layout => {
                panes::render_tree_pane(
                    frame,
                    view_area,
                    self.layout_tree.as_mut(),
                    "Layout Tree",
                    view_focused,
                );
            }
            ViewState::DisplayList => {
                panes::render_tree_pane(
                    frame,
                    view_area,
                    self.display_tree.as_mut(),
                    "Display List",
                    view_focused,
                );
            }
        }

        panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.invoker.lifecycle(),
            self.invoker.engine_version(),
            self.render_count,
        );
    }
}
