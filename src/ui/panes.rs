//! Rendering logic for each TUI pane.

use crate::engine::EngineLifecycle;
use crate::oracle::OracleView;
use crate::raster::PixelSurface;
use crate::ui::editor::EditorBuffer;
use crate::ui::theme::DEFAULT_THEME;
use crate::ui::tree::TreeView;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Which source language an editor pane highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Markup,
    Stylesheet,
}

fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    }
}

/// Simple highlighting for markup lines: tags blue, attribute strings orange.
fn highlight_markup(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let mut rest = line;

    while let Some(open) = rest.find('<') {
        if open > 0 {
            spans.push(Span::styled(
                rest[..open].to_string(),
                Style::default().fg(DEFAULT_THEME.fg),
            ));
        }
        rest = &rest[open..];
        let end = rest.find('>').map(|idx| idx + 1).unwrap_or(rest.len());
        spans.push(Span::styled(
            rest[..end].to_string(),
            Style::default().fg(DEFAULT_THEME.tag),
        ));
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        spans.push(Span::styled(
            rest.to_string(),
            Style::default().fg(DEFAULT_THEME.fg),
        ));
    }
    Line::from(spans)
}

/// Simple highlighting for stylesheet lines: selectors yellow, property
/// names teal, values orange.
fn highlight_css(line: &str) -> Line<'_> {
    let mut spans = Vec::new();

    let (selector, declarations) = match line.find('{') {
        Some(brace) => (&line[..brace], &line[brace..]),
        None => ("", line),
    };
    if !selector.is_empty() {
        spans.push(Span::styled(
            selector.to_string(),
            Style::default().fg(DEFAULT_THEME.selector),
        ));
    }

    // Inside declarations, color `name` and `value` around each colon
    for (idx, piece) in declarations.split(';').enumerate() {
        if idx > 0 {
            spans.push(Span::styled(";", Style::default().fg(DEFAULT_THEME.fg)));
        }
        match piece.find(':') {
            Some(colon) => {
                spans.push(Span::styled(
                    piece[..colon].to_string(),
                    Style::default().fg(DEFAULT_THEME.attr_key),
                ));
                spans.push(Span::styled(":", Style::default().fg(DEFAULT_THEME.fg)));
                spans.push(Span::styled(
                    piece[colon + 1..].to_string(),
                    Style::default().fg(DEFAULT_THEME.literal),
                ));
            }
            None => {
                spans.push(Span::styled(
                    piece.to_string(),
                    Style::default().fg(DEFAULT_THEME.fg),
                ));
            }
        }
    }
    Line::from(spans)
}

/// Render one editable source pane with line numbers and a visible cursor.
pub fn render_editor_pane(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    buffer: &mut EditorBuffer,
    kind: SourceKind,
    is_focused: bool,
) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    // Keep the cursor line on screen
    if buffer.cursor_line < buffer.scroll {
        buffer.scroll = buffer.cursor_line;
    } else if buffer.cursor_line >= buffer.scroll + visible_height {
        buffer.scroll = buffer.cursor_line - visible_height + 1;
    }

    let lines: Vec<Line> = buffer
        .lines()
        .iter()
        .enumerate()
        .skip(buffer.scroll)
        .take(visible_height)
        .map(|(idx, text)| {
            let is_cursor_line = idx == buffer.cursor_line;
            let num_style = if is_cursor_line && is_focused {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };
            let mut spans = vec![Span::styled(format!("{:3} ", idx + 1), num_style)];

            if is_cursor_line && is_focused {
                // Plain styling on the cursor line so the cursor cell is
                // unambiguous
                let chars: Vec<char> = text.chars().collect();
                let col = buffer.cursor_col.min(chars.len());
                let before: String = chars[..col].iter().collect();
                let at: String = chars.get(col).map(|c| c.to_string()).unwrap_or_else(|| " ".into());
                let after: String = if col < chars.len() {
                    chars[col + 1..].iter().collect()
                } else {
                    String::new()
                };
                let line_style = Style::default()
                    .fg(DEFAULT_THEME.fg)
                    .bg(DEFAULT_THEME.current_line_bg);
                spans.push(Span::styled(before, line_style));
                spans.push(Span::styled(at, line_style.add_modifier(Modifier::REVERSED)));
                spans.push(Span::styled(after, line_style));
            } else {
                let highlighted = match kind {
                    SourceKind::Markup => highlight_markup(text),
                    SourceKind::Stylesheet => highlight_css(text),
                };
                spans.extend(highlighted.spans);
            }
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

/// Paint a pixel surface into `area` as half-block cells: each terminal cell
/// shows two vertically stacked samples via `▀` (fg = top, bg = bottom).
fn surface_lines(surface: &PixelSurface, width: u16, height: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(height as usize);
    if width == 0 || height == 0 || surface.width() == 0 || surface.height() == 0 {
        return lines;
    }

    let sample = |cx: u32, sub_row: u32, rows: u32| -> Color {
        let px = (cx * surface.width()) / width as u32;
        let py = (sub_row * surface.height()) / rows;
        let pixel = surface.pixel(
            px.min(surface.width() - 1),
            py.min(surface.height() - 1),
        );
        Color::Rgb(pixel.r, pixel.g, pixel.b)
    };

    let sub_rows = height as u32 * 2;
    for cy in 0..height as u32 {
        let mut spans = Vec::with_capacity(width as usize);
        for cx in 0..width as u32 {
            let top = sample(cx, cy * 2, sub_rows);
            let bottom = sample(cx, cy * 2 + 1, sub_rows);
            spans.push(Span::styled("▀", Style::default().fg(top).bg(bottom)));
        }
        lines.push(Line::from(spans));
    }
    lines
}

/// Render the rasterized canvas.
pub fn render_canvas_pane(
    frame: &mut Frame,
    area: Rect,
    surface: &PixelSurface,
    is_focused: bool,
) {
    let block = Block::default()
        .title(" Canvas ")
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(surface_lines(surface, inner.width, inner.height)),
        inner,
    );
}

/// Render the sandboxed oracle: its independent rendering when a sandbox is
/// configured, otherwise the composed document it would load.
pub fn render_oracle_pane(
    frame: &mut Frame,
    area: Rect,
    oracle: Option<&OracleView>,
    fallback_document: &str,
    is_focused: bool,
) {
    let block = Block::default()
        .title(" Oracle ")
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    match oracle {
        Some(view) => {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                Paragraph::new(surface_lines(view.surface(), inner.width, inner.height)),
                inner,
            );
        }
        None => {
            let mut lines = vec![
                Line::from(Span::styled(
                    "(no sandbox command configured)",
                    Style::default().fg(DEFAULT_THEME.comment),
                )),
                Line::from(""),
            ];
            lines.push(highlight_markup(fallback_document));
            frame.render_widget(
                Paragraph::new(lines)
                    .block(block)
                    .wrap(ratatui::widgets::Wrap { trim: false }),
                area,
            );
        }
    }
}

/// Render a collapsible tree pane.
pub fn render_tree_pane(
    frame: &mut Frame,
    area: Rect,
    tree: Option<&mut TreeView>,
    title: &str,
    is_focused: bool,
) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    let tree = match tree {
        Some(tree) => tree,
        None => {
            let paragraph = Paragraph::new("(waiting for the first render)")
                .block(block)
                .style(Style::default().fg(DEFAULT_THEME.comment));
            frame.render_widget(paragraph, area);
            return;
        }
    };

    let visible = tree.visible();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    // Keep the selection on screen
    if tree.selected < tree.scroll {
        tree.scroll = tree.selected;
    } else if tree.selected >= tree.scroll + visible_height {
        tree.scroll = tree.selected - visible_height + 1;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .enumerate()
        .skip(tree.scroll)
        .take(visible_height)
        .map(|(position, &row_index)| {
            let row = tree.row(row_index);
            let indent = "  ".repeat(row.depth);

            let marker = if row.descendants == 0 {
                "  "
            } else if tree.is_collapsed(row_index) {
                "▸ "
            } else {
                "▾ "
            };

            let label_style = if row.is_attribute {
                Style::default().fg(DEFAULT_THEME.attr_key)
            } else {
                Style::default().fg(DEFAULT_THEME.tag)
            };

            let mut spans = vec![
                Span::styled(indent, Style::default()),
                Span::styled(marker.to_string(), Style::default().fg(DEFAULT_THEME.secondary)),
            ];
            if row.is_attribute {
                match row.label.split_once(": ") {
                    Some((key, value)) => {
                        spans.push(Span::styled(format!("{}: ", key), label_style));
                        spans.push(Span::styled(
                            value.to_string(),
                            Style::default().fg(DEFAULT_THEME.literal),
                        ));
                    }
                    None => spans.push(Span::styled(row.label.clone(), label_style)),
                }
            } else {
                spans.push(Span::styled(row.label.clone(), label_style));
            }

            let mut item = ListItem::new(Line::from(spans));
            if position == tree.selected && is_focused {
                item = item.style(Style::default().bg(DEFAULT_THEME.selected_bg));
            }
            item
        })
        .collect();

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

/// Render the status bar at the bottom.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    message: &str,
    lifecycle: EngineLifecycle,
    engine_version: Option<&str>,
    render_count: u64,
) {
    let layout = ratatui::layout::Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([
            ratatui::layout::Constraint::Percentage(55),
            ratatui::layout::Constraint::Percentage(45),
        ])
        .split(area);

    let engine_badge = match lifecycle {
        EngineLifecycle::Uninitialized => Span::styled(
            " LOADING ",
            Style::default()
                .bg(DEFAULT_THEME.secondary)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        EngineLifecycle::Ready => Span::styled(
            format!(" {} ", engine_version.unwrap_or("engine")),
            Style::default()
                .bg(DEFAULT_THEME.primary)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
    };

    let left_spans = vec![
        engine_badge,
        Span::styled(
            format!(" render {} ", render_count),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!(" {} ", message),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.fg),
        ),
    ];

    let left = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Left);
    frame.render_widget(left, layout[0]);

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let right_spans = vec![
        Span::styled(" F1-F6 ", key_style),
        Span::styled(" view ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ⇥ ", key_style),
        Span::styled(" focus ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ↵ ", key_style),
        Span::styled(" expand ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ^Q ", key_style),
        Span::styled(" quit ", desc_style),
    ];

    let right = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Right);
    frame.render_widget(right, layout[1]);
}
