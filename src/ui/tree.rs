//! Tree view adapter: flattens a [`TreeNode`] into collapsible rows.
//!
//! Built fresh from the current tree on every render (no diffing against the
//! prior view — renders are rare next to a human edit cadence). Nodes deeper
//! than the view's default expansion depth start collapsed but stay
//! individually expandable.

use crate::model::{Color, DrawCommand, TreeNode};
use rustc_hash::FxHashSet;
use serde_json::json;
use std::collections::BTreeMap;

/// Default expansion depth for the document tree view.
pub const DOM_DEPTH: usize = 4;
/// Default expansion depth for the style tree view. Style trees are flat but
/// wide, with many attribute entries, hence the deeper default.
pub const STYLE_DEPTH: usize = 7;
/// Default expansion depth for the layout tree view.
pub const LAYOUT_DEPTH: usize = 3;
/// Default expansion depth for the display list view.
pub const DISPLAY_LIST_DEPTH: usize = 3;

/// One flattened row: a node's kind line or an attribute entry.
#[derive(Debug, Clone)]
pub struct TreeRow {
    pub depth: usize,
    pub label: String,
    pub is_attribute: bool,
    /// Number of rows in this row's subtree, excluding the row itself.
    pub descendants: usize,
}

/// A collapsible flattened tree.
#[derive(Debug)]
pub struct TreeView {
    rows: Vec<TreeRow>,
    collapsed: FxHashSet<usize>,
    pub selected: usize,
    pub scroll: usize,
}

impl TreeView {
    /// Build a fresh view of `node`. Rows at depth >= `default_depth` start
    /// collapsed.
    pub fn present(node: &TreeNode, default_depth: usize) -> Self {
        let mut rows = Vec::new();
        flatten(node, 0, &mut rows);

        let collapsed = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.descendants > 0 && row.depth >= default_depth)
            .map(|(idx, _)| idx)
            .collect();

        TreeView {
            rows,
            collapsed,
            selected: 0,
            scroll: 0,
        }
    }

    /// Present a display list as a labeled tree at its default depth.
    pub fn from_display_list(list: &[DrawCommand]) -> Self {
        Self::present(&display_list_tree(list), DISPLAY_LIST_DEPTH)
    }

    pub fn row(&self, index: usize) -> &TreeRow {
        &self.rows[index]
    }

    pub fn is_collapsed(&self, index: usize) -> bool {
        self.collapsed.contains(&index)
    }

    /// Row indices currently visible, in display order.
    pub fn visible(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < self.rows.len() {
            out.push(i);
            if self.collapsed.contains(&i) {
                i += self.rows[i].descendants + 1;
            } else {
                i += 1;
            }
        }
        out
    }

    pub fn select_next(&mut self) {
        let count = self.visible().len();
        if self.selected + 1 < count {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Expand or collapse the selected row, if it has children.
    pub fn toggle_selected(&mut self) {
        let visible = self.visible();
        let Some(&row) = visible.get(self.selected) else {
            return;
        };
        if self.rows[row].descendants == 0 {
            return;
        }
        if !self.collapsed.remove(&row) {
            self.collapsed.insert(row);
        }
        // Collapsing can shrink the visible list past the selection
        self.selected = self.selected.min(self.visible().len().saturating_sub(1));
    }
}

/// Push `node` and its subtree as rows, depth-first.
fn flatten(node: &TreeNode, depth: usize, rows: &mut Vec<TreeRow>) {
    let index = rows.len();
    rows.push(TreeRow {
        depth,
        label: node.kind.clone(),
        is_attribute: false,
        descendants: 0,
    });

    for (key, value) in &node.attributes {
        rows.push(TreeRow {
            depth: depth + 1,
            label: format!("{}: {}", key, attribute_text(value)),
            is_attribute: true,
            descendants: 0,
        });
    }

    for child in &node.children {
        flatten(child, depth + 1, rows);
    }

    rows[index].descendants = rows.len() - index - 1;
}

fn attribute_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `#rrggbb`, with alpha appended only when not opaque.
pub fn color_hex(color: Color) -> String {
    if color.a == 255 {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    } else {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            color.r, color.g, color.b, color.a
        )
    }
}

/// Convert a display list into a labeled tree for the DisplayList tab.
pub fn display_list_tree(list: &[DrawCommand]) -> TreeNode {
    let children = list
        .iter()
        .map(|command| {
            let mut attributes = BTreeMap::new();
            match command {
                DrawCommand::Rect { bounds, fill } => {
                    attributes.insert(String::from("bounds"), rect_json(bounds));
                    attributes.insert(String::from("fill"), json!(color_hex(*fill)));
                }
                DrawCommand::Text {
                    content,
                    position,
                    color,
                    font,
                } => {
                    attributes.insert(String::from("content"), json!(content));
                    attributes.insert(
                        String::from("position"),
                        json!({"x": position.x, "y": position.y}),
                    );
                    attributes.insert(String::from("color"), json!(color_hex(*color)));
                    attributes.insert(String::from("font"), json!(font));
                }
                DrawCommand::Border {
                    bounds,
                    color,
                    widths,
                } => {
                    attributes.insert(String::from("bounds"), rect_json(bounds));
                    attributes.insert(String::from("color"), json!(color_hex(*color)));
                    attributes.insert(
                        String::from("widths"),
                        json!({
                            "top": widths.top,
                            "right": widths.right,
                            "bottom": widths.bottom,
                            "left": widths.left,
                        }),
                    );
                }
                DrawCommand::Unknown { .. } => {}
            }
            TreeNode {
                kind: command.kind().to_string(),
                attributes,
                children: Vec::new(),
            }
        })
        .collect();

    TreeNode {
        kind: String::from("display_list"),
        attributes: BTreeMap::new(),
        children,
    }
}

fn rect_json(rect: &crate::model::Rect) -> serde_json::Value {
    json!({
        "x": rect.x,
        "y": rect.y,
        "width": rect.width,
        "height": rect.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point, Rect};

    fn chain(depth: usize) -> TreeNode {
        // A single path of nodes: root -> child -> grandchild -> ...
        let mut node = TreeNode::leaf(format!("level{}", depth));
        for level in (0..depth).rev() {
            node = TreeNode {
                kind: format!("level{}", level),
                attributes: BTreeMap::new(),
                children: vec![node],
            };
        }
        node
    }

    #[test]
    fn nodes_past_the_default_depth_start_collapsed() {
        let view = TreeView::present(&chain(5), 2);

        // Rows 0 and 1 are expanded; row 2 is the first collapsed ancestor,
        // so levels 3..5 are hidden.
        let visible = view.visible();
        assert_eq!(visible, vec![0, 1, 2]);
        assert!(!view.is_collapsed(0));
        assert!(view.is_collapsed(2));
    }

    #[test]
    fn toggling_expands_one_level_at_a_time() {
        let mut view = TreeView::present(&chain(5), 2);
        view.selected = 2;
        view.toggle_selected();
        // Level 3 is now visible but itself still collapsed
        assert_eq!(view.visible(), vec![0, 1, 2, 3]);
        assert!(view.is_collapsed(3));

        view.toggle_selected();
        assert_eq!(view.visible(), vec![0, 1, 2]);
    }

    #[test]
    fn attributes_flatten_as_leaf_rows_in_sorted_order() {
        let mut attributes = BTreeMap::new();
        attributes.insert(String::from("tag"), json!("div"));
        attributes.insert(String::from("class"), json!("a"));
        let node = TreeNode {
            kind: String::from("element"),
            attributes,
            children: Vec::new(),
        };

        let view = TreeView::present(&node, 4);
        assert_eq!(view.row(1).label, "class: a");
        assert_eq!(view.row(2).label, "tag: div");
        assert!(view.row(1).is_attribute);
        assert_eq!(view.row(0).descendants, 2);
    }

    #[test]
    fn display_list_tree_keeps_command_order() {
        let list = vec![
            DrawCommand::Rect {
                bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
                fill: Color::rgb(255, 0, 0),
            },
            DrawCommand::Text {
                content: String::from("My Text"),
                position: Point { x: 1.0, y: 2.0 },
                color: Color::rgb(255, 255, 255),
                font: String::from("10px serif"),
            },
        ];

        let tree = display_list_tree(&list);
        assert_eq!(tree.kind, "display_list");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].kind, "rect");
        assert_eq!(
            tree.children[0].attributes.get("fill"),
            Some(&json!("#ff0000"))
        );
        assert_eq!(tree.children[1].kind, "text");
    }

    #[test]
    fn color_hex_includes_alpha_only_when_translucent() {
        assert_eq!(color_hex(Color::rgb(255, 0, 0)), "#ff0000");
        assert_eq!(color_hex(Color::rgba(0, 0, 0, 128)), "#00000080");
    }
}
