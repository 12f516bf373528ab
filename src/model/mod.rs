//! Data model shared between the pipeline, the rasterizer, and the views.
//!
//! Everything here mirrors the renderer's wire format: one [`RenderResult`]
//! per successful invocation, holding the three intermediate trees and the
//! ordered display list. A `RenderResult` is immutable once produced and is
//! only ever superseded wholesale by the next successful invocation — views
//! must never mix fields from two different invocations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The user-edited input to the pipeline: markup plus stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePair {
    pub markup: String,
    pub stylesheet: String,
}

impl SourcePair {
    pub fn new(markup: impl Into<String>, stylesheet: impl Into<String>) -> Self {
        SourcePair {
            markup: markup.into(),
            stylesheet: stylesheet.into(),
        }
    }
}

/// An RGBA color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }
}

/// An axis-aligned rectangle in the engine's flat coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

/// A point in the engine's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Per-edge widths, used by border commands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// A labeled tree as the engine reports it: document tree, style tree, or
/// layout tree. Attribute values are whatever JSON the engine attached;
/// `BTreeMap` keeps them in a stable alphabetical order for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub kind: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A node with no attributes and no children.
    pub fn leaf(kind: impl Into<String>) -> Self {
        TreeNode {
            kind: kind.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }
}

/// One primitive drawing operation. Sequence order is semantically
/// meaningful: command *i+1* composites strictly on top of command *i*
/// (painter's algorithm).
///
/// Wire commands with a tag this build does not know decode to
/// [`DrawCommand::Unknown`] so that the rasterizer, not the codec, rejects
/// the render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        bounds: Rect,
        fill: Color,
    },
    Text {
        content: String,
        position: Point,
        color: Color,
        font: String,
    },
    Border {
        bounds: Rect,
        color: Color,
        widths: Edges,
    },
    Unknown {
        kind: String,
    },
}

impl DrawCommand {
    /// The wire tag of this command.
    pub fn kind(&self) -> &str {
        match self {
            DrawCommand::Rect { .. } => "rect",
            DrawCommand::Text { .. } => "text",
            DrawCommand::Border { .. } => "border",
            DrawCommand::Unknown { kind } => kind,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum KnownCommand {
    Rect {
        bounds: Rect,
        fill: Color,
    },
    Text {
        content: String,
        position: Point,
        color: Color,
        #[serde(default = "default_font")]
        font: String,
    },
    Border {
        bounds: Rect,
        color: Color,
        widths: Edges,
    },
}

fn default_font() -> String {
    String::from("10px serif")
}

impl<'de> Deserialize<'de> for DrawCommand {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .map(str::to_string)
            .ok_or_else(|| D::Error::custom("draw command without a `kind` tag"))?;

        match kind.as_str() {
            "rect" | "text" | "border" => {
                let known: KnownCommand =
                    serde_json::from_value(value).map_err(D::Error::custom)?;
                Ok(match known {
                    KnownCommand::Rect { bounds, fill } => DrawCommand::Rect { bounds, fill },
                    KnownCommand::Text {
                        content,
                        position,
                        color,
                        font,
                    } => DrawCommand::Text {
                        content,
                        position,
                        color,
                        font,
                    },
                    KnownCommand::Border {
                        bounds,
                        color,
                        widths,
                    } => DrawCommand::Border {
                        bounds,
                        color,
                        widths,
                    },
                })
            }
            _ => Ok(DrawCommand::Unknown { kind }),
        }
    }
}

/// The atomic output of one pipeline invocation.
///
/// Invariant: all four fields originate from the same invocation. The
/// invoker never patches a field in place; a newer result replaces the
/// older one wholesale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderResult {
    pub dom: TreeNode,
    pub style: TreeNode,
    pub layout: TreeNode,
    pub display_list: Vec<DrawCommand>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_draw_commands() {
        let json = r#"[
            {"kind": "rect",
             "bounds": {"x": 0.0, "y": 0.0, "width": 10.0, "height": 5.0},
             "fill": {"r": 255, "g": 0, "b": 0}},
            {"kind": "text",
             "content": "My Text",
             "position": {"x": 2.0, "y": 1.0},
             "color": {"r": 255, "g": 255, "b": 255, "a": 255},
             "font": "10px serif"}
        ]"#;

        let list: Vec<DrawCommand> = serde_json::from_str(json).expect("decode failed");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].kind(), "rect");
        match &list[0] {
            DrawCommand::Rect { fill, .. } => assert_eq!(*fill, Color::rgb(255, 0, 0)),
            other => panic!("expected rect, got {:?}", other),
        }
        match &list[1] {
            DrawCommand::Text { content, color, .. } => {
                assert_eq!(content, "My Text");
                assert_eq!(*color, Color::rgb(255, 255, 255));
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn unknown_tag_decodes_to_unknown_variant() {
        let json = r#"{"kind": "radial_gradient", "stops": []}"#;
        let cmd: DrawCommand = serde_json::from_str(json).expect("decode failed");
        assert_eq!(
            cmd,
            DrawCommand::Unknown {
                kind: String::from("radial_gradient")
            }
        );
    }

    #[test]
    fn missing_kind_is_a_decode_error() {
        let json = r#"{"bounds": {"x": 0, "y": 0, "width": 1, "height": 1}}"#;
        assert!(serde_json::from_str::<DrawCommand>(json).is_err());
    }

    #[test]
    fn tree_nodes_default_missing_fields() {
        let json = r#"{"kind": "text: My Text"}"#;
        let node: TreeNode = serde_json::from_str(json).expect("decode failed");
        assert!(node.attributes.is_empty());
        assert!(node.children.is_empty());
    }

    #[test]
    fn render_result_decodes_from_wire_shape() {
        let json = r#"{
            "dom": {"kind": "html", "children": [{"kind": "div"}]},
            "style": {"kind": "html", "attributes": {"display": "block"}},
            "layout": {"kind": "block"},
            "display_list": [
                {"kind": "rect",
                 "bounds": {"x": 0, "y": 0, "width": 800, "height": 600},
                 "fill": {"r": 0, "g": 128, "b": 0}}
            ]
        }"#;

        let result: RenderResult = serde_json::from_str(json).expect("decode failed");
        assert_eq!(result.dom.children.len(), 1);
        assert_eq!(
            result.style.attributes.get("display"),
            Some(&serde_json::Value::String(String::from("block")))
        );
        assert_eq!(result.display_list.len(), 1);
    }
}
