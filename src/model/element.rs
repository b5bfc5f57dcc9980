//! Board elements: positioned, typed visual nodes

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::coord;
use super::ids::ElementId;
use crate::error::UnknownElementKind;
use crate::clock::Timestamp;

/// Element type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Note,
    Task,
    Session,
    Error,
    Custom,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Note => "note",
            ElementKind::Task => "task",
            ElementKind::Session => "session",
            ElementKind::Error => "error",
            ElementKind::Custom => "custom",
        }
    }
}

impl FromStr for ElementKind {
    type Err = UnknownElementKind;

    /// Case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "note" => Ok(ElementKind::Note),
            "task" => Ok(ElementKind::Task),
            "session" => Ok(ElementKind::Session),
            "error" => Ok(ElementKind::Error),
            "custom" => Ok(ElementKind::Custom),
            _ => Err(UnknownElementKind(s.to_string())),
        }
    }
}

/// Point in board coordinates (not viewport-transformed)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(deserialize_with = "coord::nullable")]
    pub x: f64,
    #[serde(deserialize_with = "coord::nullable")]
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    #[serde(deserialize_with = "coord::nullable")]
    pub width: f64,
    #[serde(deserialize_with = "coord::nullable")]
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 120.0,
        }
    }
}

/// What an element shows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Markdown text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Type-specific payload, shape left to the element's renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Caller-maintained bookkeeping; the store never touches these timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementMetadata {
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ElementMetadata {
    pub fn created(now: Timestamp) -> Self {
        Self {
            created_at: now,
            modified_at: now,
            tags: None,
            color: None,
        }
    }
}

/// A positioned visual node on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub position: Position,
    pub size: Size,
    #[serde(default)]
    pub content: ElementContent,
    pub metadata: ElementMetadata,
    /// Stacking order, higher draws on top. Not required to be unique.
    #[serde(default)]
    pub z_index: i32,
}

impl Element {
    /// New element with empty content at z-index 0
    pub fn new(id: ElementId, kind: ElementKind, position: Position, now: Timestamp) -> Self {
        Self {
            id,
            kind,
            position,
            size: Size::default(),
            content: ElementContent::default(),
            metadata: ElementMetadata::created(now),
            z_index: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.content.title = Some(title.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.content.body = Some(body.into());
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Reset non-finite position and size values. Returns how many were reset.
    pub fn repair_coordinates(&mut self) -> usize {
        let size = Size::default();
        coord::reset(&mut self.position.x, 0.0)
            + coord::reset(&mut self.position.y, 0.0)
            + coord::reset(&mut self.size.width, size.width)
            + coord::reset(&mut self.size.height, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn note() -> Element {
        Element::new(
            ElementId::from("el_1"),
            ElementKind::Note,
            Position::new(10.0, 20.0),
            Timestamp::parse("2024-05-01T09:30:00Z").unwrap(),
        )
        .with_title("Standup")
    }

    #[test]
    fn test_wire_names() {
        let value = serde_json::to_value(note().with_z_index(3)).unwrap();
        assert_eq!(value["type"], "note");
        assert_eq!(value["zIndex"], 3);
        assert_eq!(value["metadata"]["createdAt"], "2024-05-01T09:30:00Z");
        assert_eq!(value["content"]["title"], "Standup");
        // Absent optionals stay off the wire
        assert!(value["content"].get("body").is_none());
        assert!(value["metadata"].get("tags").is_none());
    }

    #[test]
    fn test_parse_browser_written_element() {
        let raw = json!({
            "id": "el_1715000000000_k3j2h1g0f",
            "type": "task",
            "position": { "x": 1.5, "y": -4 },
            "size": { "width": 240, "height": 80 },
            "content": { "body": "- [ ] ship", "data": { "done": false } },
            "metadata": {
                "createdAt": "2024-05-06T12:53:20.000Z",
                "modifiedAt": "2024-05-06T12:53:20.000Z",
                "tags": ["release"],
                "color": "#ffcc00"
            },
            "zIndex": 2
        });
        let el: Element = serde_json::from_value(raw).unwrap();
        assert_eq!(el.kind, ElementKind::Task);
        assert_eq!(el.position, Position::new(1.5, -4.0));
        assert_eq!(el.content.data, Some(json!({ "done": false })));
        assert_eq!(el.metadata.tags.as_deref(), Some(&["release".to_string()][..]));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = serde_json::from_value::<ElementKind>(json!("sticker"));
        assert!(result.is_err());
        assert_eq!("Session".parse::<ElementKind>().unwrap(), ElementKind::Session);
        let err = "sticker".parse::<ElementKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown element type `sticker`");
    }

    #[test]
    fn test_repair_resets_non_finite_geometry() {
        let mut el = note().with_size(Size::new(f64::NAN, 50.0));
        el.position.x = f64::INFINITY;
        assert_eq!(el.repair_coordinates(), 2);
        assert_eq!(el.position, Position::new(0.0, 20.0));
        assert_eq!(el.size, Size::new(200.0, 50.0));
    }
}
