//! Directed, typed edges between elements

use serde::{Deserialize, Serialize};

use super::ids::{ConnectionId, ElementId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Related,
    Depends,
    Blocks,
}

/// Edge `from -> to`. Endpoints are not required to name existing elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: ElementId,
    pub to: ElementId,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Connection {
    pub fn new(id: ConnectionId, from: ElementId, to: ElementId, kind: ConnectionKind) -> Self {
        Self {
            id,
            from,
            to,
            kind,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn touches(&self, element: &ElementId) -> bool {
        &self.from == element || &self.to == element
    }
}
