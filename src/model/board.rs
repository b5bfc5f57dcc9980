//! The root persisted aggregate
//!
//! A `Board` is what lands in storage under `board_<id>`. Its `id` is fixed
//! at construction; everything else is freely mutable by the store.

use serde::{Deserialize, Serialize};

use super::connection::Connection;
use super::coord;
use super::element::Element;
use super::ids::ElementId;
use crate::clock::Timestamp;

/// Pan/zoom of the visible canvas area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    #[serde(deserialize_with = "coord::nullable")]
    pub x: f64,
    #[serde(deserialize_with = "coord::nullable")]
    pub y: f64,
    #[serde(deserialize_with = "coord::nullable")]
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// This viewport with any non-finite component taken from `fallback`
    pub fn or_finite(self, fallback: Viewport) -> Viewport {
        Viewport {
            x: coord::finite_or(self.x, fallback.x),
            y: coord::finite_or(self.y, fallback.y),
            zoom: coord::finite_or(self.zoom, fallback.zoom),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    id: String,
    /// Insertion order; only a tiebreak for `z_index`
    pub elements: Vec<Element>,
    pub connections: Vec<Connection>,
    pub viewport: Viewport,
    /// Rewritten on every save
    pub last_modified: Timestamp,
}

impl Board {
    /// Empty board with the default viewport
    pub fn new(id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            elements: Vec::new(),
            connections: Vec::new(),
            viewport: Viewport::default(),
            last_modified: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn contains_element(&self, id: &ElementId) -> bool {
        self.element(id).is_some()
    }

    /// Highest z-index in use
    pub fn top_z_index(&self) -> Option<i32> {
        self.elements.iter().map(|e| e.z_index).max()
    }

    /// Elements in draw order (bottom first), ties broken by insertion order
    pub fn elements_by_z(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }

    /// Reset NaN and infinite coordinates on the viewport and every element
    /// to their defaults. Returns how many values were reset.
    pub fn repair_coordinates(&mut self) -> usize {
        let default = Viewport::default();
        let mut repaired = coord::reset(&mut self.viewport.x, default.x)
            + coord::reset(&mut self.viewport.y, default.y)
            + coord::reset(&mut self.viewport.zoom, default.zoom);
        for element in &mut self.elements {
            repaired += element.repair_coordinates();
        }
        repaired
    }

    /// Connections with an endpoint that names no element on this board
    pub fn dangling_connections(&self) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| !self.contains_element(&c.from) || !self.contains_element(&c.to))
            .collect()
    }
}
