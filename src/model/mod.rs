//! Board state model
//!
//! Serializable shapes for boards, elements, connections and viewport. The
//! JSON produced here is the persisted format; there is no version field.

pub mod board;
pub mod connection;
mod coord;
pub mod element;
pub mod ids;

pub use board::{Board, Viewport};
pub use connection::{Connection, ConnectionKind};
pub use element::{Element, ElementContent, ElementKind, ElementMetadata, Position, Size};
pub use ids::{ConnectionId, ElementId, IdGenerator};
