//! Board store
//!
//! - `writable`: reactive cells and subscriptions
//! - `board_store`: the board/selection/viewport container and its mutations

pub mod board_store;
pub mod writable;

pub use board_store::{BoardStore, Selection};
pub use writable::{Readable, Subscription, Update, Writable};
