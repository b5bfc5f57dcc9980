//! Dia Board - reactive board state with automatic local persistence
//!
//! Core modules:
//! - `model`: Boards, elements, connections and viewport (the persisted shape)
//! - `storage`: Key derivation and load/save against a key-value store
//! - `store`: Reactive board/selection/viewport container
//! - `lifecycle`: Initialize/cleanup of the autosave binding
//! - `wasm`: Browser bindings (wasm32 only)

pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod storage;
pub mod store;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use clock::{Clock, SteppingClock, SystemClock, Timestamp};
pub use config::Config;
pub use error::{ConfigError, LifecycleError, StorageError, UnknownElementKind};
pub use lifecycle::LoadStatus;
pub use model::{
    Board, Connection, ConnectionId, ConnectionKind, Element, ElementId, ElementKind, Viewport,
};
pub use storage::{BoardStorage, KeyValueStore, Loaded, MemoryStorage, derive_key};
pub use store::{BoardStore, Readable, Selection, Subscription, Update, Writable};
