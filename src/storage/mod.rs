//! Storage adapter
//!
//! Maps board ids to keys (`board_<id>`) and moves boards in and out of a
//! string key-value store as JSON. Backends:
//! - `LocalStorage`: browser `window.localStorage` (wasm32 only)
//! - `MemoryStorage`: in-process map, used by tests and headless runs
//! - `FileStorage`: single JSON file (native only)
//!
//! Failures are logged here and returned; callers are free to ignore them.

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local;
pub mod memory;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;

use std::fmt;
use std::rc::Rc;

use crate::clock::{Clock, Timestamp};
use crate::error::StorageError;
use crate::model::Board;

/// Key prefix for persisted boards
pub const DEFAULT_KEY_PREFIX: &str = "board_";

/// Storage key for a board id. Any string, including empty, is accepted.
pub fn derive_key(board_id: &str) -> String {
    format!("{DEFAULT_KEY_PREFIX}{board_id}")
}

/// A synchronous string key-value store
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Result of a successful load
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    /// Board read back from storage
    Stored(Board),
    /// Nothing stored yet; a default board was built
    Fresh(Board),
}

impl Loaded {
    pub fn board(&self) -> &Board {
        match self {
            Loaded::Stored(board) | Loaded::Fresh(board) => board,
        }
    }

    pub fn into_board(self) -> Board {
        match self {
            Loaded::Stored(board) | Loaded::Fresh(board) => board,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Loaded::Fresh(_))
    }
}

/// Board-level persistence over an optional backend
#[derive(Clone)]
pub struct BoardStorage {
    backend: Option<Rc<dyn KeyValueStore>>,
    clock: Rc<dyn Clock>,
    key_prefix: String,
}

impl BoardStorage {
    pub fn new(backend: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        Self {
            backend: Some(backend),
            clock,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Storage that is never available (non-browser contexts)
    pub fn unavailable(clock: Rc<dyn Clock>) -> Self {
        Self {
            backend: None,
            clock,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Browser local storage when present, unavailable otherwise
    #[cfg(target_arch = "wasm32")]
    pub fn browser(clock: Rc<dyn Clock>) -> Self {
        match LocalStorage::open() {
            Some(local) => Self::new(Rc::new(local), clock),
            None => {
                log::info!("LocalStorage not available, boards will not persist");
                Self::unavailable(clock)
            }
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn browser(clock: Rc<dyn Clock>) -> Self {
        Self::unavailable(clock)
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn key_for(&self, board_id: &str) -> String {
        format!("{}{board_id}", self.key_prefix)
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Load the board stored for `board_id`, or build a default one
    ///
    /// A corrupt entry is an error, never silently replaced by a default.
    pub fn load(&self, board_id: &str) -> Result<Loaded, StorageError> {
        let backend = self.backend.as_ref().ok_or(StorageError::Unavailable)?;
        let key = self.key_for(board_id);

        let stored = backend.get_item(&key).inspect_err(|err| {
            log::error!("Error loading board state `{key}`: {err}");
        })?;

        let Some(json) = stored else {
            log::info!("No stored board `{board_id}`, starting empty");
            return Ok(Loaded::Fresh(Board::new(board_id, self.clock.now())));
        };

        match serde_json::from_str::<Board>(&json) {
            Ok(mut board) => {
                let repaired = board.repair_coordinates();
                if repaired > 0 {
                    log::warn!("Reset {repaired} non-finite coordinate(s) in `{key}`");
                }
                if board.id() != board_id {
                    log::warn!(
                        "Board stored under `{key}` has id `{}`; later saves use that id",
                        board.id()
                    );
                }
                log::info!(
                    "Loaded board `{board_id}` ({} elements, {} connections)",
                    board.elements.len(),
                    board.connections.len()
                );
                Ok(Loaded::Stored(board))
            }
            Err(source) => {
                let err = StorageError::Corrupt { key, source };
                log::error!("Error loading board state: {err}");
                Err(err)
            }
        }
    }

    /// Stamp `board.last_modified` with the current time, then write it
    ///
    /// The stamp is applied to the caller's value. Nothing happens when
    /// storage is unavailable.
    pub fn save(&self, board: &mut Board) -> Result<(), StorageError> {
        let backend = self.backend.as_ref().ok_or(StorageError::Unavailable)?;
        board.last_modified = self.clock.now();
        self.write(backend.as_ref(), board)
    }

    /// Write a freshly stamped copy of `board`, leaving the original as is
    ///
    /// Returns the timestamp that was written.
    pub fn persist(&self, board: &Board) -> Result<Timestamp, StorageError> {
        let backend = self.backend.as_ref().ok_or(StorageError::Unavailable)?;
        let mut snapshot = board.clone();
        snapshot.last_modified = self.clock.now();
        self.write(backend.as_ref(), &snapshot)?;
        Ok(snapshot.last_modified)
    }

    /// Forget the stored board for `board_id`
    pub fn remove(&self, board_id: &str) -> Result<(), StorageError> {
        let backend = self.backend.as_ref().ok_or(StorageError::Unavailable)?;
        let key = self.key_for(board_id);
        backend.remove_item(&key).inspect_err(|err| {
            log::error!("Error removing board state `{key}`: {err}");
        })
    }

    fn write(&self, backend: &dyn KeyValueStore, board: &Board) -> Result<(), StorageError> {
        let key = self.key_for(board.id());
        let json = serde_json::to_string(board)
            .map_err(|source| StorageError::Serialize {
                board_id: board.id().to_string(),
                source,
            })
            .inspect_err(|err| log::error!("Error saving board state: {err}"))?;

        backend.set_item(&key, &json).inspect_err(|err| {
            log::error!("Error saving board state `{key}`: {err}");
        })?;
        log::debug!("Board `{}` saved ({} bytes)", board.id(), json.len());
        Ok(())
    }
}

impl fmt::Debug for BoardStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardStorage")
            .field("available", &self.is_available())
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}
