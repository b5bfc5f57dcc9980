//! Binding a store to storage
//!
//! `initialize` loads a board (or builds a default one), publishes it and
//! subscribes save-on-change. `cleanup` drops that subscription. The
//! binding lives in the store's `Lifecycle` field, so a store can never hold
//! more than one autosave subscription.

use std::fmt;

use crate::error::{LifecycleError, StorageError};
use crate::storage::Loaded;
use crate::store::{BoardStore, Selection, Subscription};

pub(crate) enum Lifecycle {
    Unbound,
    Bound {
        board_id: String,
        _autosave: Subscription,
    },
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Unbound => f.write_str("Unbound"),
            Lifecycle::Bound { board_id, .. } => {
                f.debug_struct("Bound").field("board_id", board_id).finish()
            }
        }
    }
}

/// How `initialize` obtained the published board
#[derive(Debug)]
pub enum LoadStatus {
    /// Read back from storage
    Restored,
    /// Nothing stored; started from an empty board
    Created,
    /// Load failed; the store holds no board, autosave is still bound
    Failed(StorageError),
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Restored => "restored",
            LoadStatus::Created => "created",
            LoadStatus::Failed(_) => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadStatus::Failed(_))
    }
}

impl BoardStore {
    /// Load `board_id` into the store and start autosaving it
    ///
    /// Re-initializing (same or different board) replaces the previous
    /// binding. The autosave callback fires once immediately, so the loaded
    /// board is written back right away.
    pub fn initialize(&mut self, board_id: &str) -> Result<LoadStatus, LifecycleError> {
        if board_id.is_empty() {
            log::warn!("initializeBoardStore: boardId is required");
            return Err(LifecycleError::MissingBoardId);
        }

        if self.cleanup() {
            log::debug!("Rebinding board store to `{board_id}`");
        }

        let (initial, status) = match self.storage.load(board_id) {
            Ok(Loaded::Stored(board)) => (Some(board), LoadStatus::Restored),
            Ok(Loaded::Fresh(board)) => (Some(board), LoadStatus::Created),
            Err(err) => (None, LoadStatus::Failed(err)),
        };
        self.selection.set(Selection::new());
        self.board.set(initial);

        let storage = self.storage.clone();
        let autosave = self.board.subscribe(move |state| {
            if let Some(board) = state {
                // Failures are logged by the adapter
                let _ = storage.persist(board);
            }
        });

        self.lifecycle = Lifecycle::Bound {
            board_id: board_id.to_string(),
            _autosave: autosave,
        };
        log::info!("Board store bound to `{board_id}` ({status:?})");
        Ok(status)
    }

    /// Stop autosaving. Returns `false` if nothing was bound.
    pub fn cleanup(&mut self) -> bool {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Unbound) {
            Lifecycle::Bound { board_id, .. } => {
                log::debug!("Board store unbound from `{board_id}`");
                true
            }
            Lifecycle::Unbound => false,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Bound { .. })
    }

    pub fn bound_board_id(&self) -> Option<&str> {
        match &self.lifecycle {
            Lifecycle::Bound { board_id, .. } => Some(board_id),
            Lifecycle::Unbound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SteppingClock;
    use crate::model::{Board, Element, ElementKind, Position, Viewport};
    use crate::storage::{BoardStorage, KeyValueStore, MemoryStorage};
    use std::rc::Rc;

    fn store_over(memory: &MemoryStorage) -> BoardStore {
        let storage = BoardStorage::new(Rc::new(memory.clone()), Rc::new(SteppingClock::millis()));
        BoardStore::new(storage)
    }

    fn note(store: &BoardStore, id: &str) -> Element {
        Element::new(id.into(), ElementKind::Note, Position::new(0.0, 0.0), store.storage().now())
            .with_title("Note")
    }

    #[test]
    fn test_cleanup_before_initialize_is_noop() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        assert!(!store.cleanup());
        assert!(!store.is_bound());
        assert_eq!(memory.write_count(), 0);
    }

    #[test]
    fn test_empty_board_id_rejected() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        assert_eq!(store.initialize("").unwrap_err(), LifecycleError::MissingBoardId);
        assert!(!store.is_bound());
        assert!(store.board().get().is_none());
        assert_eq!(memory.write_count(), 0);
    }

    #[test]
    fn test_initialize_creates_and_saves_default_board() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);

        let status = store.initialize("day-1").unwrap();
        assert!(matches!(status, LoadStatus::Created));
        assert_eq!(store.bound_board_id(), Some("day-1"));

        let board = store.board().get().unwrap();
        assert_eq!(board.id(), "day-1");
        assert!(board.elements.is_empty());
        // Subscribing writes the freshly loaded board once
        assert_eq!(memory.write_count(), 1);
        assert!(memory.get_item("board_day-1").unwrap().is_some());
    }

    #[test]
    fn test_each_mutation_saves_once() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        store.initialize("day-1").unwrap();

        let before = memory.write_count();
        store.add_element(note(&store, "el_1"));
        assert_eq!(memory.write_count(), before + 1);
        store.add_element(note(&store, "el_2"));
        assert_eq!(memory.write_count(), before + 2);
    }

    #[test]
    fn test_double_initialize_keeps_one_subscription() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        store.initialize("day-1").unwrap();
        store.initialize("day-1").unwrap();

        let before = memory.write_count();
        store.add_element(note(&store, "el_1"));
        assert_eq!(memory.write_count(), before + 1);
    }

    #[test]
    fn test_rebinding_to_other_board_stops_old_autosave() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        store.initialize("day-1").unwrap();
        store.initialize("day-2").unwrap();
        store.add_element(note(&store, "el_1"));

        let day1: Board =
            serde_json::from_str(&memory.get_item("board_day-1").unwrap().unwrap()).unwrap();
        let day2: Board =
            serde_json::from_str(&memory.get_item("board_day-2").unwrap().unwrap()).unwrap();
        assert!(day1.elements.is_empty());
        assert_eq!(day2.elements.len(), 1);
    }

    #[test]
    fn test_cleanup_stops_saving() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        store.initialize("day-1").unwrap();
        assert!(store.cleanup());
        assert!(!store.cleanup());

        let before = memory.write_count();
        assert!(store.add_element(note(&store, "el_1")));
        assert_eq!(memory.write_count(), before);
        // In-memory state still moves
        assert_eq!(store.board().get().unwrap().elements.len(), 1);
    }

    #[test]
    fn test_dropping_store_unbinds() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        store.initialize("day-1").unwrap();
        let board = store.board();
        drop(store);
        assert_eq!(board.subscriber_count(), 0);
    }

    #[test]
    fn test_corrupt_board_publishes_none_and_never_overwrites() {
        let memory = MemoryStorage::new();
        memory.set_item("board_day-1", "{not json").unwrap();
        let mut store = store_over(&memory);

        let status = store.initialize("day-1").unwrap();
        assert!(matches!(
            status,
            LoadStatus::Failed(StorageError::Corrupt { .. })
        ));
        assert!(store.is_bound());
        assert!(store.board().get().is_none());

        assert!(!store.add_element(note(&store, "el_1")));
        assert_eq!(
            memory.get_item("board_day-1").unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_unavailable_storage_still_works_in_memory() {
        let storage = BoardStorage::unavailable(Rc::new(SteppingClock::millis()));
        let mut store = BoardStore::new(storage);
        let status = store.initialize("day-1").unwrap();
        assert!(matches!(status, LoadStatus::Failed(ref err) if err.is_unavailable()));
        assert!(store.board().get().is_none());
    }

    #[test]
    fn test_initialize_clears_selection() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        store.initialize("day-1").unwrap();
        store.select("el_1".into());
        store.initialize("day-2").unwrap();
        assert!(store.selection().get().is_empty());
    }

    #[test]
    fn test_added_element_survives_reload() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        store.initialize("day-1").unwrap();
        store.add_element(note(&store, "el_1"));
        drop(store);

        // Fresh adapter over the same storage, as after a page reload
        let reloaded = BoardStorage::new(Rc::new(memory.clone()), Rc::new(SteppingClock::millis()))
            .load("day-1")
            .unwrap();
        assert!(!reloaded.is_fresh());
        let board = reloaded.into_board();
        assert_eq!(board.elements.len(), 1);
        assert_eq!(board.elements[0].id.as_str(), "el_1");
    }

    fn stored_board(memory: &MemoryStorage, key: &str) -> Board {
        serde_json::from_str(&memory.get_item(key).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_non_finite_viewport_does_not_break_reload() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        store.initialize("day-1").unwrap();
        store.add_element(note(&store, "el_1"));
        store.set_viewport(Viewport { x: f64::NAN, y: 5.0, zoom: 1.0 });
        store.update_board(|board| board.viewport.zoom = f64::INFINITY);

        let status = store.initialize("day-1").unwrap();
        assert!(matches!(status, LoadStatus::Restored));
        let board = store.board().get().unwrap();
        assert_eq!(board.elements.len(), 1);
        assert_eq!(board.viewport, Viewport { x: 0.0, y: 5.0, zoom: 1.0 });
    }

    #[test]
    fn test_null_coordinates_from_browser_restore() {
        let memory = MemoryStorage::new();
        let mut board = Board::new("day-1", crate::clock::Timestamp::EPOCH);
        board.viewport.x = f64::NAN;
        memory
            .set_item("board_day-1", &serde_json::to_string(&board).unwrap())
            .unwrap();

        let mut store = store_over(&memory);
        assert!(matches!(store.initialize("day-1").unwrap(), LoadStatus::Restored));
        assert_eq!(store.viewport().get(), Viewport::default());
        // The repaired board is what autosave wrote back
        assert_eq!(stored_board(&memory, "board_day-1").viewport.x, 0.0);
    }

    #[test]
    fn test_persisted_stamp_is_not_older_than_memory() {
        let memory = MemoryStorage::new();
        let mut store = store_over(&memory);
        store.initialize("day-1").unwrap();
        store.add_element(note(&store, "el_1"));

        let in_memory = store.board().get().unwrap().last_modified;
        let persisted = stored_board(&memory, "board_day-1").last_modified;
        assert!(persisted >= in_memory);
    }
}
