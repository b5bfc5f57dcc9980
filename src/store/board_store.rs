//! The board store: current board, selection and viewport
//!
//! One `BoardStore` per board session, passed by reference to whatever
//! renders or edits the board. The board cell is the single source of
//! truth; the viewport cell is a projection of `board.viewport` kept in
//! sync by an internal subscription. Selection lives only in memory.

use std::cell::RefCell;
use std::collections::BTreeSet;

use time::Duration;

use super::writable::{Readable, Subscription, Update, Writable};
use crate::clock::Timestamp;
use crate::lifecycle::Lifecycle;
use crate::model::{Board, Connection, ConnectionId, Element, ElementId, IdGenerator, Viewport};
use crate::storage::BoardStorage;

/// Selected element ids
pub type Selection = BTreeSet<ElementId>;

pub struct BoardStore {
    pub(crate) board: Writable<Option<Board>>,
    pub(crate) selection: Writable<Selection>,
    viewport: Writable<Viewport>,
    pub(crate) storage: BoardStorage,
    ids: RefCell<IdGenerator>,
    pub(crate) lifecycle: Lifecycle,
    _viewport_sync: Subscription,
}

/// Advance `last_modified` to `now`, or one millisecond past its current
/// value if the clock has not moved on
fn touch(board: &mut Board, now: Timestamp) {
    board.last_modified = if now > board.last_modified {
        now
    } else {
        board
            .last_modified
            .checked_add(Duration::milliseconds(1))
            .unwrap_or(board.last_modified)
    };
}

impl BoardStore {
    pub fn new(storage: BoardStorage) -> Self {
        Self::with_id_generator(storage, IdGenerator::new())
    }

    pub fn with_id_generator(storage: BoardStorage, ids: IdGenerator) -> Self {
        let board: Writable<Option<Board>> = Writable::new(None);
        let viewport = Writable::new(Viewport::default());

        let projection = viewport.clone();
        let viewport_sync = board.subscribe(move |state: &Option<Board>| {
            let next = state.as_ref().map(|b| b.viewport).unwrap_or_default();
            projection.update_if(move |current| {
                if *current == next {
                    return false;
                }
                *current = next;
                true
            });
        });

        Self {
            board,
            selection: Writable::new(Selection::new()),
            viewport,
            storage,
            ids: RefCell::new(ids),
            lifecycle: Lifecycle::Unbound,
            _viewport_sync: viewport_sync,
        }
    }

    /// Current board, `None` before initialization or after a failed load
    pub fn board(&self) -> Readable<Option<Board>> {
        self.board.readable()
    }

    pub fn selection(&self) -> Readable<Selection> {
        self.selection.readable()
    }

    /// Mirror of the loaded board's viewport (default when no board)
    pub fn viewport(&self) -> Readable<Viewport> {
        self.viewport.readable()
    }

    pub fn storage(&self) -> &BoardStorage {
        &self.storage
    }

    /// Must not be called from inside an `update_board` edit
    pub fn has_board(&self) -> bool {
        self.board.with(Option::is_some)
    }

    /// Append `element` and refresh `last_modified`
    ///
    /// Mutations return `false` when nothing was published: no board is
    /// loaded, or the edit changed nothing. A mutation issued while the
    /// board cell is busy (from a subscriber or an edit closure) is queued
    /// and returns `true`; its outcome is only known once it runs.
    pub fn add_element(&self, element: Element) -> bool {
        self.modify("addElement", move |board| {
            board.elements.push(element);
            true
        })
    }

    pub fn add_connection(&self, connection: Connection) -> bool {
        self.modify("addConnection", move |board| {
            board.connections.push(connection);
            true
        })
    }

    /// Apply an arbitrary edit to the loaded board
    ///
    /// The board id survives any edit, including wholesale replacement.
    pub fn update_board(&self, edit: impl FnOnce(&mut Board) + 'static) -> bool {
        self.modify("updateBoard", move |board| {
            let id = board.id().to_string();
            edit(board);
            if board.id() != id {
                log::warn!("Board edit tried to change id `{id}` to `{}`; kept `{id}`", board.id());
                board.set_id(id);
            }
            true
        })
    }

    /// Pan/zoom the loaded board. The viewport cell follows.
    ///
    /// Non-finite components keep the board's current value.
    pub fn set_viewport(&self, viewport: Viewport) -> bool {
        self.modify("setViewport", move |board| {
            let next = viewport.or_finite(board.viewport);
            if board.viewport == next {
                return false;
            }
            board.viewport = next;
            true
        })
    }

    pub fn generate_element_id(&self) -> ElementId {
        let now = self.storage.now();
        self.ids.borrow_mut().element_id(now)
    }

    pub fn generate_connection_id(&self) -> ConnectionId {
        let now = self.storage.now();
        self.ids.borrow_mut().connection_id(now)
    }

    pub fn select(&self, id: ElementId) {
        self.selection.update_if(move |selected| selected.insert(id));
    }

    pub fn deselect(&self, id: ElementId) {
        self.selection.update_if(move |selected| selected.remove(&id));
    }

    pub fn toggle_selected(&self, id: ElementId) {
        self.selection.update(move |selected| {
            if !selected.remove(&id) {
                selected.insert(id);
            }
        });
    }

    pub fn set_selection(&self, ids: impl IntoIterator<Item = ElementId>) {
        let next: Selection = ids.into_iter().collect();
        self.selection.update_if(move |selected| {
            if *selected == next {
                return false;
            }
            *selected = next;
            true
        });
    }

    pub fn clear_selection(&self) {
        self.selection.update_if(|selected| {
            if selected.is_empty() {
                return false;
            }
            selected.clear();
            true
        });
    }

    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selection.with(|selected| selected.contains(id))
    }

    /// One board transition: edit, repair, touch, publish
    ///
    /// The loaded-board check runs inside the cell update, so it holds for
    /// queued mutations too.
    fn modify(&self, op: &'static str, edit: impl FnOnce(&mut Board) -> bool + 'static) -> bool {
        let now = self.storage.now();
        let outcome = self.board.update_if(move |state| {
            let Some(board) = state else {
                log::debug!("{op} ignored: no board loaded");
                return false;
            };
            if !edit(board) {
                return false;
            }
            let repaired = board.repair_coordinates();
            if repaired > 0 {
                log::warn!("{op}: reset {repaired} non-finite coordinate(s) on `{}`", board.id());
            }
            touch(board, now);
            true
        });
        outcome != Update::Unchanged
    }
}

impl std::fmt::Debug for BoardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardStore")
            .field("board", &self.board.with(|b| b.as_ref().map(|b| b.id().to_string())))
            .field("lifecycle", &self.lifecycle)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}
