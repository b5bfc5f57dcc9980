//! Browser bindings
//!
//! `BoardHandle` wraps one `BoardStore` over `window.localStorage` for the
//! JS side. Values cross the boundary as JSON text; subscriber callbacks
//! receive the JSON of the new value (`"null"` when no board is loaded).

use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::logging;
use crate::model::{Connection, Element, ElementId, Viewport};
use crate::storage::BoardStorage;
use crate::store::{BoardStore, Readable, Subscription};

#[wasm_bindgen]
pub struct BoardHandle {
    store: BoardStore,
    subscriptions: HashMap<u32, Subscription>,
    next_handle: u32,
}

impl BoardHandle {
    fn from_config(config: Config) -> Self {
        match config.level_filter() {
            Ok(level) => logging::init(level),
            Err(err) => {
                logging::init(log::LevelFilter::Info);
                log::warn!("{err}; logging at info");
            }
        }
        let clock: Rc<dyn Clock> = Rc::new(SystemClock);
        let storage = BoardStorage::browser(clock).with_key_prefix(config.storage_key_prefix);
        Self {
            store: BoardStore::new(storage),
            subscriptions: HashMap::new(),
            next_handle: 1,
        }
    }

    fn register(&mut self, subscription: Subscription) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.subscriptions.insert(handle, subscription);
        handle
    }
}

/// Subscribe a JS function to a cell, passing each value as JSON text
fn subscribe_json<T: Serialize + 'static>(
    cell: &Readable<T>,
    name: &'static str,
    callback: js_sys::Function,
) -> Subscription {
    cell.subscribe(move |value: &T| {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                log::error!("Failed to encode {name} for subscriber: {err}");
                return;
            }
        };
        if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            log::error!("{name} subscriber threw: {err:?}");
        }
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsError> {
    Ok(serde_json::to_string(value)?)
}

impl Default for BoardHandle {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}

#[wasm_bindgen]
impl BoardHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> BoardHandle {
        Self::default()
    }

    /// Build a handle from a JSON config (`{"storageKeyPrefix": ..., "logLevel": ...}`)
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_json: &str) -> Result<BoardHandle, JsError> {
        Ok(Self::from_config(Config::from_json(config_json)?))
    }

    /// Returns `"restored"`, `"created"` or `"failed"`
    #[wasm_bindgen(js_name = initializeBoardStore)]
    pub fn initialize(&mut self, board_id: &str) -> Result<String, JsError> {
        let status = self.store.initialize(board_id)?;
        Ok(status.as_str().to_string())
    }

    #[wasm_bindgen(js_name = cleanupBoardStore)]
    pub fn cleanup(&mut self) -> bool {
        self.store.cleanup()
    }

    #[wasm_bindgen(js_name = isBound)]
    pub fn is_bound(&self) -> bool {
        self.store.is_bound()
    }

    #[wasm_bindgen(js_name = addElement)]
    pub fn add_element(&self, element_json: &str) -> Result<bool, JsError> {
        let element: Element = serde_json::from_str(element_json)?;
        Ok(self.store.add_element(element))
    }

    #[wasm_bindgen(js_name = addConnection)]
    pub fn add_connection(&self, connection_json: &str) -> Result<bool, JsError> {
        let connection: Connection = serde_json::from_str(connection_json)?;
        Ok(self.store.add_connection(connection))
    }

    #[wasm_bindgen(js_name = generateElementId)]
    pub fn generate_element_id(&self) -> String {
        self.store.generate_element_id().to_string()
    }

    #[wasm_bindgen(js_name = generateConnectionId)]
    pub fn generate_connection_id(&self) -> String {
        self.store.generate_connection_id().to_string()
    }

    /// Current board as JSON (`"null"` when none is loaded)
    #[wasm_bindgen(js_name = boardState)]
    pub fn board_state(&self) -> Result<String, JsError> {
        self.store.board().with(to_json)
    }

    #[wasm_bindgen(js_name = selectedElements)]
    pub fn selected_elements(&self) -> Result<String, JsError> {
        self.store.selection().with(to_json)
    }

    pub fn viewport(&self) -> Result<String, JsError> {
        self.store.viewport().with(to_json)
    }

    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(&self, x: f64, y: f64, zoom: f64) -> bool {
        self.store.set_viewport(Viewport { x, y, zoom })
    }

    #[wasm_bindgen(js_name = selectElement)]
    pub fn select_element(&self, id: &str) {
        self.store.select(ElementId::from(id));
    }

    #[wasm_bindgen(js_name = deselectElement)]
    pub fn deselect_element(&self, id: &str) {
        self.store.deselect(ElementId::from(id));
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) {
        self.store.clear_selection();
    }

    /// Returns a handle for `unsubscribe`
    #[wasm_bindgen(js_name = subscribeBoardState)]
    pub fn subscribe_board_state(&mut self, callback: js_sys::Function) -> u32 {
        let subscription = subscribe_json(&self.store.board(), "boardState", callback);
        self.register(subscription)
    }

    #[wasm_bindgen(js_name = subscribeSelectedElements)]
    pub fn subscribe_selected_elements(&mut self, callback: js_sys::Function) -> u32 {
        let subscription = subscribe_json(&self.store.selection(), "selectedElements", callback);
        self.register(subscription)
    }

    #[wasm_bindgen(js_name = subscribeViewport)]
    pub fn subscribe_viewport(&mut self, callback: js_sys::Function) -> u32 {
        let subscription = subscribe_json(&self.store.viewport(), "viewport", callback);
        self.register(subscription)
    }

    pub fn unsubscribe(&mut self, handle: u32) -> bool {
        self.subscriptions.remove(&handle).is_some()
    }
}
