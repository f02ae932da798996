//! `sessionStorage` backend for the boundary cache (browser only).

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, Storage};

use crate::cache::{KeyValueStore, StorageError};

/// Legacy `DOMException` code for quota errors.
const QUOTA_EXCEEDED_CODE: u16 = 22;

/// The window's `sessionStorage`.
pub struct SessionStorage {
    storage: Storage,
}

impl SessionStorage {
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("No window object available".to_string()))?;
        let storage = window
            .session_storage()
            .map_err(unavailable)?
            .ok_or_else(|| StorageError::Unavailable("sessionStorage not available".to_string()))?;
        Ok(Self { storage })
    }
}

fn unavailable(e: JsValue) -> StorageError {
    StorageError::Unavailable(format!("{:?}", e))
}

fn write_error(e: JsValue) -> StorageError {
    match e.dyn_ref::<DomException>() {
        Some(ex) if ex.name() == "QuotaExceededError" || ex.code() == QUOTA_EXCEEDED_CODE => {
            StorageError::QuotaExceeded
        }
        _ => unavailable(e),
    }
}

impl KeyValueStore for SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(unavailable)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(key, value).map_err(write_error)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key).map_err(unavailable)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let len = self.storage.length().map_err(unavailable)?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Some(key) = self.storage.key(i).map_err(unavailable)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
