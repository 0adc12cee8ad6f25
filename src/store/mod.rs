//! Persistence port
//!
//! [`PracticeStore`] is the storage contract the controller talks to. Two
//! backends implement it:
//!
//! - [`LocalStore`]: two JSON-array slots (items, logs) in a key-value slot
//!   storage. Every mutation rewrites the whole collection.
//! - [`SqliteStore`]: keyed upserts and deletes over SQLite via Diesel.
//!
//! Every method has a default body that fails with [`Error::NotImplemented`],
//! so a backend that forgets an operation fails loudly instead of silently
//! doing nothing.

pub mod local;
pub mod slots;
pub mod sqlite;

pub use local::LocalStore;
pub use slots::{FileSlots, MemorySlots, SlotStorage};
pub use sqlite::SqliteStore;

use crate::config::{Backend, Config};
use crate::error::{Error, Result};
use crate::kinds::{self, KindDefinition};
use crate::model::{LogFilter, PracticeItem, PracticeLog};
use std::path::{Path, PathBuf};

/// Slot holding the item collection
pub const ITEMS_KEY: &str = "practice_items";
/// Slot holding the log collection
pub const LOGS_KEY: &str = "practice_logs";
/// Scalar slot holding the last practiced item id
pub const LAST_ITEM_KEY: &str = "lastItemId";

pub trait PracticeStore {
    /// Prepare the backing storage. Safe to call more than once.
    fn init(&mut self) -> Result<()> {
        Err(Error::NotImplemented("init"))
    }

    fn kind_definitions(&self) -> Result<&'static [&'static KindDefinition]> {
        Err(Error::NotImplemented("kind_definitions"))
    }

    fn list_items(&self) -> Result<Vec<PracticeItem>> {
        Err(Error::NotImplemented("list_items"))
    }

    /// Insert, or replace the item with the same id
    fn upsert_item(&mut self, _item: PracticeItem) -> Result<PracticeItem> {
        Err(Error::NotImplemented("upsert_item"))
    }

    /// Remove an item and every log recorded against it. Missing ids are a no-op.
    fn delete_item(&mut self, _id: &str) -> Result<()> {
        Err(Error::NotImplemented("delete_item"))
    }

    /// Logs matching every given filter, most recent first
    fn list_logs(&self, _filter: &LogFilter) -> Result<Vec<PracticeLog>> {
        Err(Error::NotImplemented("list_logs"))
    }

    fn add_log(&mut self, _log: PracticeLog) -> Result<PracticeLog> {
        Err(Error::NotImplemented("add_log"))
    }

    fn delete_log(&mut self, _id: &str) -> Result<()> {
        Err(Error::NotImplemented("delete_log"))
    }

    fn last_item_id(&self) -> Result<Option<String>> {
        Err(Error::NotImplemented("last_item_id"))
    }

    fn set_last_item_id(&mut self, _id: &str) -> Result<()> {
        Err(Error::NotImplemented("set_last_item_id"))
    }

    /// Look up one item by id
    fn get_item(&self, id: &str) -> Result<Option<PracticeItem>> {
        Ok(self.list_items()?.into_iter().find(|i| i.id == id))
    }
}

impl<T: PracticeStore + ?Sized> PracticeStore for Box<T> {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn kind_definitions(&self) -> Result<&'static [&'static KindDefinition]> {
        (**self).kind_definitions()
    }

    fn list_items(&self) -> Result<Vec<PracticeItem>> {
        (**self).list_items()
    }

    fn upsert_item(&mut self, item: PracticeItem) -> Result<PracticeItem> {
        (**self).upsert_item(item)
    }

    fn delete_item(&mut self, id: &str) -> Result<()> {
        (**self).delete_item(id)
    }

    fn list_logs(&self, filter: &LogFilter) -> Result<Vec<PracticeLog>> {
        (**self).list_logs(filter)
    }

    fn add_log(&mut self, log: PracticeLog) -> Result<PracticeLog> {
        (**self).add_log(log)
    }

    fn delete_log(&mut self, id: &str) -> Result<()> {
        (**self).delete_log(id)
    }

    fn last_item_id(&self) -> Result<Option<String>> {
        (**self).last_item_id()
    }

    fn set_last_item_id(&mut self, id: &str) -> Result<()> {
        (**self).set_last_item_id(id)
    }

    fn get_item(&self, id: &str) -> Result<Option<PracticeItem>> {
        (**self).get_item(id)
    }
}

/// Registry shared by the built-in backends
pub(crate) fn builtin_kind_definitions() -> &'static [&'static KindDefinition] {
    kinds::all_definitions()
}

/// Walk up the directory tree to find a `.practice` folder (like git finds `.git`).
/// `PRACTICE_DATA_DIR` always wins.
pub fn data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("PRACTICE_DATA_DIR") {
        return PathBuf::from(path);
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let mut dir = current_dir.as_path();
        loop {
            let practice_dir = dir.join(".practice");
            if practice_dir.is_dir() {
                return practice_dir;
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
    }

    PathBuf::from(".practice")
}

/// Open the backend selected in the config, rooted at `dir`
pub fn open_store(config: &Config, dir: &Path) -> Result<Box<dyn PracticeStore>> {
    std::fs::create_dir_all(dir)?;
    let store: Box<dyn PracticeStore> = match config.storage.backend {
        Backend::Json => {
            log::debug!("Opening JSON slot store in {}", dir.display());
            Box::new(LocalStore::new(FileSlots::new(dir)))
        }
        Backend::Sqlite => {
            let path = dir.join("practice.db");
            log::debug!("Opening SQLite store at {}", path.display());
            Box::new(SqliteStore::open_at(&path)?)
        }
    };
    Ok(store)
}
