//! Slot-backed store
//!
//! Items and logs each live in one slot as a JSON array. Every read decodes the
//! whole collection and every write re-encodes it. There is no locking: two
//! processes sharing a data directory can lose each other's updates.

use super::slots::SlotStorage;
use super::{builtin_kind_definitions, PracticeStore, ITEMS_KEY, LAST_ITEM_KEY, LOGS_KEY};
use crate::error::Result;
use crate::kinds::KindDefinition;
use crate::model::{sort_logs_desc, LogFilter, PracticeItem, PracticeLog};
use std::collections::HashSet;

pub struct LocalStore<S: SlotStorage> {
    slots: S,
}

impl<S: SlotStorage> LocalStore<S> {
    pub fn new(slots: S) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &S {
        &self.slots
    }

    fn read_items(&self) -> Result<Vec<PracticeItem>> {
        match self.slots.get(ITEMS_KEY)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    fn write_items(&mut self, items: &[PracticeItem]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.slots.set(ITEMS_KEY, &raw)
    }

    /// Logs in stored (insertion) order
    fn read_logs(&self) -> Result<Vec<PracticeLog>> {
        match self.slots.get(LOGS_KEY)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    fn write_logs(&mut self, logs: &[PracticeLog]) -> Result<()> {
        let raw = serde_json::to_string(logs)?;
        self.slots.set(LOGS_KEY, &raw)
    }
}

impl<S: SlotStorage> PracticeStore for LocalStore<S> {
    fn init(&mut self) -> Result<()> {
        // Absent and empty are different: never overwrite an existing slot
        for key in [ITEMS_KEY, LOGS_KEY] {
            if !self.slots.contains(key)? {
                log::debug!("Creating empty slot {}", key);
                self.slots.set(key, "[]")?;
            }
        }
        Ok(())
    }

    fn kind_definitions(&self) -> Result<&'static [&'static KindDefinition]> {
        Ok(builtin_kind_definitions())
    }

    fn list_items(&self) -> Result<Vec<PracticeItem>> {
        self.read_items()
    }

    fn upsert_item(&mut self, item: PracticeItem) -> Result<PracticeItem> {
        let mut items = self.read_items()?;
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        self.write_items(&items)?;
        Ok(item)
    }

    fn delete_item(&mut self, id: &str) -> Result<()> {
        let mut items = self.read_items()?;
        items.retain(|i| i.id != id);
        self.write_items(&items)?;

        // Cascade. Not atomic with the item write above.
        let mut logs = self.read_logs()?;
        let before = logs.len();
        logs.retain(|l| l.item_id != id);
        if logs.len() != before {
            log::debug!("Deleted {} log(s) of item {}", before - logs.len(), id);
        }
        self.write_logs(&logs)
    }

    fn list_logs(&self, filter: &LogFilter) -> Result<Vec<PracticeLog>> {
        let mut logs: Vec<PracticeLog> = self
            .read_logs()?
            .into_iter()
            .filter(|l| filter.matches(l))
            .collect();

        if let Some(kind) = filter.kind {
            // In-memory join against the item collection
            let item_ids: HashSet<String> = self
                .read_items()?
                .into_iter()
                .filter(|i| i.kind() == kind)
                .map(|i| i.id)
                .collect();
            logs.retain(|l| item_ids.contains(&l.item_id));
        }

        sort_logs_desc(&mut logs);
        Ok(logs)
    }

    fn add_log(&mut self, log: PracticeLog) -> Result<PracticeLog> {
        let mut logs = self.read_logs()?;
        logs.push(log.clone());
        self.write_logs(&logs)?;
        Ok(log)
    }

    fn delete_log(&mut self, id: &str) -> Result<()> {
        let mut logs = self.read_logs()?;
        logs.retain(|l| l.id != id);
        self.write_logs(&logs)
    }

    fn last_item_id(&self) -> Result<Option<String>> {
        Ok(self.slots.get(LAST_ITEM_KEY)?.filter(|id| !id.is_empty()))
    }

    fn set_last_item_id(&mut self, id: &str) -> Result<()> {
        self.slots.set(LAST_ITEM_KEY, id)
    }
}
