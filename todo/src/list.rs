//! Local list state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use moss_types::{ItemId, ItemState, TodoItem};

use crate::error::TodoError;
use crate::merge::merge_lists;

/// List state shared between a session and the computations it launches.
pub type SharedList = Arc<Mutex<TodoList>>;

/// Lock `list`, recovering the state if a previous holder panicked.
pub(crate) fn lock(list: &SharedList) -> MutexGuard<'_, TodoList> {
    list.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The locally held items and the id of the database they sync with.
///
/// An empty `database_id` means the database has not been resolved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoList {
    database_id: String,
    items: Vec<TodoItem>,
}

impl TodoList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared(self) -> SharedList {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    #[must_use]
    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    #[must_use]
    pub fn has_database(&self) -> bool {
        !self.database_id.is_empty()
    }

    pub fn set_database_id(&mut self, id: impl Into<String>) {
        self.database_id = id.into();
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&TodoItem> {
        self.items.iter().find(|item| &item.guid == id)
    }

    /// Append a new incomplete item and return its id.
    pub fn add(&mut self, value: impl Into<String>) -> ItemId {
        let item = TodoItem::new(value);
        let id = item.guid.clone();
        self.items.push(item);
        id
    }

    pub fn remove(&mut self, id: &ItemId) -> Result<TodoItem, TodoError> {
        let index = self
            .items
            .iter()
            .position(|item| &item.guid == id)
            .ok_or_else(|| TodoError::UnknownItem(id.clone()))?;
        Ok(self.items.remove(index))
    }

    pub fn update_value(&mut self, id: &ItemId, value: impl Into<String>) -> Result<(), TodoError> {
        self.get_mut(id)?.value = value.into();
        Ok(())
    }

    /// Flip `is_done`, returning the new flag.
    pub fn toggle_done(&mut self, id: &ItemId) -> Result<bool, TodoError> {
        let item = self.get_mut(id)?;
        item.is_done = !item.is_done;
        Ok(item.is_done)
    }

    /// Advance the item's state one step, returning the new state.
    pub fn cycle_state(&mut self, id: &ItemId) -> Result<ItemState, TodoError> {
        let item = self.get_mut(id)?;
        item.state = item.state.next();
        Ok(item.state)
    }

    /// Merge `remote` items in front of the local ones. An empty remote list
    /// leaves the local list untouched.
    pub fn merge_remote(&mut self, remote: Vec<TodoItem>) {
        if remote.is_empty() {
            return;
        }
        let local = std::mem::take(&mut self.items);
        self.items = merge_lists(remote, local);
    }

    pub fn replace(&mut self, items: Vec<TodoItem>) {
        self.items = items;
    }

    fn get_mut(&mut self, id: &ItemId) -> Result<&mut TodoItem, TodoError> {
        self.items
            .iter_mut()
            .find(|item| &item.guid == id)
            .ok_or_else(|| TodoError::UnknownItem(id.clone()))
    }
}
