//! Session facade: local edits paired with the remote computation that mirrors them.

use moss_driver::{DeferredResult, launch, launch_with};
use moss_remote::RemoteClient;
use moss_types::{ItemId, KeyPair, TodoItem};

use crate::computations::{
    self, EditItem, FetchRemoteList, RefreshList, ResolveDatabase, SyncWithRemote,
};
use crate::error::TodoError;
use crate::list::{SharedList, TodoList, lock};
use crate::remote::RemoteContext;

/// Owns the local list and launches remote computations against it.
///
/// Every edit applies to the local list first, synchronously, then launches the
/// remote counterpart. Editing an unknown item rejects the launch before any
/// request is made.
#[derive(Debug, Clone)]
pub struct TodoSession {
    remote: RemoteContext,
    list: SharedList,
}

impl TodoSession {
    #[must_use]
    pub fn new(client: RemoteClient, keys: KeyPair) -> Self {
        Self::with_list(client, keys, TodoList::new())
    }

    #[must_use]
    pub fn with_list(client: RemoteClient, keys: KeyPair, list: TodoList) -> Self {
        Self {
            remote: RemoteContext::new(client, keys),
            list: list.shared(),
        }
    }

    #[must_use]
    pub fn list(&self) -> SharedList {
        SharedList::clone(&self.list)
    }

    /// Copy of the current local items.
    #[must_use]
    pub fn items(&self) -> Vec<TodoItem> {
        lock(&self.list).items().to_vec()
    }

    #[must_use]
    pub fn database_id(&self) -> String {
        lock(&self.list).database_id().to_string()
    }

    /// Resolve the database id without touching the list.
    pub fn resolve_database(&self) -> DeferredResult<String, TodoError> {
        let remote = self.remote.clone();
        launch(move || Ok(ResolveDatabase::new(remote)))
    }

    /// Fetch the remote items without merging them.
    pub fn fetch_remote(&self) -> DeferredResult<Vec<TodoItem>, TodoError> {
        let remote = self.remote.clone();
        launch(move || Ok(FetchRemoteList::new(remote)))
    }

    /// Merge the remote items into the local list, resolving the database first
    /// if needed.
    pub fn refresh(&self) -> DeferredResult<Vec<TodoItem>, TodoError> {
        let remote = self.remote.clone();
        let list = self.list();
        launch(move || Ok(RefreshList::new(remote, list)))
    }

    /// Push the local list, merged with the remote one.
    pub fn sync(&self) -> DeferredResult<String, TodoError> {
        let remote = self.remote.clone();
        let list = self.list();
        launch(move || Ok(SyncWithRemote::new(remote, list)))
    }

    /// Add an item locally and sync. The new id is available immediately.
    pub fn add_item(
        &self,
        value: impl Into<String>,
    ) -> (ItemId, DeferredResult<String, TodoError>) {
        let id = lock(&self.list).add(value);
        tracing::debug!(item = %id, "Item added");
        (id, self.sync())
    }

    pub fn remove_item(&self, id: &ItemId) -> DeferredResult<String, TodoError> {
        self.edit(
            id,
            |list, id| list.remove(id).map(drop),
            computations::remove_item,
        )
    }

    pub fn update_item_value(
        &self,
        id: &ItemId,
        value: impl Into<String>,
    ) -> DeferredResult<String, TodoError> {
        let value = value.into();
        let remote_value = value.clone();
        self.edit(
            id,
            move |list, id| list.update_value(id, value),
            move |remote, id| computations::update_item_value(remote, id, &remote_value),
        )
    }

    pub fn toggle_done(&self, id: &ItemId) -> DeferredResult<String, TodoError> {
        self.edit(
            id,
            |list, id| list.toggle_done(id).map(drop),
            computations::toggle_done,
        )
    }

    /// Advance the item to its next state and store that state remotely.
    pub fn cycle_state(&self, id: &ItemId) -> DeferredResult<String, TodoError> {
        let list = self.list();
        let remote = self.remote.clone();
        launch_with(
            move |id: ItemId| {
                let state = lock(&list).cycle_state(&id)?;
                Ok(computations::set_item_state(remote, &id, state))
            },
            id.clone(),
        )
    }

    fn edit<L, B>(&self, id: &ItemId, local: L, build: B) -> DeferredResult<String, TodoError>
    where
        L: FnOnce(&mut TodoList, &ItemId) -> Result<(), TodoError>,
        B: FnOnce(RemoteContext, &ItemId) -> EditItem,
    {
        let list = self.list();
        let remote = self.remote.clone();
        launch_with(
            move |id: ItemId| {
                local(&mut *lock(&list), &id)?;
                Ok(build(remote, &id))
            },
            id.clone(),
        )
    }
}
