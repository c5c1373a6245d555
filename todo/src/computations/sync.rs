use moss_driver::{Advance, Computation, Progress};
use moss_types::TodoItem;

use crate::error::TodoError;
use crate::list::{SharedList, lock};
use crate::merge::{merge_lists, pack_remote_items, unpack_over};
use crate::remote::{RemoteContext, Reply};

/// Fetch the remote document and finish with the items it holds.
#[derive(Debug)]
pub struct FetchRemoteList {
    remote: RemoteContext,
}

impl FetchRemoteList {
    #[must_use]
    pub fn new(remote: RemoteContext) -> Self {
        Self { remote }
    }
}

impl Computation for FetchRemoteList {
    type Value = Reply;
    type Output = Vec<TodoItem>;
    type Error = TodoError;

    fn start(&mut self) -> Advance<Self> {
        Ok(Progress::wait(self.remote.fetch_document()))
    }

    fn resume(&mut self, reply: Reply) -> Advance<Self> {
        let document = reply.into_document()?;
        Ok(Progress::Finished(pack_remote_items(&document.object)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Fetch,
    Push,
}

/// Push the local list to the remote, keeping anything only the remote has.
///
/// Fetches the document, merges its items in front of the local list as it
/// stands when the fetch settles, stores the merged list locally, then replaces
/// the remote object with it. Stored entries that do not read as items are
/// pushed back unchanged. Finishes with the service's status for the push.
pub struct SyncWithRemote {
    remote: RemoteContext,
    list: SharedList,
    stage: Stage,
}

impl SyncWithRemote {
    #[must_use]
    pub fn new(remote: RemoteContext, list: SharedList) -> Self {
        Self {
            remote,
            list,
            stage: Stage::Fetch,
        }
    }
}

impl Computation for SyncWithRemote {
    type Value = Reply;
    type Output = String;
    type Error = TodoError;

    fn start(&mut self) -> Advance<Self> {
        self.stage = Stage::Fetch;
        Ok(Progress::wait(self.remote.fetch_document()))
    }

    fn resume(&mut self, reply: Reply) -> Advance<Self> {
        match self.stage {
            Stage::Fetch => {
                let fetched = reply.into_document()?.object;
                let remote_items = pack_remote_items(&fetched);
                let merged = {
                    let mut list = lock(&self.list);
                    let merged = merge_lists(remote_items, list.items().to_vec());
                    list.replace(merged.clone());
                    merged
                };
                tracing::debug!(items = merged.len(), "Pushing merged list");
                self.stage = Stage::Push;
                Ok(Progress::wait(
                    self.remote.put_object(unpack_over(&fetched, &merged)),
                ))
            }
            Stage::Push => Ok(Progress::Finished(reply.into_status()?)),
        }
    }
}
