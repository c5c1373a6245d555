use moss_driver::{Advance, Computation, Progress};
use moss_types::TodoItem;

use crate::error::TodoError;
use crate::list::{SharedList, lock};
use crate::merge::pack_remote_items;
use crate::remote::{RemoteContext, Reply};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Lookup,
    Create,
}

/// Find the database readable with the public key, creating it when none exists.
///
/// Finishes with the database id. A lookup answered with 404 is treated like a
/// missing database and falls through to creation. Any other lookup failure
/// rejects without creating, so a transient outage or a bad key never spawns a
/// second database. A failed creation rejects.
#[derive(Debug)]
pub struct ResolveDatabase {
    remote: RemoteContext,
    stage: Stage,
}

impl ResolveDatabase {
    #[must_use]
    pub fn new(remote: RemoteContext) -> Self {
        Self {
            remote,
            stage: Stage::Idle,
        }
    }

    fn create(&mut self) -> Advance<Self> {
        self.stage = Stage::Create;
        Ok(Progress::wait(self.remote.create_database()))
    }
}

impl Computation for ResolveDatabase {
    type Value = Reply;
    type Output = String;
    type Error = TodoError;

    fn start(&mut self) -> Advance<Self> {
        self.stage = Stage::Lookup;
        Ok(Progress::wait(self.remote.find_database()))
    }

    fn resume(&mut self, reply: Reply) -> Advance<Self> {
        let id = reply.into_database_id()?;
        if self.stage == Stage::Lookup && id.is_empty() {
            tracing::info!("No remote database yet; creating one");
            return self.create();
        }
        Ok(Progress::Finished(id))
    }

    fn resume_with_failure(&mut self, error: TodoError) -> Advance<Self> {
        if self.stage == Stage::Lookup
            && let TodoError::Remote(remote) = &error
            && remote.status() == Some(404)
        {
            tracing::warn!("Database lookup found nothing; creating one");
            return self.create();
        }
        Err(error)
    }
}

enum Phase {
    Resolving(ResolveDatabase),
    Fetching,
}

/// Bring the local list up to date with the remote document.
///
/// Resolves the database first when the list has no id yet, then fetches the
/// document and merges its items in front of the local ones. Finishes with the
/// resulting list.
pub struct RefreshList {
    remote: RemoteContext,
    list: SharedList,
    phase: Phase,
}

impl RefreshList {
    #[must_use]
    pub fn new(remote: RemoteContext, list: SharedList) -> Self {
        let phase = Phase::Resolving(ResolveDatabase::new(remote.clone()));
        Self {
            remote,
            list,
            phase,
        }
    }

    /// Forward the inner resolver's progress, moving on to the fetch once it has an id.
    fn after_resolve(&mut self, progress: Advance<ResolveDatabase>) -> Advance<Self> {
        match progress? {
            Progress::Pending(suspension) => Ok(Progress::Pending(suspension)),
            Progress::Finished(id) => {
                tracing::debug!("Database resolved");
                lock(&self.list).set_database_id(id);
                self.fetch()
            }
        }
    }

    fn fetch(&mut self) -> Advance<Self> {
        self.phase = Phase::Fetching;
        Ok(Progress::wait(self.remote.fetch_document()))
    }
}

impl Computation for RefreshList {
    type Value = Reply;
    type Output = Vec<TodoItem>;
    type Error = TodoError;

    fn start(&mut self) -> Advance<Self> {
        if lock(&self.list).has_database() {
            return self.fetch();
        }
        let progress = match &mut self.phase {
            Phase::Resolving(resolver) => resolver.start(),
            Phase::Fetching => return self.fetch(),
        };
        self.after_resolve(progress)
    }

    fn resume(&mut self, reply: Reply) -> Advance<Self> {
        let progress = match &mut self.phase {
            Phase::Resolving(resolver) => resolver.resume(reply),
            Phase::Fetching => {
                let remote_items = pack_remote_items(&reply.into_document()?.object);
                let mut list = lock(&self.list);
                list.merge_remote(remote_items);
                return Ok(Progress::Finished(list.items().to_vec()));
            }
        };
        self.after_resolve(progress)
    }

    fn resume_with_failure(&mut self, error: TodoError) -> Advance<Self> {
        let progress = match &mut self.phase {
            Phase::Resolving(resolver) => resolver.resume_with_failure(error),
            Phase::Fetching => return Err(error),
        };
        self.after_resolve(progress)
    }
}
