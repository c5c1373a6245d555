//! Todo list state and the remote sync computations that keep it in step with
//! the MossByte service.
//!
//! # Architecture
//!
//! - [`TodoList`] - local items and the resolved database id
//! - [`merge`] - pure conversions between local items and the stored document
//! - [`computations`] - resumable computations, one per remote workflow, driven
//!   by `moss-driver`
//! - [`TodoSession`] - applies each edit locally, then launches its remote
//!   counterpart and hands back the `DeferredResult`
//!
//! The local list is the source of truth for edits. Remote failures reject the
//! launch but never roll back a local edit.

pub mod computations;
mod error;
mod list;
pub mod merge;
mod remote;
mod session;

#[cfg(test)]
mod test_support;

pub use error::TodoError;
pub use list::{SharedList, TodoList};
pub use merge::{
    merge_lists, pack_remote_items, remove_duplicates, unpack_for_payload, unpack_over,
};
pub use remote::{RemoteContext, RemoteOperation, Reply};
pub use session::TodoSession;
