//! Stepwise computations over the remote document.
//!
//! Each one is a [`moss_driver::Computation`] whose operations settle with a
//! [`Reply`](crate::Reply). Remote failures are re-raised unchanged except where
//! a computation documents its own recovery.

mod edit;
mod resolve;
mod sync;

pub use edit::{EditItem, remove_item, set_item_state, toggle_done, update_item_value};
pub use resolve::{RefreshList, ResolveDatabase};
pub use sync::{FetchRemoteList, SyncWithRemote};
