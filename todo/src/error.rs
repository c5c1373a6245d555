use moss_remote::RemoteError;
use moss_types::ItemId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("no item with id {0}")]
    UnknownItem(ItemId),
    /// A remote operation settled with a reply of the wrong kind for the step
    /// that was waiting on it.
    #[error("expected {expected} from the remote, got {got}")]
    UnexpectedReply {
        expected: &'static str,
        got: &'static str,
    },
}
