//! Remote calls wrapped as pending operations.

use moss_driver::PendingOperation;
use moss_remote::{RemoteClient, RemoteDocument};
use moss_types::{Instruction, KeyPair};
use serde_json::Value;

use crate::error::TodoError;

/// What a remote operation settles with.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    DatabaseId(String),
    Document(RemoteDocument),
    Status(String),
}

impl Reply {
    const fn kind(&self) -> &'static str {
        match self {
            Reply::DatabaseId(_) => "a database id",
            Reply::Document(_) => "a document",
            Reply::Status(_) => "a status",
        }
    }

    pub fn into_database_id(self) -> Result<String, TodoError> {
        match self {
            Reply::DatabaseId(id) => Ok(id),
            other => Err(other.unexpected("a database id")),
        }
    }

    pub fn into_document(self) -> Result<RemoteDocument, TodoError> {
        match self {
            Reply::Document(document) => Ok(document),
            other => Err(other.unexpected("a document")),
        }
    }

    pub fn into_status(self) -> Result<String, TodoError> {
        match self {
            Reply::Status(status) => Ok(status),
            other => Err(other.unexpected("a status")),
        }
    }

    fn unexpected(&self, expected: &'static str) -> TodoError {
        TodoError::UnexpectedReply {
            expected,
            got: self.kind(),
        }
    }
}

pub type RemoteOperation = PendingOperation<Reply, TodoError>;

/// A client bound to one key pair. Each call starts a fresh request.
#[derive(Debug, Clone)]
pub struct RemoteContext {
    client: RemoteClient,
    keys: KeyPair,
}

impl RemoteContext {
    #[must_use]
    pub fn new(client: RemoteClient, keys: KeyPair) -> Self {
        Self { client, keys }
    }

    pub fn find_database(&self) -> RemoteOperation {
        let client = self.client.clone();
        let public = self.keys.public.clone();
        PendingOperation::new(async move {
            Ok(Reply::DatabaseId(client.find_database(&public).await?))
        })
    }

    pub fn create_database(&self) -> RemoteOperation {
        let client = self.client.clone();
        let keys = self.keys.clone();
        PendingOperation::new(async move {
            let id = client.create_database(&keys.public, &keys.private).await?;
            Ok(Reply::DatabaseId(id))
        })
    }

    pub fn fetch_document(&self) -> RemoteOperation {
        let client = self.client.clone();
        let public = self.keys.public.clone();
        PendingOperation::new(async move {
            Ok(Reply::Document(client.fetch_document(&public).await?))
        })
    }

    pub fn put_object(&self, object: Value) -> RemoteOperation {
        let client = self.client.clone();
        let private = self.keys.private.clone();
        PendingOperation::new(async move {
            Ok(Reply::Status(client.put_object(&private, &object).await?))
        })
    }

    pub fn apply_instructions(&self, instructions: Vec<Instruction>) -> RemoteOperation {
        let client = self.client.clone();
        let private = self.keys.private.clone();
        PendingOperation::new(async move {
            let status = client.apply_instructions(&private, &instructions).await?;
            Ok(Reply::Status(status))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_reply_kind_is_reported() {
        let err = Reply::Status("success".into()).into_document().unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected a document from the remote, got a status"
        );
        assert_eq!(
            Reply::DatabaseId("db".into()).into_database_id().unwrap(),
            "db"
        );
    }
}
