//! Core domain types for Moss.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

#![allow(clippy::missing_errors_doc)]

mod ids;
pub use ids::ItemId;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Todo Items
// ============================================================================

/// Progress state of a todo item.
///
/// Stored remotely as its integer code. Cycling wraps from `Complete` back to
/// `Incomplete`; there is no way to reach the "none" code through the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ItemState {
    #[default]
    Incomplete,
    InProgress,
    Complete,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown item state code {0}")]
pub struct ItemStateError(pub u8);

impl ItemState {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            ItemState::Incomplete => 1,
            ItemState::InProgress => 2,
            ItemState::Complete => 3,
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            ItemState::Incomplete => ItemState::InProgress,
            ItemState::InProgress => ItemState::Complete,
            ItemState::Complete => ItemState::Incomplete,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ItemState::Incomplete => "incomplete",
            ItemState::InProgress => "in progress",
            ItemState::Complete => "complete",
        }
    }
}

impl TryFrom<u8> for ItemState {
    type Error = ItemStateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ItemState::Incomplete),
            2 => Ok(ItemState::InProgress),
            3 => Ok(ItemState::Complete),
            other => Err(ItemStateError(other)),
        }
    }
}

impl From<ItemState> for u8 {
    fn from(value: ItemState) -> Self {
        value.code()
    }
}

/// A single todo item as held locally and stored in the remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub guid: ItemId,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub state: ItemState,
}

impl TodoItem {
    /// New incomplete item with a freshly generated id.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            guid: ItemId::generate(),
            value: value.into(),
            is_done: false,
            state: ItemState::Incomplete,
        }
    }
}

// ============================================================================
// Access Keys
// ============================================================================

/// A credential appended to the remote base address.
///
/// Note: `Debug` is manually implemented to redact the key value, preventing accidental
/// credential disclosure in logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKey(String);

impl std::fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessKey(<redacted>)")
    }
}

#[derive(Debug, Error)]
#[error("access key must not be empty")]
pub struct EmptyKeyError;

impl AccessKey {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyKeyError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(EmptyKeyError);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

/// The caller-held key pair: the public key reads, the private key administers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub public: AccessKey,
    pub private: AccessKey,
}

impl KeyPair {
    #[must_use]
    pub fn new(public: AccessKey, private: AccessKey) -> Self {
        Self { public, private }
    }
}

// ============================================================================
// Patch Instructions
// ============================================================================

/// A single field-level edit applied to the remote document.
///
/// Serializes as `{"function": "set" | "toggle" | "unset", "key": ..., "value"?: ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "lowercase")]
pub enum Instruction {
    Set {
        key: String,
        value: serde_json::Value,
    },
    Toggle {
        key: String,
    },
    Unset {
        key: String,
    },
}

impl Instruction {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Instruction::Set { key, .. }
            | Instruction::Toggle { key }
            | Instruction::Unset { key } => key,
        }
    }
}
