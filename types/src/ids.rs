use std::fmt;

use uuid::Uuid;

/// Identifier of a single todo item, shared by the local list and the remote document.
///
/// The remote document is keyed by this value, so it doubles as the object key in
/// push payloads and as the prefix of patch instruction keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh RFC 4122 v4 identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key addressing one field of this item inside the remote document.
    #[must_use]
    pub fn field_key(&self, field: &str) -> String {
        format!("{}.{field}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = ItemId::generate();
        let b = ItemId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn field_key_joins_with_dot() {
        let id = ItemId::new("someuuid");
        assert_eq!(id.field_key("isDone"), "someuuid.isDone");
    }

    #[test]
    fn serializes_transparently() {
        let id = ItemId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
