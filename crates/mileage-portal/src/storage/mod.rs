//! Storage seams for the portal.
//!
//! Documents live in an external document database addressed by slash separated paths
//! (`mileage/{university}/{year}/{semester}`), uploaded files in an external blob store that
//! hands back a download URL. Both are modelled as traits so services can be exercised against
//! the in-memory implementations in [`memory`].

pub mod memory;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use memory::{MemoryBlobStore, MemoryDocumentStore};

/// Slash separated address of a document or collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath(Vec<String>);

impl DocumentPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_parent_of(&self, other: &DocumentPath) -> bool {
        other.0.len() == self.0.len() + 1 && other.0.starts_with(&self.0)
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Raw JSON document access, mirroring the operations the portal needs from its database.
pub trait DocumentStore: Send + Sync {
    fn get(&self, path: &DocumentPath) -> Result<Option<Value>, StoreError>;
    /// Replaces the whole document.
    fn set(&self, path: &DocumentPath, document: Value) -> Result<(), StoreError>;
    /// Overwrites the top-level keys present in `patch`, creating the document if needed.
    fn merge(&self, path: &DocumentPath, patch: Value) -> Result<(), StoreError>;
    /// Returns whether a document was removed.
    fn delete(&self, path: &DocumentPath) -> Result<bool, StoreError>;
    /// Lists the direct children of a collection as `(id, document)` pairs.
    fn list(&self, collection: &DocumentPath) -> Result<Vec<(String, Value)>, StoreError>;
}

/// Typed helpers layered on top of any [`DocumentStore`].
pub trait DocumentStoreExt: DocumentStore {
    fn fetch<T: DeserializeOwned>(&self, path: &DocumentPath) -> Result<Option<T>, StoreError> {
        match self.get(path)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    path: path.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, path: &DocumentPath, document: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(document).map_err(StoreError::Encode)?;
        self.set(path, value)
    }

    fn fetch_all<T: DeserializeOwned>(
        &self,
        collection: &DocumentPath,
    ) -> Result<Vec<(String, T)>, StoreError> {
        self.list(collection)?
            .into_iter()
            .map(|(id, value)| {
                serde_json::from_value(value)
                    .map(|document| (id.clone(), document))
                    .map_err(|source| StoreError::Corrupt {
                        path: collection.child(id).to_string(),
                        source,
                    })
            })
            .collect()
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

/// File storage returning a public download URL per object.
pub trait BlobStore: Send + Sync {
    fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, StoreError>;
    fn remove(&self, path: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("document {path} does not match the expected shape: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("document could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_detection_requires_direct_child() {
        let collection = DocumentPath::new(["notices_HGU"]);
        let notice = collection.child("n-1");
        let nested = notice.child("comments");

        assert!(collection.is_parent_of(&notice));
        assert!(!collection.is_parent_of(&nested));
        assert_eq!(notice.to_string(), "notices_HGU/n-1");
        assert_eq!(notice.last(), Some("n-1"));
    }
}
