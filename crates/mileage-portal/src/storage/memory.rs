use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::{BlobStore, DocumentPath, DocumentStore, StoreError};

/// Process-local document store used by the API binary and the test suites.
#[derive(Default, Clone)]
pub struct MemoryDocumentStore {
    documents: Arc<Mutex<BTreeMap<DocumentPath, Value>>>,
}

impl MemoryDocumentStore {
    fn documents(&self) -> Result<MutexGuard<'_, BTreeMap<DocumentPath, Value>>, StoreError> {
        self.documents
            .lock()
            .map_err(|_| StoreError::Unavailable("document store mutex poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.documents().map(|guard| guard.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, path: &DocumentPath) -> Result<Option<Value>, StoreError> {
        Ok(self.documents()?.get(path).cloned())
    }

    fn set(&self, path: &DocumentPath, document: Value) -> Result<(), StoreError> {
        self.documents()?.insert(path.clone(), document);
        Ok(())
    }

    fn merge(&self, path: &DocumentPath, patch: Value) -> Result<(), StoreError> {
        let mut documents = self.documents()?;
        if let Value::Object(fields) = &patch {
            if let Some(Value::Object(existing)) = documents.get_mut(path) {
                for (key, value) in fields {
                    existing.insert(key.clone(), value.clone());
                }
                return Ok(());
            }
        }
        documents.insert(path.clone(), patch);
        Ok(())
    }

    fn delete(&self, path: &DocumentPath) -> Result<bool, StoreError> {
        Ok(self.documents()?.remove(path).is_some())
    }

    fn list(&self, collection: &DocumentPath) -> Result<Vec<(String, Value)>, StoreError> {
        let documents = self.documents()?;
        Ok(documents
            .iter()
            .filter(|(path, _)| collection.is_parent_of(path))
            .filter_map(|(path, value)| path.last().map(|id| (id.to_string(), value.clone())))
            .collect())
    }
}

/// Blob store keeping uploads in memory and minting URLs under a configured prefix.
#[derive(Clone)]
pub struct MemoryBlobStore {
    base_url: String,
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Arc::default(),
        }
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(path).cloned())
    }
}

impl BlobStore for MemoryBlobStore {
    fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        self.objects
            .lock()
            .map_err(|_| StoreError::Unavailable("blob store mutex poisoned".to_string()))?
            .insert(path.to_string(), bytes);
        Ok(format!("{}/{}", self.base_url, path))
    }

    fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.objects
            .lock()
            .map_err(|_| StoreError::Unavailable("blob store mutex poisoned".to_string()))?
            .remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_only_named_keys() {
        let store = MemoryDocumentStore::default();
        let path = DocumentPath::new(["notices_HGU", "n-1"]);
        store
            .set(&path, json!({ "title": "old", "author": "admin" }))
            .expect("set");
        store
            .merge(&path, json!({ "title": "new" }))
            .expect("merge");

        assert_eq!(
            store.get(&path).expect("get"),
            Some(json!({ "title": "new", "author": "admin" }))
        );
    }

    #[test]
    fn list_returns_direct_children_only() {
        let store = MemoryDocumentStore::default();
        store
            .set(&DocumentPath::new(["forms_HGU", "a"]), json!({ "n": 1 }))
            .expect("set");
        store
            .set(&DocumentPath::new(["forms_HGU", "b"]), json!({ "n": 2 }))
            .expect("set");
        store
            .set(&DocumentPath::new(["forms_POSTECH", "c"]), json!({ "n": 3 }))
            .expect("set");

        let listed = store
            .list(&DocumentPath::new(["forms_HGU"]))
            .expect("list");
        let ids: Vec<_> = listed.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn blob_upload_returns_prefixed_url() {
        let blobs = MemoryBlobStore::new("https://files.example.ac.kr");
        let url = blobs
            .upload("forms/HGU/f-1/guide.pdf", vec![1, 2, 3])
            .expect("upload");

        assert_eq!(url, "https://files.example.ac.kr/forms/HGU/f-1/guide.pdf");
        assert_eq!(blobs.object("forms/HGU/f-1/guide.pdf"), Some(vec![1, 2, 3]));
        blobs.remove("forms/HGU/f-1/guide.pdf").expect("remove");
        assert!(blobs.object("forms/HGU/f-1/guide.pdf").is_none());
    }
}
