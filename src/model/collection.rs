//! Document collections
//!
//! CRUD and derived queries for one document type.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::engine::Engine;
use crate::error::{DynaError, Result};

/// A type storable in a `Collection`
pub trait Document: Serialize + DeserializeOwned {
    /// Collection name, used as key prefix
    const COLLECTION: &'static str;

    /// Version byte written in front of every encoded document
    const SCHEMA_VERSION: u8 = 1;
}

/// Encode a document as `[schema_version][bincode payload]`
pub fn encode_document<T: Document>(doc: &T) -> Result<Vec<u8>> {
    let payload =
        bincode::serialize(doc).map_err(|e| DynaError::Serialization(e.to_string()))?;

    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(T::SCHEMA_VERSION);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode a document written by `encode_document`
pub fn decode_document<T: Document>(bytes: &[u8]) -> Result<T> {
    let (&version, payload) = bytes
        .split_first()
        .ok_or_else(|| DynaError::Serialization("empty document".to_string()))?;

    if version != T::SCHEMA_VERSION {
        return Err(DynaError::Serialization(format!(
            "{}: schema version {} does not match expected {}",
            T::COLLECTION,
            version,
            T::SCHEMA_VERSION
        )));
    }

    bincode::deserialize(payload).map_err(|e| DynaError::Serialization(e.to_string()))
}

/// Documents of type `T` stored under `"<T::COLLECTION>:<id>"`
pub struct Collection<T: Document> {
    engine: Arc<Engine>,
    prefix: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Collection<T> {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            prefix: format!("{}:", T::COLLECTION),
            _marker: PhantomData,
        }
    }

    /// Insert or replace the document `id`
    pub fn save(&self, id: &str, doc: &T) -> Result<()> {
        let value = encode_document(doc)?;
        self.engine.put(self.make_key(id).as_bytes(), &value)
    }

    /// Fetch the document `id`
    pub fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        match self.engine.get(self.make_key(id).as_bytes())? {
            Some(bytes) => decode_document(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Delete the document `id`; false if it did not exist
    pub fn remove(&self, id: &str) -> Result<bool> {
        self.engine.erase(self.make_key(id).as_bytes())
    }

    /// Every document of this collection, one entry per id
    pub fn find_all(&self) -> Result<Vec<(String, T)>> {
        self.find_where(|_| true)
    }

    /// Documents of this collection matching `predicate`
    ///
    /// Documents that fail to decode are logged and left out.
    pub fn find_where<F>(&self, mut predicate: F) -> Result<Vec<(String, T)>>
    where
        F: FnMut(&T) -> bool,
    {
        let mut results = Vec::new();

        for item in self.engine.scan_latest() {
            let (key, value) = item?;
            let Some(id) = self.extract_id(&key) else {
                continue;
            };

            let doc: T = match decode_document(&value) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(
                        collection = T::COLLECTION,
                        id = %id,
                        "Skipping undecodable document: {}",
                        e
                    );
                    continue;
                }
            };
            if predicate(&doc) {
                results.push((id, doc));
            }
        }

        Ok(results)
    }

    /// Collection name
    pub fn name(&self) -> &'static str {
        T::COLLECTION
    }

    fn make_key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Id part of `key`, if it belongs to this collection
    fn extract_id(&self, key: &[u8]) -> Option<String> {
        let rest = key.strip_prefix(self.prefix.as_bytes())?;
        String::from_utf8(rest.to_vec()).ok()
    }
}
