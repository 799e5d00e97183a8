//! Local persistence for issued invoices and settings.
//!
//! Records live in a flat key-value store under the same keys the
//! browser version kept in local storage, so an export of one can be
//! read by the other.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::calc::InvoiceSummary;
use crate::compose::Document;
use crate::error::StoreError;
use crate::model::{AppSettings, BusinessProfile, Invoice, InvoiceMeta};

pub const SETTINGS_KEY: &str = "invoiceAppSettings";
pub const BUSINESS_KEY: &str = "invoiceBusinessDetails";
pub const METAS_KEY: &str = "invoiceMetas";
pub const COUNTER_KEY: &str = "invoiceCounter";
pub const PDF_PREFIX: &str = "invoicePdf_";
pub const DATA_PREFIX: &str = "invoiceData_";

/// Byte-valued storage. A missing key is `Ok(None)`, not an error.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    /// Removing a missing key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(DirStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path(key)?) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Written to a sibling temp file first, then renamed over the key.
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path(key)?;
        let tmp = self.root.join(format!(".{}.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Invoice records on top of a [`KeyValueStore`].
#[derive(Debug)]
pub struct InvoiceArchive<S> {
    store: S,
}

impl<S: KeyValueStore> InvoiceArchive<S> {
    pub fn new(store: S) -> Self {
        InvoiceArchive { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.put(key, &bytes)
    }

    fn metas(&self) -> Result<Vec<InvoiceMeta>, StoreError> {
        Ok(self.read_json(METAS_KEY)?.unwrap_or_default())
    }

    /// Store the document, the snapshot and the listing entry. An id
    /// that is already listed is refused and nothing is written.
    pub fn save(
        &mut self,
        invoice: &Invoice,
        summary: &InvoiceSummary,
        document: &Document,
    ) -> Result<InvoiceMeta, StoreError> {
        let id = invoice.id();
        let mut metas = self.metas()?;
        if metas.iter().any(|m| m.id == id) {
            return Err(StoreError::Duplicate(id.to_string()));
        }
        self.store.put(&format!("{}{}", PDF_PREFIX, id), document.as_bytes())?;
        self.write_json(&format!("{}{}", DATA_PREFIX, id), invoice)?;

        let meta = invoice.meta(summary);
        metas.push(meta.clone());
        self.write_json(METAS_KEY, &metas)?;

        tracing::info!(id, grand_total = meta.grand_total, "invoice saved");
        Ok(meta)
    }

    /// Listing entries, newest issue date first.
    pub fn list(&self) -> Result<Vec<InvoiceMeta>, StoreError> {
        let mut metas = self.metas()?;
        metas.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then_with(|| b.id.cmp(&a.id)));
        Ok(metas)
    }

    /// Entries whose id or client name contains `term` (ignoring case),
    /// or whose `YYYY-MM-DD` issue date contains it.
    pub fn search(&self, term: &str) -> Result<Vec<InvoiceMeta>, StoreError> {
        let term = term.trim();
        let needle = term.to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|m| {
                m.id.to_lowercase().contains(&needle)
                    || m.client_name.to_lowercase().contains(&needle)
                    || m.issue_date.to_string().contains(term)
            })
            .collect())
    }

    pub fn load_invoice(&self, id: &str) -> Result<Invoice, StoreError> {
        let key = format!("{}{}", DATA_PREFIX, id);
        self.read_json(&key)?.ok_or(StoreError::NotFound(key))
    }

    pub fn load_document(&self, id: &str) -> Result<Document, StoreError> {
        let key = format!("{}{}", PDF_PREFIX, id);
        self.store
            .get(&key)?
            .map(Document::from_bytes)
            .ok_or(StoreError::NotFound(key))
    }

    /// Remove every record of `id`.
    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let data_key = format!("{}{}", DATA_PREFIX, id);
        let mut metas = self.metas()?;
        let before = metas.len();
        metas.retain(|m| m.id != id);
        let listed = metas.len() != before;
        if !listed && self.store.get(&data_key)?.is_none() {
            return Err(StoreError::NotFound(data_key));
        }

        self.store.remove(&format!("{}{}", PDF_PREFIX, id))?;
        self.store.remove(&data_key)?;
        self.write_json(METAS_KEY, &metas)?;
        tracing::info!(id, "invoice deleted");
        Ok(())
    }

    /// Saved settings, or the defaults if none were saved.
    pub fn settings(&self) -> Result<AppSettings, StoreError> {
        Ok(self.read_json(SETTINGS_KEY)?.unwrap_or_default())
    }

    pub fn save_settings(&mut self, settings: &AppSettings) -> Result<(), StoreError> {
        self.write_json(SETTINGS_KEY, settings)
    }

    pub fn business(&self) -> Result<BusinessProfile, StoreError> {
        Ok(self.read_json(BUSINESS_KEY)?.unwrap_or_default())
    }

    pub fn save_business(&mut self, business: &BusinessProfile) -> Result<(), StoreError> {
        self.write_json(BUSINESS_KEY, business)
    }

    /// Last issued sequence number; zero before the first invoice.
    pub fn last_sequence(&self) -> Result<u64, StoreError> {
        Ok(self.read_json(COUNTER_KEY)?.unwrap_or(0))
    }

    /// Stored as a bare decimal number.
    pub fn set_sequence(&mut self, value: u64) -> Result<(), StoreError> {
        self.write_json(COUNTER_KEY, &value)
    }

    /// Increment the stored counter and return the new value.
    pub fn next_sequence(&mut self) -> Result<u64, StoreError> {
        let next = self.last_sequence()? + 1;
        self.set_sequence(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_basics() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);
        store.put("a", b"1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn dir_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirStore::open(dir.path()).unwrap();
        assert!(matches!(store.put("../escape", b"x"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.get(".hidden"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn counter_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = InvoiceArchive::new(DirStore::open(dir.path()).unwrap());
        assert_eq!(archive.next_sequence().unwrap(), 1);
        assert_eq!(archive.next_sequence().unwrap(), 2);
        let archive = InvoiceArchive::new(DirStore::open(dir.path()).unwrap());
        assert_eq!(archive.last_sequence().unwrap(), 2);
        assert_eq!(fs::read_to_string(dir.path().join(COUNTER_KEY)).unwrap(), "2");
    }

    #[test]
    fn defaults_when_nothing_saved() {
        let archive = InvoiceArchive::new(MemoryStore::new());
        assert_eq!(archive.settings().unwrap(), AppSettings::default());
        assert_eq!(archive.business().unwrap(), BusinessProfile::default());
        assert!(archive.list().unwrap().is_empty());
    }
}
