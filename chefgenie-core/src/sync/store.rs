//! Document stores holding one shared [`SyncData`] document per household.

use futures::future::{self, BoxFuture};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::error::SyncError;
use crate::household::HouseholdCode;
use crate::models::SyncData;

/// Capacity of each per-household broadcast channel.
const CHANNEL_CAPACITY: usize = 64;

/// One observation of a household document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// `None` while the document does not exist
    pub data: Option<SyncData>,
    /// True when the snapshot reflects a write made through the same store
    /// handle that is watching
    pub has_pending_writes: bool,
}

/// Remote storage for household documents.
///
/// `set` overwrites the whole document. `watch` yields the current state
/// first, then one snapshot per change, until the stream is dropped.
pub trait DocumentStore: Send + Sync {
    fn get<'a>(
        &'a self,
        code: &'a HouseholdCode,
    ) -> BoxFuture<'a, Result<Option<SyncData>, SyncError>>;

    fn set<'a>(
        &'a self,
        code: &'a HouseholdCode,
        data: &'a SyncData,
    ) -> BoxFuture<'a, Result<(), SyncError>>;

    fn watch(&self, code: &HouseholdCode) -> BoxStream<'static, DocumentSnapshot>;
}

#[derive(Debug, Clone)]
struct Change {
    data: SyncData,
    writer: u64,
}

#[derive(Default)]
struct Backend {
    documents: Mutex<HashMap<HouseholdCode, SyncData>>,
    channels: Mutex<HashMap<HouseholdCode, broadcast::Sender<Change>>>,
    next_device: AtomicU64,
    writes: AtomicUsize,
}

impl Backend {
    fn documents(&self) -> MutexGuard<'_, HashMap<HouseholdCode, SyncData>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn channel(&self, code: &HouseholdCode) -> broadcast::Sender<Change> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(code.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

/// An in-process document store.
///
/// Handles created with [`device`](Self::device) share one backend, so a
/// test can stand up several "devices" syncing through the same household
/// document. A handle sees its own writes flagged as pending.
#[derive(Clone)]
pub struct MemoryDocumentStore {
    backend: Arc<Backend>,
    device: u64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let backend = Arc::new(Backend::default());
        let device = backend.next_device.fetch_add(1, Ordering::SeqCst);
        Self { backend, device }
    }

    /// A new handle on the same backend, acting as a separate device.
    pub fn device(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            device: self.backend.next_device.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Number of successful writes across all handles.
    pub fn write_count(&self) -> usize {
        self.backend.writes.load(Ordering::SeqCst)
    }

    /// The stored document, bypassing the async interface.
    pub fn document(&self, code: &HouseholdCode) -> Option<SyncData> {
        self.backend.documents().get(code).cloned()
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get<'a>(
        &'a self,
        code: &'a HouseholdCode,
    ) -> BoxFuture<'a, Result<Option<SyncData>, SyncError>> {
        let data = self.document(code);
        Box::pin(future::ready(Ok(data)))
    }

    fn set<'a>(
        &'a self,
        code: &'a HouseholdCode,
        data: &'a SyncData,
    ) -> BoxFuture<'a, Result<(), SyncError>> {
        self.backend.documents().insert(code.clone(), data.clone());
        self.backend.writes.fetch_add(1, Ordering::SeqCst);

        // No receivers is fine: nobody is watching this household yet.
        let _ = self.backend.channel(code).send(Change {
            data: data.clone(),
            writer: self.device,
        });
        Box::pin(future::ready(Ok(())))
    }

    fn watch(&self, code: &HouseholdCode) -> BoxStream<'static, DocumentSnapshot> {
        // Subscribe before reading so no write falls between the two.
        let rx = self.backend.channel(code).subscribe();
        let initial = DocumentSnapshot {
            data: self.document(code),
            has_pending_writes: false,
        };
        let device = self.device;

        let updates = stream::unfold(rx, move |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        let snapshot = DocumentSnapshot {
                            data: Some(change.data),
                            has_pending_writes: change.writer == device,
                        };
                        return Some((snapshot, rx));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Watcher lagged, skipped {} snapshots", skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });

        stream::once(future::ready(initial)).chain(updates).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;

    fn code() -> HouseholdCode {
        HouseholdCode::parse("CHEF-TEST001").unwrap()
    }

    fn bundle(item: &str) -> SyncData {
        SyncData::new(vec![], vec![Ingredient::new(item, "1", "Dairy")], vec![])
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let store = MemoryDocumentStore::new();
        assert_eq!(store.get(&code()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryDocumentStore::new();
        store.set(&code(), &bundle("Milk")).await.unwrap();
        store.set(&code(), &bundle("Eggs")).await.unwrap();

        let stored = store.get(&code()).await.unwrap().unwrap();
        assert_eq!(stored.shopping_list.len(), 1);
        assert_eq!(stored.shopping_list[0].name, "Eggs");
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_devices_share_backend() {
        let phone = MemoryDocumentStore::new();
        let laptop = phone.device();

        phone.set(&code(), &bundle("Milk")).await.unwrap();
        assert_eq!(laptop.get(&code()).await.unwrap(), Some(bundle("Milk")));
    }

    #[tokio::test]
    async fn test_watch_starts_with_current_state() {
        let store = MemoryDocumentStore::new();
        let mut watch = store.watch(&code());
        let first = watch.next().await.unwrap();
        assert_eq!(first.data, None);
        assert!(!first.has_pending_writes);
    }

    #[tokio::test]
    async fn test_watch_flags_own_writes_as_pending() {
        let phone = MemoryDocumentStore::new();
        let laptop = phone.device();

        let mut phone_watch = phone.watch(&code());
        let mut laptop_watch = laptop.watch(&code());
        phone_watch.next().await.unwrap();
        laptop_watch.next().await.unwrap();

        phone.set(&code(), &bundle("Milk")).await.unwrap();

        let own = phone_watch.next().await.unwrap();
        assert!(own.has_pending_writes);
        let other = laptop_watch.next().await.unwrap();
        assert!(!other.has_pending_writes);
        assert_eq!(other.data, Some(bundle("Milk")));
    }

    #[tokio::test]
    async fn test_watch_is_scoped_to_household() {
        let store = MemoryDocumentStore::new();
        let other = HouseholdCode::parse("CHEF-OTHER01").unwrap();
        let mut watch = store.watch(&code());
        watch.next().await.unwrap();

        store.set(&other, &bundle("Milk")).await.unwrap();
        store.set(&code(), &bundle("Eggs")).await.unwrap();

        let snapshot = watch.next().await.unwrap();
        assert_eq!(snapshot.data, Some(bundle("Eggs")));
    }
}
