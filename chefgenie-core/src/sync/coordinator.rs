use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::error::SyncError;
use super::store::DocumentStore;
use crate::household::HouseholdCode;
use crate::models::SyncData;

/// Pushes, pulls and watches the household document for one code.
///
/// Without a store or a code the coordinator is inert: pushes fail, pulls
/// return `None` and subscriptions never fire.
#[derive(Clone, Default)]
pub struct SyncCoordinator {
    store: Option<Arc<dyn DocumentStore>>,
    code: Option<HouseholdCode>,
}

impl SyncCoordinator {
    pub fn new(store: Option<Arc<dyn DocumentStore>>, code: Option<HouseholdCode>) -> Self {
        Self { store, code }
    }

    pub fn code(&self) -> Option<&HouseholdCode> {
        self.code.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Overwrites the household document with `bundle`, stamped with the
    /// current time.
    pub async fn push(&self, bundle: &SyncData) -> Result<(), SyncError> {
        let code = self.code.as_ref().ok_or(SyncError::NoCode)?;
        let store = self.store.as_ref().ok_or(SyncError::NotConfigured)?;

        let stamped = bundle.clone().stamped();
        store.set(code, &stamped).await?;
        tracing::info!(
            "Pushed {} history items, {} shopping items to {}",
            stamped.history.len(),
            stamped.shopping_list.len(),
            code
        );
        Ok(())
    }

    /// Reads the household document once.
    ///
    /// Returns `None` when there is no code or store, the document does not
    /// exist, or the read fails.
    pub async fn pull(&self) -> Option<SyncData> {
        let code = self.code.as_ref()?;
        let store = self.store.as_ref()?;

        match store.get(code).await {
            Ok(Some(data)) => {
                tracing::info!("Pulled household document {}", code);
                Some(data)
            }
            Ok(None) => {
                tracing::debug!("No household document for {}", code);
                None
            }
            Err(e) => {
                tracing::warn!("Pull failed for {}: {}", code, e);
                None
            }
        }
    }

    /// Calls `on_change` for every remote change to the household document.
    ///
    /// Snapshots of this store handle's own writes are skipped, as are
    /// snapshots of a missing document. Must be called inside a Tokio
    /// runtime.
    pub fn subscribe<F>(&self, mut on_change: F) -> Subscription
    where
        F: FnMut(SyncData) + Send + 'static,
    {
        let (Some(store), Some(code)) = (&self.store, &self.code) else {
            return Subscription::inert();
        };

        let mut snapshots = store.watch(code);
        let code = code.clone();
        let task = tokio::spawn(async move {
            while let Some(snapshot) = snapshots.next().await {
                if snapshot.has_pending_writes {
                    tracing::debug!("Skipping own write to {}", code);
                    continue;
                }
                if let Some(data) = snapshot.data {
                    tracing::debug!("Remote change to {}", code);
                    on_change(data);
                }
            }
        });

        Subscription { task: Some(task) }
    }
}

/// A live subscription. Dropping it stops the listener.
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// A subscription that never delivers anything.
    pub fn inert() -> Self {
        Self { task: None }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;
    use crate::sync::MemoryDocumentStore;
    use tokio::sync::mpsc;

    fn milk_bundle() -> SyncData {
        SyncData::new(vec![], vec![Ingredient::new("Milk", "1 L", "Dairy")], vec![])
    }

    fn coordinator(store: &MemoryDocumentStore, code: &str) -> SyncCoordinator {
        SyncCoordinator::new(
            Some(Arc::new(store.clone()) as Arc<dyn DocumentStore>),
            HouseholdCode::parse(code),
        )
    }

    #[tokio::test]
    async fn test_push_then_pull_with_unnormalized_code() {
        let store = MemoryDocumentStore::new();
        coordinator(&store, "CHEF-ABC1234")
            .push(&milk_bundle())
            .await
            .unwrap();

        let pulled = coordinator(&store, " chef-abc1234 ").pull().await.unwrap();
        assert!(pulled.same_content(&milk_bundle()));
        assert!(pulled.last_updated > 0);
    }

    #[tokio::test]
    async fn test_without_code() {
        let store = MemoryDocumentStore::new();
        let coordinator = coordinator(&store, "   ");

        let err = coordinator.push(&milk_bundle()).await.unwrap_err();
        assert!(matches!(err, SyncError::NoCode));
        assert_eq!(coordinator.pull().await, None);
        assert!(!coordinator.subscribe(|_| {}).is_active());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_without_store() {
        let coordinator = SyncCoordinator::new(None, HouseholdCode::parse("CHEF-ABC1234"));
        let err = coordinator.push(&milk_bundle()).await.unwrap_err();
        assert!(matches!(err, SyncError::NotConfigured));
        assert_eq!(coordinator.pull().await, None);
        assert!(!coordinator.subscribe(|_| {}).is_active());
    }

    #[tokio::test]
    async fn test_pull_missing_document() {
        let store = MemoryDocumentStore::new();
        assert_eq!(coordinator(&store, "CHEF-NOPE000").pull().await, None);
    }

    #[tokio::test]
    async fn test_subscribe_receives_remote_changes_only() {
        let store = MemoryDocumentStore::new();
        let phone = coordinator(&store, "CHEF-ABC1234");
        let laptop = coordinator(&store.device(), "CHEF-ABC1234");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = phone.subscribe(move |data| {
            let _ = tx.send(data);
        });
        tokio::task::yield_now().await;

        // Own write: skipped.
        phone.push(&milk_bundle()).await.unwrap();
        // Other device: delivered.
        let eggs = SyncData::new(vec![], vec![Ingredient::new("Eggs", "6", "Dairy")], vec![]);
        laptop.push(&eggs).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert!(received.same_content(&eggs));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_listener() {
        let store = MemoryDocumentStore::new();
        let phone = coordinator(&store, "CHEF-ABC1234");
        let laptop = coordinator(&store.device(), "CHEF-ABC1234");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut subscription = phone.subscribe(move |data| {
            let _ = tx.send(data);
        });
        assert!(subscription.is_active());
        subscription.unsubscribe();
        assert!(!subscription.is_active());

        laptop.push(&milk_bundle()).await.unwrap();
        // The sender was dropped with the aborted task.
        assert!(rx.recv().await.is_none());
    }
}
