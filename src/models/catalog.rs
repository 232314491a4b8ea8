//! Process-wide model catalog with a single-flight first load
//!
//! The catalog starts `Unloaded`. The first caller of `ensure_loaded()`
//! publishes a shared fetch future; concurrent callers await that same future
//! instead of issuing their own `GET /models`. A successful fetch moves the
//! catalog to `Loaded` for the rest of the process. A failed fetch hands the
//! same error to every waiter and returns the catalog to `Unloaded`, so the
//! next call retries. When every waiter is dropped before the fetch settles,
//! the fetch and its request are dropped too and the catalog is `Unloaded`.

use crate::error::GatewayResult;
use crate::gateway::GatewayClient;
use crate::models::descriptor::{CatalogPayload, ModelDescriptor};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, PoisonError};

/// Immutable, ordered list of descriptors as returned by the gateway
///
/// Clones share the same allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    models: Arc<[ModelDescriptor]>,
}

impl CatalogSnapshot {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self {
            models: models.into(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelDescriptor> {
        self.models.iter()
    }

    pub fn as_slice(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Whether any descriptor has exactly this id
    pub fn contains(&self, id: &str) -> bool {
        self.models.iter().any(|m| m.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id() == id)
    }
}

impl<'a> IntoIterator for &'a CatalogSnapshot {
    type Item = &'a ModelDescriptor;
    type IntoIter = std::slice::Iter<'a, ModelDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

type CatalogFetch = Shared<BoxFuture<'static, GatewayResult<CatalogSnapshot>>>;

enum CatalogState {
    Unloaded,
    /// `waiters` counts live `ensure_loaded` calls awaiting `fetch`
    Loading {
        fetch: CatalogFetch,
        waiters: usize,
    },
    Loaded(CatalogSnapshot),
}

/// Lifecycle owner for the gateway's model list
///
/// Owned by the composition root and shared via `Arc`.
pub struct ModelCatalog {
    gateway: GatewayClient,
    state: Mutex<CatalogState>,
}

impl ModelCatalog {
    pub fn new(gateway: GatewayClient) -> Self {
        Self {
            gateway,
            state: Mutex::new(CatalogState::Unloaded),
        }
    }

    /// Create a catalog that is already loaded, without touching the network
    pub fn preloaded(gateway: GatewayClient, snapshot: CatalogSnapshot) -> Self {
        Self {
            gateway,
            state: Mutex::new(CatalogState::Loaded(snapshot)),
        }
    }

    pub fn gateway(&self) -> &GatewayClient {
        &self.gateway
    }

    /// The loaded snapshot, if any. Never performs I/O.
    pub fn snapshot(&self) -> Option<CatalogSnapshot> {
        match &*self.lock_state() {
            CatalogState::Loaded(snapshot) => Some(snapshot.clone()),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(&*self.lock_state(), CatalogState::Loaded(_))
    }

    /// Return the catalog, fetching it first if it has never loaded
    ///
    /// At most one `GET /models` is in flight at any time. After the first
    /// success this returns the cached snapshot without a network call.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Config` when no usable credential is configured (no
    ///   request is made)
    /// - `GatewayError::Upstream` on non-success status, transport failure
    ///   or timeout
    /// - `GatewayError::Protocol` when the body is not JSON
    pub async fn ensure_loaded(&self) -> GatewayResult<CatalogSnapshot> {
        let fetch = {
            let mut state = self.lock_state();
            if let CatalogState::Loaded(snapshot) = &*state {
                return Ok(snapshot.clone());
            }
            if let CatalogState::Loading { fetch, waiters } = &mut *state {
                tracing::debug!(waiters = *waiters, "Catalog fetch already in flight, awaiting it");
                *waiters += 1;
                fetch.clone()
            } else {
                let fetch = self.start_fetch();
                *state = CatalogState::Loading {
                    fetch: fetch.clone(),
                    waiters: 1,
                };
                fetch
            }
        };

        let mut waiter = Waiter {
            catalog: self,
            fetch: fetch.clone(),
            settled: false,
        };
        let result = fetch.await;
        waiter.settle(&result);
        result
    }

    fn start_fetch(&self) -> CatalogFetch {
        let gateway = self.gateway.clone();
        async move {
            tracing::info!(base_url = %gateway.base_url(), "Fetching model catalog");
            match gateway.fetch_models().await {
                Ok(body) => {
                    let payload = CatalogPayload::from_value(body);
                    if payload.is_malformed() {
                        tracing::warn!("Catalog response has an unrecognized shape, treating as empty");
                    }
                    let snapshot = CatalogSnapshot::new(payload.into_descriptors());
                    tracing::info!(models = snapshot.len(), "Model catalog loaded");
                    Ok(snapshot)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Model catalog fetch failed");
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        // State transitions never panic mid-update, so a poisoned lock still
        // holds a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration of one `ensure_loaded` call on an in-flight fetch
///
/// Dropped unsettled means the call was cancelled. The last cancelled waiter
/// abandons the fetch so the next caller starts a fresh request.
struct Waiter<'a> {
    catalog: &'a ModelCatalog,
    fetch: CatalogFetch,
    settled: bool,
}

impl Waiter<'_> {
    fn settle(&mut self, result: &GatewayResult<CatalogSnapshot>) {
        self.settled = true;
        let mut state = self.catalog.lock_state();
        if let CatalogState::Loading { fetch, .. } = &*state
            && fetch.ptr_eq(&self.fetch)
        {
            *state = match result {
                Ok(snapshot) => CatalogState::Loaded(snapshot.clone()),
                Err(_) => CatalogState::Unloaded,
            };
        }
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.catalog.lock_state();
        if let CatalogState::Loading { fetch, waiters } = &mut *state
            && fetch.ptr_eq(&self.fetch)
        {
            *waiters = waiters.saturating_sub(1);
            if *waiters == 0 {
                tracing::debug!("Every catalog waiter was cancelled, abandoning the fetch");
                *state = CatalogState::Unloaded;
            }
        }
    }
}

impl std::fmt::Debug for ModelCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.lock_state() {
            CatalogState::Unloaded => "unloaded".to_string(),
            CatalogState::Loading { waiters, .. } => format!("loading({} waiters)", waiters),
            CatalogState::Loaded(snapshot) => format!("loaded({} models)", snapshot.len()),
        };
        f.debug_struct("ModelCatalog")
            .field("base_url", &self.gateway.base_url())
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::GatewayError;

    fn gateway_without_credential() -> GatewayClient {
        GatewayClient::new(&Config::default()).expect("should build gateway client")
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = CatalogSnapshot::new(vec![
            ModelDescriptor::new("a").with_name("Model A"),
            ModelDescriptor::new("b"),
        ]);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains("b"));
        assert!(!snapshot.contains("c"));
        assert_eq!(snapshot.get("a").and_then(|m| m.name()), Some("Model A"));
        let ids: Vec<&str> = snapshot.iter().map(|m| m.id()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_snapshot_clones_share_storage() {
        let snapshot = CatalogSnapshot::new(vec![ModelDescriptor::new("a")]);
        let clone = snapshot.clone();
        assert!(std::ptr::eq(snapshot.as_slice(), clone.as_slice()));
    }

    #[tokio::test]
    async fn test_new_catalog_is_unloaded() {
        let catalog = ModelCatalog::new(gateway_without_credential());
        assert!(!catalog.is_loaded());
        assert!(catalog.snapshot().is_none());
        assert!(format!("{:?}", catalog).contains("unloaded"));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_and_stays_unloaded() {
        let catalog = ModelCatalog::new(gateway_without_credential());
        let err = catalog.ensure_loaded().await.unwrap_err();
        assert!(matches!(err, GatewayError::Config(ref msg) if msg.contains("missing credential")));
        assert!(!catalog.is_loaded());
    }

    #[tokio::test]
    async fn test_preloaded_catalog_skips_network() {
        let snapshot = CatalogSnapshot::new(vec![ModelDescriptor::new("a")]);
        let catalog = ModelCatalog::preloaded(gateway_without_credential(), snapshot.clone());
        assert!(catalog.is_loaded());
        assert_eq!(catalog.ensure_loaded().await, Ok(snapshot));
    }
}
