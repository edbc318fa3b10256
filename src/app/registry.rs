//! Shared application registry.
//!
//! # Responsibilities
//! - Hold the single active application handle once created
//! - Fail fast when read before a handle is stored
//!
//! # Design Decisions
//! - An explicit, caller-passed value rather than hidden module state, so
//!   independent applications can coexist and tests stay isolated
//! - The lifecycle manager is the sole mutator; everyone else reads

use std::sync::{Arc, Mutex};

use axum::Router;

use crate::error::{Error, Result};

/// Handle to one application: the mutable slot the registrar mounts routes
/// into and the lifecycle manager serves from.
#[derive(Clone)]
pub struct AppHandle {
    inner: Arc<Mutex<Router>>,
}

impl AppHandle {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Router::new())),
        }
    }

    /// Merge freshly-compiled routes into the application.
    pub(crate) fn merge(&self, routes: Router) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let current = std::mem::take(&mut *guard);
        *guard = current.merge(routes);
    }

    /// Rewrap the router, used by the middleware facility to apply layers.
    pub(crate) fn map_router(&self, f: impl FnOnce(Router) -> Router) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let current = std::mem::take(&mut *guard);
        *guard = f(current);
    }

    /// Snapshot of the current router, as served by `listen`.
    pub fn router(&self) -> Router {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl std::fmt::Debug for AppHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AppHandle")
    }
}

/// Slot holding the active [`AppHandle`].
///
/// Reads before the lifecycle manager stores a handle fail with
/// [`Error::NotInitialized`].
#[derive(Clone, Default)]
pub struct AppRegistry {
    slot: Arc<Mutex<Option<AppHandle>>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the active handle, replacing any previous one.
    pub(crate) fn set(&self, handle: AppHandle) {
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(handle);
    }

    /// The active handle, or `NotInitialized` if none was stored yet.
    pub fn get(&self) -> Result<AppHandle> {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(Error::NotInitialized)
    }

    pub fn is_set(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_before_write_fails_fast() {
        let registry = AppRegistry::new();
        assert!(!registry.is_set());
        assert!(matches!(registry.get(), Err(Error::NotInitialized)));
    }

    #[test]
    fn set_then_get_returns_the_same_application() {
        let registry = AppRegistry::new();
        let handle = AppHandle::new();
        registry.set(handle.clone());
        assert!(registry.is_set());
        let fetched = registry.get().expect("handle stored");
        assert!(Arc::ptr_eq(&handle.inner, &fetched.inner));
    }

    #[test]
    fn independent_registries_do_not_leak() {
        let a = AppRegistry::new();
        let b = AppRegistry::new();
        a.set(AppHandle::new());
        assert!(a.is_set());
        assert!(!b.is_set());
    }
}
