//! Application lifecycle management.
//!
//! # Responsibilities
//! - Create the application handle and store it in the registry
//! - Bind the listener and serve until shutdown
//! - Enforce the two-state lifecycle: `Uninitialized` → `Ready`
//!
//! # Design Decisions
//! - `listen` before `initialize` fails without attempting to bind a port
//! - Re-initialization replaces the handle (logged); there is no
//!   `Ready → Uninitialized` transition
//! - Startup message goes through structured logging, not stdout

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::app::registry::{AppHandle, AppRegistry};
use crate::app::shutdown::Shutdown;
use crate::error::{Error, Result};

/// Lifecycle states of an application manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Ready,
}

/// Options for [`AppManager::listen`].
#[derive(Debug, Clone)]
pub struct ListenOptions {
    /// Interface to bind, `0.0.0.0` by default.
    pub host: String,
    /// Port to bind, 3000 by default.
    pub port: u16,
    /// Startup message; defaults to one naming the bound port.
    pub message: Option<String>,
    /// Whether to log the startup message at all.
    pub log_startup: bool,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            message: None,
            log_startup: true,
        }
    }
}

impl ListenOptions {
    /// Listen on `port` with all other options defaulted.
    pub fn port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }
}

/// Creates the application, mounts it in the registry, and serves it.
pub struct AppManager {
    registry: AppRegistry,
    state: LifecycleState,
    shutdown: Shutdown,
}

impl AppManager {
    /// Manager with its own private registry.
    pub fn new() -> Self {
        Self::with_registry(AppRegistry::new())
    }

    /// Manager sharing a caller-provided registry, so other components can
    /// resolve the same handle.
    pub fn with_registry(registry: AppRegistry) -> Self {
        Self {
            registry,
            state: LifecycleState::Uninitialized,
            shutdown: Shutdown::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    /// The active handle; fails if `initialize` was never called.
    pub fn handle(&self) -> Result<AppHandle> {
        self.registry.get()
    }

    /// A trigger that completes `listen` gracefully.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Signal the serving loop to stop. Completion is observed as the
    /// pending `listen` or `launch` call resolving.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Create the application handle and transition to `Ready`.
    ///
    /// Calling again replaces the existing handle: routes mounted on the old
    /// handle are dropped from future `listen` calls. The replacement is
    /// logged because most callers do not intend it.
    pub fn initialize(&mut self) -> AppHandle {
        if self.state == LifecycleState::Ready {
            warn!("re-initializing application; the existing handle is replaced");
        }
        let handle = AppHandle::new();
        self.registry.set(handle.clone());
        self.state = LifecycleState::Ready;
        info!("application initialized");
        handle
    }

    /// Bind the listener and serve the application until shutdown.
    ///
    /// Fails with [`Error::NotInitialized`] before `initialize`; no bind is
    /// attempted in that case. Returns once the shutdown handle is
    /// triggered and in-flight requests have drained.
    pub async fn listen(&mut self, opts: ListenOptions) -> Result<()> {
        if self.state != LifecycleState::Ready {
            return Err(Error::NotInitialized);
        }
        let handle = self.registry.get()?;

        let addr = format!("{}:{}", opts.host, opts.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        if opts.log_startup {
            let message = opts
                .message
                .unwrap_or_else(|| format!("listening on port {}", local_addr.port()));
            info!(address = %local_addr, "{message}");
        }

        let mut rx = self.shutdown.subscribe();
        axum::serve(listener, handle.router())
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            })
            .await?;

        info!(address = %local_addr, "server stopped");
        Ok(())
    }

    /// `initialize` then `listen`; resolves with the handle once the server
    /// has stopped.
    pub async fn launch(&mut self, opts: ListenOptions) -> Result<AppHandle> {
        let handle = self.initialize();
        self.listen(opts).await?;
        Ok(handle)
    }
}

impl Default for AppManager {
    fn default() -> Self {
        Self::new()
    }
}
