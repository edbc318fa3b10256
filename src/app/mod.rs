//! Application lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! AppManager::initialize()
//!     → AppHandle created, stored in AppRegistry, state = Ready
//!     → RouteRegistrar::attach_to / MiddlewareFacility::apply mutate the handle
//!
//! AppManager::listen(opts)
//!     → bind TcpListener → serve snapshot of the handle's router
//!     → Shutdown::trigger() → drain in-flight requests → listen resolves
//! ```
//!
//! # Design Decisions
//! - Registry is explicit and caller-passed; no process-global state
//! - Two lifecycle states only: Uninitialized and Ready
//! - Single-threaded callers need no locks; the handle's internal mutex
//!   only serializes mount-time mutations

pub mod manager;
pub mod registry;
pub mod shutdown;

pub use manager::{AppManager, LifecycleState, ListenOptions};
pub use registry::{AppHandle, AppRegistry};
pub use shutdown::Shutdown;
