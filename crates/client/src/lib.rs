//! Request interception for swcache.
//!
//! This crate provides the network collaborator, the routing policy engine,
//! the offline fallback responder, the generation lifecycle manager and the
//! [`ServiceWorker`] facade that exposes the install, fetch and activate
//! entry points to a host.

pub mod fetch;
pub mod lifecycle;
pub mod policy;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use lifecycle::{ActivateReport, ClientRegistry, InstallReport, LifecycleManager};
pub use policy::{PolicyEngine, RouteClass, RoutePolicy, Strategy, offline_response};
pub use worker::ServiceWorker;
