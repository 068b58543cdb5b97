//! The routing policy engine.
//!
//! Each intercepted request is classified, mapped to a caching strategy and
//! answered from the network, the active generation, the stored offline page
//! or a synthesized offline response, in that strategy's order.

pub mod engine;
pub mod fallback;
pub mod route;

pub use engine::PolicyEngine;
pub use fallback::{OFFLINE_HTML, offline_response};
pub use route::{RouteClass, RoutePolicy, Strategy};
