//! hostpulse-web: HTTP half of the hostpulse agent.
//!
//! Provides:
//! - `dispatch`: request target parsing and exact-match routing
//! - `handlers`: the `/v0` JSON endpoints over the snapshot store
//! - `listener`: bounded accept loop and the axum router
//! - `deadline`: write-stall timeout for session streams
//! - `background`: the periodic collector task

pub mod background;
pub mod deadline;
pub mod dispatch;
pub mod handlers;
pub mod listener;

use std::sync::Arc;

use hostpulse_core::Store;

pub use dispatch::Dispatcher;
pub use listener::{ListenerConfig, app, serve};

/// Dispatcher with every API route registered against `store`.
pub fn api_dispatcher(store: Arc<Store>) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    handlers::register(&mut dispatcher, store);
    dispatcher
}
