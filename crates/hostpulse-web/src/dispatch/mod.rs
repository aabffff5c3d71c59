//! Request dispatch: target parsing and exact-match route resolution.
//!
//! Routes are keyed by `"<METHOD>:<path>"` with the path lowercased and a
//! trailing slash enforced, so `/Resource`, `/resource/` and `/RESOURCE`
//! resolve to the same handler. There are no wildcards.

mod request;
mod response;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::Method;
use tracing::debug;

pub use request::{HttpRequest, parse_query_parameters};
pub use response::{HttpResponse, responses};

/// Handler bound to a route.
pub type Endpoint = Arc<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// Builds the route table key for `method` and `resource`.
pub fn route_key(method: &Method, resource: &str) -> String {
    let mut path = resource.to_lowercase();
    if !path.ends_with('/') {
        path.push('/');
    }
    format!("{}:{}", method.as_str(), path)
}

/// Route table plus the request parsing pipeline.
#[derive(Default)]
pub struct Dispatcher {
    routes: HashMap<String, Endpoint>,
    request_count: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` + `resource`. A later registration
    /// under the same key replaces the earlier one.
    pub fn add_route<H>(&mut self, method: Method, resource: &str, handler: H)
    where
        H: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        let key = route_key(&method, resource);
        debug!(route = %key, "route registered");
        self.routes.insert(key, Arc::new(handler));
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Number of requests dispatched so far.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Parses `request`'s target and runs the matching handler.
    ///
    /// An empty target or an unmatched route yields 400 Bad Request.
    pub fn dispatch(&self, mut request: HttpRequest) -> HttpResponse {
        let request_id = self.request_count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            request_id,
            method = %request.method,
            uri = %request.target,
            version = ?request.version,
            "dispatching"
        );

        if request.target.is_empty() {
            debug!(request_id, "target is empty");
            return responses::bad_request(request.keep_alive);
        }

        request.parse_target();
        match self.lookup(&request) {
            Some(endpoint) => endpoint(&request),
            None => responses::bad_request(request.keep_alive),
        }
    }

    fn lookup(&self, request: &HttpRequest) -> Option<&Endpoint> {
        let key = route_key(&request.method, &request.resource_path);
        let endpoint = self.routes.get(&key);
        if endpoint.is_some() {
            debug!(route = %key, "matched");
        } else {
            debug!(route = %key, "no route");
        }
        endpoint
    }
}
