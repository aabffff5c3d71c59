use std::collections::HashMap;

use axum::http::{Method, Version};

/// A request as seen by endpoint handlers.
///
/// Built from the method, raw target and connection details; the target
/// is broken down by [`HttpRequest::parse_target`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Request target exactly as received.
    pub target: String,
    pub version: Version,
    pub keep_alive: bool,
    /// Target with fragment and query removed.
    pub resource_path: String,
    /// `resource_path` split on `/`, empty segments included.
    pub path_segments: Vec<String>,
    pub query_parameters: HashMap<String, String>,
    pub fragment: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, target: impl Into<String>, version: Version, keep_alive: bool) -> Self {
        Self {
            method,
            target: target.into(),
            version,
            keep_alive,
            resource_path: String::new(),
            path_segments: Vec::new(),
            query_parameters: HashMap::new(),
            fragment: None,
        }
    }

    /// Shorthand for an HTTP/1.1 keep-alive request with the target already parsed.
    pub fn get(target: &str) -> Self {
        let mut request = Self::new(Method::GET, target, Version::HTTP_11, true);
        request.parse_target();
        request
    }

    /// Splits the raw target into fragment, query parameters, resource path
    /// and path segments.
    ///
    /// The fragment is everything after the first `#`; the query is
    /// everything between the first `?` and the fragment.
    pub fn parse_target(&mut self) {
        let mut url = self.target.as_str();

        if let Some((rest, fragment)) = url.split_once('#') {
            url = rest;
            self.fragment = Some(fragment.to_string());
        }

        if let Some((rest, query)) = url.split_once('?') {
            url = rest;
            self.query_parameters = parse_query_parameters(query);
        }

        self.resource_path = url.to_string();
        self.path_segments = url.split('/').map(str::to_string).collect();
    }

    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query_parameters.get(name).map(String::as_str)
    }
}

/// Parses `a=1&b=2`. Pairs without exactly one `=` are dropped.
pub fn parse_query_parameters(encoded: &str) -> HashMap<String, String> {
    encoded
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) => Some((key.to_string(), value.to_string())),
                _ => None,
            }
        })
        .collect()
}
