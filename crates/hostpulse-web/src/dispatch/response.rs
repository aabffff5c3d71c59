use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// A response produced by an endpoint handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    /// `false` makes the connection close after this response.
    pub keep_alive: bool,
    pub content_type: &'static str,
    pub body: String,
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response();
        if !self.keep_alive {
            response
                .headers_mut()
                .insert(header::CONNECTION, HeaderValue::from_static("close"));
        }
        response
    }
}

/// Builders for the responses the server sends.
pub mod responses {
    use super::*;

    const JSON: &str = "application/json";
    const TEXT: &str = "text/html";

    pub fn ok(keep_alive: bool, body: impl Into<String>) -> HttpResponse {
        HttpResponse {
            status: StatusCode::OK,
            keep_alive,
            content_type: JSON,
            body: body.into(),
        }
    }

    pub fn bad_request(keep_alive: bool) -> HttpResponse {
        HttpResponse {
            status: StatusCode::BAD_REQUEST,
            keep_alive,
            content_type: TEXT,
            body: "Bad request".to_string(),
        }
    }

    pub fn not_found(keep_alive: bool, target: &str) -> HttpResponse {
        HttpResponse {
            status: StatusCode::NOT_FOUND,
            keep_alive,
            content_type: TEXT,
            body: format!("The resource '{}' was not found.", target),
        }
    }

    pub fn server_error(keep_alive: bool) -> HttpResponse {
        HttpResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            keep_alive,
            content_type: TEXT,
            body: "Server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let ok = responses::ok(true, "{}");
        assert_eq!(ok.status, StatusCode::OK);
        assert_eq!(ok.content_type, "application/json");
        assert_eq!(ok.body, "{}");

        assert_eq!(responses::bad_request(true).body, "Bad request");
        assert_eq!(
            responses::not_found(true, "/x").body,
            "The resource '/x' was not found."
        );
        assert_eq!(
            responses::server_error(false).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_headers() {
        let response = responses::ok(true, "[]").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert!(response.headers().get(header::CONNECTION).is_none());
    }

    #[test]
    fn test_close_when_not_keep_alive() {
        let response = responses::bad_request(false).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONNECTION], "close");
    }
}
