use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// Successful submit: 303 to the next page, optionally writing the session cookie.
#[derive(Debug)]
pub struct Navigate<T = serde_json::Value> {
    pub to: &'static str,
    pub cookie: Option<String>,
    pub body: T,
}

impl Navigate {
    pub fn to(to: &'static str) -> Self {
        Self {
            to,
            cookie: None,
            body: json!({ "redirect": to }),
        }
    }
}

impl<T> Navigate<T> {
    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.cookie = Some(cookie);
        self
    }
}

impl<T: Serialize> IntoResponse for Navigate<T> {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, HeaderValue::from_static(self.to));
        if let Some(cookie) = self.cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(v) => {
                    headers.insert(header::SET_COOKIE, v);
                }
                Err(e) => tracing::error!(error = %e, "unrepresentable Set-Cookie value"),
            }
        }
        (StatusCode::SEE_OTHER, headers, Json(self.body)).into_response()
    }
}
