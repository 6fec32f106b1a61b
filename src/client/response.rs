use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use std::collections::HashMap;
use std::fmt;

/// Sub-resource fetch results keyed by absolute URL
pub type Resources = HashMap<String, Result<ObservedResponse, FetchError>>;

/// A fully-read HTTP response together with the request that produced it.
#[derive(Debug, Clone)]
pub struct ObservedResponse {
    pub method: Method,
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ObservedResponse {
    /// Response with no headers and an empty body
    pub fn new(method: Method, url: Url, status: StatusCode) -> Self {
        Self {
            method,
            url,
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Drain a reqwest response into an observed one.
    pub async fn capture(method: Method, response: reqwest::Response) -> Result<Self, FetchError> {
        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(Self {
            method,
            url,
            status,
            headers,
            body,
        })
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON body with a matching Content-Type
    pub fn with_json<T: serde::Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .with_header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .with_body(body))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> &str {
        self.header(CONTENT_TYPE.as_str()).unwrap_or("")
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn request_line(&self) -> RequestLine {
        RequestLine {
            method: self.method.to_string(),
            path: match self.url.query() {
                Some(q) => format!("{}?{}", self.url.path(), q),
                None => self.url.path().to_string(),
            },
        }
    }
}

/// Method and path of the request behind a verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Connect,
    Other,
}

/// Transport-level failure reported by the HTTP agent
#[derive(Debug, Clone, PartialEq)]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Timeouts and connection failures may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, FetchErrorKind::Timeout | FetchErrorKind::Connect)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FetchErrorKind::Timeout => write!(f, "timeout: {}", self.message),
            FetchErrorKind::Connect => write!(f, "connect error: {}", self.message),
            FetchErrorKind::Other => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else if err.is_connect() {
            FetchErrorKind::Connect
        } else {
            FetchErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}
