use crate::client::{FetchError, ObservedResponse, RequestLine};
use std::fmt;

/// Category of a verdict, for the scoring side to aggregate on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictKind {
    /// Wrong status code, content type or unparsable body
    Shape,
    TextMismatch,
    InvalidStructure,
    Ordering,
    DataMismatch,
    Fabrication,
    Checksum,
    /// Network trouble; not held against the target
    Retryable,
    /// The harness' own model is inconsistent
    Internal,
}

/// A failed verification
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyError {
    InvalidStatusCode {
        request: RequestLine,
        expected: Vec<u16>,
        actual: u16,
    },
    InvalidContentType {
        request: RequestLine,
        expected: String,
        actual: String,
    },
    InvalidJson {
        request: RequestLine,
        reason: String,
    },
    TextMismatch {
        request: RequestLine,
        expected: String,
        actual: String,
    },
    InvalidStructure {
        request: RequestLine,
        reason: String,
    },
    Ordering {
        request: RequestLine,
        reason: String,
    },
    DataMismatch {
        request: RequestLine,
        reason: String,
    },
    /// The response contains data that was never successfully written
    Fabricated {
        request: RequestLine,
        timestamp: i64,
    },
    Checksum {
        resource: String,
        reason: String,
    },
    Transient {
        resource: String,
        source: FetchError,
    },
    Internal(String),
}

impl VerifyError {
    pub fn invalid_status(res: &ObservedResponse, expected: &[u16]) -> Self {
        Self::InvalidStatusCode {
            request: res.request_line(),
            expected: expected.to_vec(),
            actual: res.status.as_u16(),
        }
    }

    pub fn invalid_content_type(res: &ObservedResponse, expected: &str) -> Self {
        Self::InvalidContentType {
            request: res.request_line(),
            expected: expected.to_string(),
            actual: res.content_type().to_string(),
        }
    }

    pub fn invalid_json(res: &ObservedResponse, reason: impl fmt::Display) -> Self {
        Self::InvalidJson {
            request: res.request_line(),
            reason: reason.to_string(),
        }
    }

    pub fn text_mismatch(res: &ObservedResponse, expected: &str, actual: &str) -> Self {
        Self::TextMismatch {
            request: res.request_line(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn invalid(res: &ObservedResponse, reason: impl Into<String>) -> Self {
        Self::InvalidStructure {
            request: res.request_line(),
            reason: reason.into(),
        }
    }

    pub fn ordering(res: &ObservedResponse, reason: impl Into<String>) -> Self {
        Self::Ordering {
            request: res.request_line(),
            reason: reason.into(),
        }
    }

    pub fn mismatch(res: &ObservedResponse, reason: impl Into<String>) -> Self {
        Self::DataMismatch {
            request: res.request_line(),
            reason: reason.into(),
        }
    }

    pub fn fabricated(res: &ObservedResponse, timestamp: i64) -> Self {
        Self::Fabricated {
            request: res.request_line(),
            timestamp,
        }
    }

    pub fn checksum(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Checksum {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> VerdictKind {
        match self {
            Self::InvalidStatusCode { .. }
            | Self::InvalidContentType { .. }
            | Self::InvalidJson { .. } => VerdictKind::Shape,
            Self::TextMismatch { .. } => VerdictKind::TextMismatch,
            Self::InvalidStructure { .. } => VerdictKind::InvalidStructure,
            Self::Ordering { .. } => VerdictKind::Ordering,
            Self::DataMismatch { .. } => VerdictKind::DataMismatch,
            Self::Fabricated { .. } => VerdictKind::Fabrication,
            Self::Checksum { .. } => VerdictKind::Checksum,
            Self::Transient { .. } => VerdictKind::Retryable,
            Self::Internal(_) => VerdictKind::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == VerdictKind::Retryable
    }

    /// Counts against the target
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), VerdictKind::Retryable | VerdictKind::Internal)
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStatusCode {
                request,
                expected,
                actual,
            } => {
                let expected: Vec<String> = expected.iter().map(|c| c.to_string()).collect();
                write!(
                    f,
                    "invalid status code {} (expected {}): {}",
                    actual,
                    expected.join(" or "),
                    request
                )
            }
            Self::InvalidContentType {
                request,
                expected,
                actual,
            } => write!(
                f,
                "invalid content type `{}` (expected `{}`): {}",
                actual, expected, request
            ),
            Self::InvalidJson { request, reason } => {
                write!(f, "unparsable JSON body ({}): {}", reason, request)
            }
            Self::TextMismatch {
                request,
                expected,
                actual,
            } => write!(
                f,
                "unexpected message `{}` (expected `{}`): {}",
                actual, expected, request
            ),
            Self::InvalidStructure { request, reason } => {
                write!(f, "invalid response ({}): {}", reason, request)
            }
            Self::Ordering { request, reason } => {
                write!(f, "response is not sorted ({}): {}", reason, request)
            }
            Self::DataMismatch { request, reason } => {
                write!(f, "response data is wrong ({}): {}", reason, request)
            }
            Self::Fabricated { request, timestamp } => write!(
                f,
                "response contains data at {} that was never posted: {}",
                timestamp, request
            ),
            Self::Checksum { resource, reason } => {
                write!(f, "resource check failed for {}: {}", resource, reason)
            }
            Self::Transient { resource, source } => {
                write!(f, "transient failure fetching {}: {}", resource, source)
            }
            Self::Internal(msg) => write!(f, "internal inconsistency: {}", msg),
        }
    }
}

impl std::error::Error for VerifyError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchErrorKind;
    use reqwest::{Method, StatusCode, Url};

    fn response() -> ObservedResponse {
        ObservedResponse::new(
            Method::GET,
            Url::parse("http://target.local/api/trend").unwrap(),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
    }

    #[test]
    fn test_kinds() {
        let res = response();
        assert_eq!(VerifyError::invalid_status(&res, &[200]).kind(), VerdictKind::Shape);
        assert_eq!(VerifyError::invalid_json(&res, "eof").kind(), VerdictKind::Shape);
        assert_eq!(VerifyError::ordering(&res, "x").kind(), VerdictKind::Ordering);
        assert_eq!(VerifyError::fabricated(&res, 5).kind(), VerdictKind::Fabrication);
        assert_eq!(VerifyError::checksum("/a.js", "x").kind(), VerdictKind::Checksum);
    }

    #[test]
    fn test_transient_is_retryable_not_fatal() {
        let err = VerifyError::Transient {
            resource: "/assets/index.js".to_string(),
            source: FetchError::new(FetchErrorKind::Timeout, "deadline"),
        };
        assert!(err.is_retryable());
        assert!(!err.is_fatal());
        assert!(VerifyError::mismatch(&response(), "name").is_fatal());
        assert!(!VerifyError::Internal("unknown entity".to_string()).is_fatal());
    }

    #[test]
    fn test_display_names_request() {
        let err = VerifyError::invalid_status(&response(), &[200, 304]);
        assert_eq!(
            err.to_string(),
            "invalid status code 500 (expected 200 or 304): GET /api/trend"
        );
    }
}
