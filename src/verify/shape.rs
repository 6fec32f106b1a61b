use crate::client::ObservedResponse;
use crate::verdict::VerifyError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

pub fn verify_status_code(res: &ObservedResponse, code: StatusCode) -> Result<(), VerifyError> {
    verify_status_codes(res, &[code])
}

pub fn verify_status_codes(
    res: &ObservedResponse,
    allowed: &[StatusCode],
) -> Result<(), VerifyError> {
    if allowed.contains(&res.status) {
        return Ok(());
    }
    let expected: Vec<u16> = allowed.iter().map(|c| c.as_u16()).collect();
    debug!(status = res.status.as_u16(), request = %res.request_line(), "Unexpected status code");
    Err(VerifyError::invalid_status(res, &expected))
}

/// Content-Type must start with `content_type` (parameters like charset are ignored)
pub fn verify_content_type(res: &ObservedResponse, content_type: &str) -> Result<(), VerifyError> {
    if res.content_type().starts_with(content_type) {
        Ok(())
    } else {
        Err(VerifyError::invalid_content_type(res, content_type))
    }
}

pub fn verify_json_body<T: DeserializeOwned>(res: &ObservedResponse) -> Result<T, VerifyError> {
    serde_json::from_slice(&res.body).map_err(|e| VerifyError::invalid_json(res, e))
}

/// Status, content type, then body: the usual shape gate of a JSON endpoint
pub fn verify_json_response<T: DeserializeOwned>(
    res: &ObservedResponse,
    code: StatusCode,
    content_type: &str,
) -> Result<T, VerifyError> {
    verify_status_code(res, code)?;
    verify_content_type(res, content_type)?;
    verify_json_body(res)
}

pub fn verify_text(res: &ObservedResponse, text: &str, expected: &str) -> Result<(), VerifyError> {
    if text == expected {
        Ok(())
    } else {
        Err(VerifyError::text_mismatch(res, expected, text))
    }
}

pub fn verify_4xx_error(
    res: &ObservedResponse,
    text: &str,
    expected_text: &str,
    expected_code: StatusCode,
) -> Result<(), VerifyError> {
    verify_status_code(res, expected_code)?;
    verify_text(res, text, expected_text)
}

pub fn verify_not_signed_in(res: &ObservedResponse, text: &str) -> Result<(), VerifyError> {
    verify_4xx_error(res, text, "you are not signed in", StatusCode::UNAUTHORIZED)
}

pub fn verify_bad_request_body(res: &ObservedResponse, text: &str) -> Result<(), VerifyError> {
    verify_4xx_error(res, text, "bad request body", StatusCode::BAD_REQUEST)
}

pub fn verify_entity_not_found(res: &ObservedResponse, text: &str) -> Result<(), VerifyError> {
    verify_4xx_error(res, text, "not found: isu", StatusCode::NOT_FOUND)
}
