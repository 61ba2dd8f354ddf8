use serde::Deserialize;

use crate::api::foxess::ApiError;

/// Generic API response.
///
/// The result is kept as [`serde_json::Value`] in order to log it,
/// and only then parsed into the operation's payload.
#[derive(Deserialize)]
pub struct Response {
    /// Error code (when the result is not equal to zero, the request failed).
    #[serde(rename = "errno")]
    error_code: i64,

    #[serde(rename = "msg")]
    message: Option<String>,

    #[serde(rename = "result", default)]
    result: Option<serde_json::Value>,
}

impl Response {
    /// Codes FoxESS Cloud responds with for an invalid token.
    const AUTH_ERROR_CODES: [i64; 1] = [41800];
}

impl From<Response> for Result<serde_json::Value, ApiError> {
    fn from(response: Response) -> Self {
        if response.error_code == 0 {
            return Ok(response
                .result
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())));
        }
        let description = response.message.map_or_else(
            || format!("FoxESS Cloud error {}", response.error_code),
            |message| format!(r#"FoxESS Cloud error {} ("{message}")"#, response.error_code),
        );
        if Response::AUTH_ERROR_CODES.contains(&response.error_code) {
            Err(ApiError::Auth(description))
        } else {
            Err(ApiError::InvalidResponse(description))
        }
    }
}
