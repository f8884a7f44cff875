use serde::Serialize;

use crate::error::GatewayError;

/// Uniform outcome of a store action: `{success, data}` or `{success: false, error}`.
///
/// `code` carries the error classification so the presentation layer can
/// decide on navigation (e.g. send the user to login on `UNAUTHORIZED`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl ActionResult<()> {
    pub fn ok() -> Self {
        Self { success: true, data: None, error: None, code: None }
    }
}

impl<T> ActionResult<T> {
    pub fn with_data(data: T) -> Self {
        Self { success: true, data: Some(data), error: None, code: None }
    }

    pub fn failed(error: &GatewayError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            code: Some(error.error_code()),
        }
    }

    pub fn requires_login(&self) -> bool {
        matches!(self.code, Some("UNAUTHENTICATED") | Some("UNAUTHORIZED"))
    }

    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self.error.unwrap_or_else(|| "Unknown error".to_string()))
        }
    }
}
