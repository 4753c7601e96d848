use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope shared by every `/api` response.
#[derive(Debug, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_has_no_data() {
        let json = serde_json::to_value(ApiResponse::<()>::error("Unauthorized")).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["message"], "Unauthorized");
    }

    #[test]
    fn success_envelope_has_no_message() {
        let response = ApiResponse::success(3);
        assert!(response.is_success());
        assert_eq!(response.message(), None);
        assert_eq!(serde_json::to_value(&response).unwrap()["data"], 3);
    }
}
