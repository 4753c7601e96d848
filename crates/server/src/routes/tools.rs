use axum::{
    Json, Router,
    http::header,
    response::{IntoResponse, Json as ResponseJson},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tools::{
    calculator,
    email_extractor::{extract_emails, to_csv},
    password::{PasswordStrength, password_strength},
    profitability::{ProfitabilityInput, ProfitabilityReport, analyze},
    word_counter::{TextStats, text_stats},
};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Deserialize, TS)]
pub struct TextInput {
    pub text: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct PasswordInput {
    pub password: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct ExpressionInput {
    pub expression: String,
}

#[derive(Debug, Serialize, TS)]
pub struct CalculationResult {
    pub result: f64,
}

#[derive(Debug, Serialize, TS)]
pub struct ExtractedEmails {
    pub count: usize,
    pub emails: Vec<String>,
}

pub async fn check_password(
    Json(payload): Json<PasswordInput>,
) -> ResponseJson<ApiResponse<PasswordStrength>> {
    ResponseJson(ApiResponse::success(password_strength(&payload.password)))
}

pub async fn count_words(Json(payload): Json<TextInput>) -> ResponseJson<ApiResponse<TextStats>> {
    ResponseJson(ApiResponse::success(text_stats(&payload.text)))
}

pub async fn calculate(
    Json(payload): Json<ExpressionInput>,
) -> Result<ResponseJson<ApiResponse<CalculationResult>>, ApiError> {
    match calculator::evaluate(&payload.expression) {
        Ok(result) => Ok(ResponseJson(ApiResponse::success(CalculationResult { result }))),
        Err(err) => {
            tracing::debug!(expression = %payload.expression, error = %err, "calculation rejected");
            Err(ApiError::BadRequest("Erreur".to_string()))
        }
    }
}

pub async fn extract(Json(payload): Json<TextInput>) -> ResponseJson<ApiResponse<ExtractedEmails>> {
    let emails = extract_emails(&payload.text);
    ResponseJson(ApiResponse::success(ExtractedEmails {
        count: emails.len(),
        emails,
    }))
}

pub async fn extract_csv(Json(payload): Json<TextInput>) -> impl IntoResponse {
    let csv = to_csv(&extract_emails(&payload.text));
    (
        [
            (header::CONTENT_TYPE, "text/csv;charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"emails_extraits.csv\"",
            ),
        ],
        csv,
    )
}

pub async fn profitability(
    Json(payload): Json<ProfitabilityInput>,
) -> Result<ResponseJson<ApiResponse<ProfitabilityReport>>, ApiError> {
    let report = analyze(&payload).map_err(|err| ApiError::BadRequest(err.to_string()))?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router() -> Router<DeploymentImpl> {
    let inner = Router::new()
        .route("/password-strength", post(check_password))
        .route("/word-count", post(count_words))
        .route("/calculator", post(calculate))
        .route("/emails", post(extract))
        .route("/emails/csv", post(extract_csv))
        .route("/profitability", post(profitability));

    Router::new().nest("/tools", inner)
}
