use crate::{error::AppError, state::AppState};
use actix_web::{post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ResetRequestBody {
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetConfirmBody {
    pub email: String,
    pub code: String,
    /// Same length rule as registration.
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequestResponse {
    pub accepted: bool,
    /// Only present when the server runs with `APP_ENV=development`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_code: Option<String>,
}

/// Starts a password reset.
///
/// Issues a six-digit code for the account and emails it. The response does not depend
/// on whether delivery succeeded.
///
/// ## Responses:
/// - `200 OK`: `{ "accepted": true }`, plus `devCode` in development mode.
/// - `404 Not Found`: no account for the email.
#[post("/request")]
pub async fn request_reset(
    state: web::Data<AppState>,
    body: web::Json<ResetRequestBody>,
) -> Result<impl Responder, AppError> {
    let outcome = state.password_reset.request_reset(&body.email).await?;
    Ok(HttpResponse::Ok().json(ResetRequestResponse {
        accepted: true,
        dev_code: outcome.dev_code,
    }))
}

/// Completes a password reset with the emailed code.
///
/// ## Responses:
/// - `200 OK`: `{ "success": true }`; the code is spent.
/// - `400 Bad Request`: wrong, unknown, used or expired code.
/// - `404 Not Found`: the account no longer exists.
/// - `422 Unprocessable Entity`: the new password is too short or too long.
#[post("/confirm")]
pub async fn confirm_reset(
    state: web::Data<AppState>,
    body: web::Json<ResetConfirmBody>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    state
        .password_reset
        .confirm_reset(&body.email, &body.code, &body.new_password)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
