use crate::auth::Caller;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use scholar_core::{ApplicationOutcome, CheckoutRequest, Currency, Scholarship};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Body of POST /create-checkout-session
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutBody {
    pub scholarship_id: String,
    pub application_fees: f64,
    pub scholarship_name: String,
    #[serde(default)]
    pub university_image: Option<String>,
    #[serde(default)]
    pub student_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutUrlResponse {
    pub url: String,
}

/// Body of POST /payment-success
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSuccessBody {
    #[serde(default)]
    pub session_id: String,
}

/// POST /create-checkout-session
#[instrument(skip(state, caller, body), fields(student = %caller.email(), scholarship_id = %body.scholarship_id))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(body): ApiJson<CreateCheckoutBody>,
) -> ApiResult<Json<CheckoutUrlResponse>> {
    let student_name = body
        .student_name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| caller.name().map(str::to_string))
        .unwrap_or_default();

    let request = CheckoutRequest {
        scholarship_id: body.scholarship_id,
        display_name: body.scholarship_name,
        image_url: body.university_image,
        amount: body.application_fees,
        currency: Currency::USD,
        student_name,
        student_email: caller.email().to_string(),
    };

    let url = state.checkout.create_session(&request).await?;
    Ok(Json(CheckoutUrlResponse { url }))
}

/// POST /payment-success: reconcile the session, answer with its scholarship
#[instrument(skip(state, caller, body), fields(student = %caller.email()))]
pub async fn payment_success(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(body): ApiJson<PaymentSuccessBody>,
) -> ApiResult<Json<Option<Scholarship>>> {
    let reconciliation = state.checkout.reconcile(&body.session_id).await?;

    if let ApplicationOutcome::Created(id) = reconciliation.outcome {
        info!("Payment recorded as application {}", id);
    }

    Ok(Json(reconciliation.scholarship))
}
