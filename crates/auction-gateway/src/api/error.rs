//! §7 "Error Handling Design" mapped onto the §6 HTTP status contract. One
//! JSON envelope shape for every error: `{code, message, ...variant fields}`.

use {
    auction_engine::domain::EngineError,
    axum::{
        http::StatusCode,
        response::{IntoResponse, Json, Response},
    },
    serde_json::json,
};

pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let message = self.0.to_string();

        let (status, body) = match &self.0 {
            EngineError::Validation { .. } => (StatusCode::BAD_REQUEST, json!({"code": code, "message": message})),
            EngineError::Authentication => (StatusCode::UNAUTHORIZED, json!({"code": code, "message": message})),
            EngineError::Authorization { current_user, expected_captain, .. } => (
                StatusCode::FORBIDDEN,
                json!({
                    "code": code,
                    "message": message,
                    "currentUser": current_user,
                    "expectedCaptain": expected_captain,
                }),
            ),
            EngineError::Precondition { .. } => (StatusCode::BAD_REQUEST, json!({"code": code, "message": message})),
            EngineError::Budget { remaining_budget, max_allowed, amount } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "code": code,
                    "message": message,
                    "remainingBudget": remaining_budget.0,
                    "maxAllowed": max_allowed.0,
                    "amount": amount.0,
                }),
            ),
            EngineError::StaleBid { current_bid, next_bid_amount, sequence_number } => (
                StatusCode::CONFLICT,
                json!({
                    "code": code,
                    "message": message,
                    "currentBid": current_bid.0,
                    "nextBidAmount": next_bid_amount.0,
                    "sequenceNumber": sequence_number,
                }),
            ),
            EngineError::NotFound { .. } => (StatusCode::NOT_FOUND, json!({"code": code, "message": message})),
            EngineError::Transient(_) => {
                tracing::error!(error = %self.0, "transient persistence failure");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"code": code, "message": "internal error"}))
            }
        };

        (status, Json(body)).into_response()
    }
}
