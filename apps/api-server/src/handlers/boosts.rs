use actix_web::{HttpRequest, HttpResponse, web};
use gateway_core::services::ActionKind;
use gateway_shared::dto::{CheckoutRequest, CheckoutResponse};

use crate::middleware::auth::{BearerToken, RequestCaller, identify};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/boosts/checkout
pub async fn create_checkout(
    req: HttpRequest,
    state: web::Data<AppState>,
    token: BearerToken,
    body: web::Json<CheckoutRequest>,
) -> AppResult<HttpResponse> {
    let RequestCaller { subject, caller } = identify(&state, &token, &req).await;
    state.guard.enforce(ActionKind::StartCheckout, &subject).await?;

    let CheckoutRequest {
        target_post_id,
        boost_type,
        duration_days,
    } = body.into_inner();

    let redirect = state
        .checkout
        .create_boost_checkout(caller, target_post_id, &boost_type, duration_days)
        .await?;

    Ok(HttpResponse::Ok().json(CheckoutResponse {
        redirect_url: redirect.redirect_url,
        boost_id: redirect.boost_id,
    }))
}
