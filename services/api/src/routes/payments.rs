//! Payment order and checkout verification endpoints
//!
//! Payment is two-phase: the guest first asks for an order for a pending
//! booking, pays through the gateway's checkout widget, then forwards the
//! signed callback to `/payments/verify`. Only a valid signature confirms
//! the booking; a forged or corrupted one fails it.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::{BookingStatus, database::is_unique_violation};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{Booking, PaymentOrder, PaymentStatus, PaymentVerification, RefundRequest},
    signature::{new_order_id, to_minor_units},
    state::AppState,
};

async fn booking_or_404(state: &AppState, id: Uuid) -> ApiResult<Booking> {
    state
        .booking_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Booking"))
}

/// Open a gateway order for the caller's pending booking
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let booking = booking_or_404(&state, booking_id).await?;
    if booking.user_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the guest can pay for a booking".to_string(),
        ));
    }

    if booking.status != BookingStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "Booking is {} and cannot be paid",
            booking.status
        )));
    }

    if state
        .payment_repository
        .find_by_booking(booking_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "A payment already exists for this booking".to_string(),
        ));
    }

    let villa = state
        .villa_repository
        .find_by_id(booking.villa_id)
        .await?
        .ok_or(ApiError::NotFound("Villa"))?;

    let config = &state.payment_config;
    let payment = state
        .payment_repository
        .create(
            booking_id,
            booking.total_price,
            &config.currency,
            &config.gateway,
            &new_order_id(),
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("A payment already exists for this booking".to_string())
            } else {
                e.into()
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentOrder {
            key_id: config.key_id.clone(),
            order_id: payment.order_id,
            amount: to_minor_units(payment.amount),
            currency: payment.currency,
            booking_id,
            payment_id: payment.id,
            villa_name: villa.name,
        }),
    ))
}

/// Check the checkout signature and settle the payment
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<PaymentVerification>,
) -> ApiResult<impl IntoResponse> {
    if payload.order_id.trim().is_empty()
        || payload.payment_id.trim().is_empty()
        || payload.signature.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "Order id, payment id and signature are required".to_string(),
        ));
    }

    let payment = state
        .payment_repository
        .find_by_order_id(payload.order_id.trim())
        .await?
        .ok_or(ApiError::NotFound("Payment"))?;

    let booking = booking_or_404(&state, payment.booking_id).await?;
    user.require_owner_or_admin(booking.user_id)?;

    if payment.status != PaymentStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "Payment is already {}",
            payment.status
        )));
    }

    let valid = state.payment_signer.verify(
        &payment.order_id,
        payload.payment_id.trim(),
        &payload.signature,
    );

    if !state
        .payment_repository
        .settle(&payment, payload.payment_id.trim(), valid)
        .await?
    {
        return Err(ApiError::Conflict(
            "Booking is no longer awaiting payment".to_string(),
        ));
    }

    if !valid {
        warn!("Signature mismatch for payment order {}", payment.order_id);
        return Err(ApiError::BadRequest(
            "Payment signature verification failed".to_string(),
        ));
    }

    info!("Payment {} verified for booking {}", payment.order_id, booking.id);

    let payment = state
        .payment_repository
        .find_by_order_id(&payment.order_id)
        .await?
        .ok_or(ApiError::NotFound("Payment"))?;
    let booking = booking_or_404(&state, booking.id).await?;

    Ok(Json(json!({
        "message": "Payment verified successfully",
        "payment": payment,
        "booking": booking,
    })))
}

/// Return part or all of a completed payment (admin)
pub async fn refund_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RefundRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let payment_id = payload
        .payment_id
        .ok_or_else(|| ApiError::BadRequest("Payment id is required".to_string()))?;
    let amount = payload
        .amount
        .ok_or_else(|| ApiError::BadRequest("Refund amount is required".to_string()))?;
    if amount < 0.01 {
        return Err(ApiError::BadRequest(
            "Refund amount must be at least 0.01".to_string(),
        ));
    }
    let reason = payload.reason.trim();
    if !(10..=500).contains(&reason.chars().count()) {
        return Err(ApiError::BadRequest(
            "Reason must be between 10 and 500 characters".to_string(),
        ));
    }

    let payment = state
        .payment_repository
        .find_by_id(payment_id)
        .await?
        .ok_or(ApiError::NotFound("Payment"))?;

    if payment.status != PaymentStatus::Completed {
        return Err(ApiError::Conflict(
            "Only completed payments can be refunded".to_string(),
        ));
    }
    if amount > payment.amount {
        return Err(ApiError::BadRequest(
            "Refund amount cannot exceed the payment amount".to_string(),
        ));
    }

    if !state.payment_repository.refund(payment.id, amount).await? {
        return Err(ApiError::Conflict(
            "Only completed payments can be refunded".to_string(),
        ));
    }
    info!(
        "Admin {} refunded {} on payment {}: {}",
        user.email, amount, payment.id, reason
    );

    let payment = state
        .payment_repository
        .find_by_id(payment.id)
        .await?
        .ok_or(ApiError::NotFound("Payment"))?;

    Ok(Json(json!({
        "message": "Refund processed successfully",
        "data": payment,
    })))
}

/// Payment of one booking (owner or admin)
pub async fn booking_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let booking = booking_or_404(&state, booking_id).await?;
    user.require_owner_or_admin(booking.user_id)?;

    let payment = state
        .payment_repository
        .find_by_booking(booking_id)
        .await?
        .ok_or(ApiError::NotFound("Payment"))?;

    Ok(Json(payment))
}

/// Every payment (admin)
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;
    Ok(Json(state.payment_repository.list().await?))
}
