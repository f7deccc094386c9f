//! Booking lifecycle endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use common::{Availability, BookingStatus, DateRange};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{AvailabilityRequest, AvailabilityResponse, Booking, CreateBooking, Villa},
    repositories::NewBookingOutcome,
    state::AppState,
};

fn stay(check_in: NaiveDate, check_out: NaiveDate) -> ApiResult<DateRange> {
    if check_in < Utc::now().date_naive() {
        return Err(ApiError::BadRequest(
            "Check-in date cannot be in the past".to_string(),
        ));
    }

    DateRange::new(check_in, check_out).ok_or_else(|| {
        ApiError::BadRequest("Check-out date must be after check-in date".to_string())
    })
}

fn price_for(villa: &Villa, range: &DateRange) -> f64 {
    villa.price_per_night * range.nights() as f64
}

async fn villa_or_404(state: &AppState, id: Uuid) -> ApiResult<Villa> {
    state
        .villa_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Villa"))
}

async fn booking_or_404(state: &AppState, id: Uuid) -> ApiResult<Booking> {
    state
        .booking_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Booking"))
}

async fn move_booking(state: &AppState, booking: &Booking, to: BookingStatus) -> ApiResult<Booking> {
    if !booking.status.can_transition_to(to) {
        return Err(ApiError::Conflict(format!(
            "Booking cannot move from {} to {}",
            booking.status, to
        )));
    }

    if !state
        .booking_repository
        .transition(booking.id, booking.status, to)
        .await?
    {
        return Err(ApiError::Conflict(
            "Booking changed concurrently, reload and retry".to_string(),
        ));
    }

    booking_or_404(state, booking.id).await
}

/// Book a villa for the caller
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateBooking>,
) -> ApiResult<impl IntoResponse> {
    let range = stay(payload.check_in, payload.check_out)?;
    let villa = villa_or_404(&state, payload.villa_id).await?;

    let outcome = state
        .booking_repository
        .create(user.id, villa.id, range, price_for(&villa, &range))
        .await?;

    match outcome {
        NewBookingOutcome::Created(booking) => Ok((StatusCode::CREATED, Json(booking))),
        NewBookingOutcome::Overlaps(held) => Err(ApiError::Conflict(format!(
            "Villa is already booked from {} to {}",
            held.start, held.end
        ))),
    }
}

/// Whether a stay is free, and what it would cost
pub async fn check_availability(
    State(state): State<AppState>,
    Json(payload): Json<AvailabilityRequest>,
) -> ApiResult<impl IntoResponse> {
    let range = stay(payload.check_in, payload.check_out)?;
    let villa = villa_or_404(&state, payload.villa_id).await?;

    let bookings = state.booking_repository.active_for_villa(villa.id).await?;
    let conflict = Availability::from_reservations(&bookings).first_conflict(&range);

    Ok(Json(AvailabilityResponse {
        villa_id: villa.id,
        check_in: range.start,
        check_out: range.end,
        available: conflict.is_none(),
        number_of_nights: range.nights(),
        estimated_price: price_for(&villa, &range),
        conflict,
    }))
}

/// Every booking (admin)
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;
    Ok(Json(state.booking_repository.list_all().await?))
}

/// The caller's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.booking_repository.list_for_user(user.id).await?))
}

/// One user's bookings (self or admin)
pub async fn user_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require_owner_or_admin(user_id)?;
    Ok(Json(state.booking_repository.list_for_user(user_id).await?))
}

/// Counts per status and revenue (admin)
pub async fn booking_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;
    Ok(Json(state.booking_repository.summary().await?))
}

/// One booking (owner or admin)
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let booking = booking_or_404(&state, id).await?;
    user.require_owner_or_admin(booking.user_id)?;
    Ok(Json(booking))
}

/// Confirm a pending booking without a payment (admin)
pub async fn confirm_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;
    let booking = booking_or_404(&state, id).await?;
    let booking = move_booking(&state, &booking, BookingStatus::Confirmed).await?;

    info!("Admin {} confirmed booking {}", user.email, id);
    Ok(Json(booking))
}

/// Cancel a booking up to its check-in day (owner or admin)
///
/// A paid booking has its payment refunded in the same transaction.
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let booking = booking_or_404(&state, id).await?;
    user.require_owner_or_admin(booking.user_id)?;

    if Utc::now().date_naive() > booking.check_in {
        return Err(ApiError::BadRequest(
            "Bookings cannot be cancelled after the check-in date".to_string(),
        ));
    }

    if !booking.status.can_transition_to(BookingStatus::Cancelled) {
        return Err(ApiError::Conflict(format!(
            "Booking cannot move from {} to {}",
            booking.status,
            BookingStatus::Cancelled
        )));
    }

    if !state.booking_repository.cancel(&booking).await? {
        return Err(ApiError::Conflict(
            "Booking changed concurrently, reload and retry".to_string(),
        ));
    }
    info!("Booking {} cancelled by {}", id, user.email);

    Ok(Json(booking_or_404(&state, id).await?))
}

/// Delete a booking and its payment (admin)
pub async fn delete_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    if !state.booking_repository.delete(id).await? {
        return Err(ApiError::NotFound("Booking"));
    }

    Ok(Json(json!({"message": "Booking deleted successfully"})))
}
