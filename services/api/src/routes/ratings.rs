//! Guest rating endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{CreateRating, Rating, UpdateRating},
    state::AppState,
};

fn validate_score(score: i64) -> ApiResult<()> {
    if !(1..=5).contains(&score) {
        return Err(ApiError::BadRequest(
            "Score must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

async fn rating_or_404(state: &AppState, id: Uuid) -> ApiResult<Rating> {
    state
        .rating_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Rating"))
}

/// Rate a villa the caller has a confirmed booking for
pub async fn create_rating(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateRating>,
) -> ApiResult<impl IntoResponse> {
    validate_score(payload.score)?;

    if state
        .villa_repository
        .find_by_id(payload.villa_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Villa"));
    }

    if !state
        .booking_repository
        .has_confirmed_booking(user.id, payload.villa_id)
        .await?
    {
        return Err(ApiError::Forbidden(
            "Only guests with a confirmed booking can rate this villa".to_string(),
        ));
    }

    if state
        .rating_repository
        .exists_for(user.id, payload.villa_id)
        .await?
    {
        return Err(ApiError::Conflict(
            "You have already rated this villa".to_string(),
        ));
    }

    let rating = state.rating_repository.create(user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

/// Ratings of one villa
pub async fn villa_ratings(
    State(state): State<AppState>,
    Path(villa_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if state.villa_repository.find_by_id(villa_id).await?.is_none() {
        return Err(ApiError::NotFound("Villa"));
    }

    Ok(Json(state.rating_repository.list_for_villa(villa_id).await?))
}

/// Edit one's own rating
pub async fn update_rating(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRating>,
) -> ApiResult<impl IntoResponse> {
    let rating = rating_or_404(&state, id).await?;
    if rating.user_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the author can edit a rating".to_string(),
        ));
    }

    if let Some(score) = payload.score {
        validate_score(score)?;
    }

    let rating = state
        .rating_repository
        .update(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Rating"))?;

    Ok(Json(rating))
}

/// Remove a rating (author or admin)
pub async fn delete_rating(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let rating = rating_or_404(&state, id).await?;
    user.require_owner_or_admin(rating.user_id)?;

    state.rating_repository.delete(id).await?;
    Ok(Json(json!({"message": "Rating deleted successfully"})))
}
