//! Villa catalogue endpoints

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::{Availability, database::is_unique_violation};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{CreateVilla, UpdateVilla, VillaAvailability, VillaQuery},
    state::AppState,
};

fn validate_price(price: f64) -> ApiResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ApiError::BadRequest(
            "Price per night must be a positive number".to_string(),
        ));
    }
    Ok(())
}

fn validate_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

/// Search villas
pub async fn list_villas(
    State(state): State<AppState>,
    Query(query): Query<VillaQuery>,
) -> ApiResult<impl IntoResponse> {
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(ApiError::BadRequest(
                "min_price must not exceed max_price".to_string(),
            ));
        }
    }

    let villas = state.villa_repository.search(&query).await?;
    Ok(Json(villas))
}

/// Get a villa by ID
pub async fn get_villa(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let villa = state
        .villa_repository
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Villa"))?;

    Ok(Json(villa))
}

fn name_conflict(err: anyhow::Error) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::Conflict("A villa with this name already exists".to_string())
    } else {
        err.into()
    }
}

/// Create a villa (admin)
pub async fn create_villa(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateVilla>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;
    validate_text("Name", &payload.name)?;
    validate_text("Address", &payload.address)?;
    validate_price(payload.price_per_night)?;

    if state.villa_repository.name_taken(&payload.name, None).await? {
        return Err(ApiError::Conflict(
            "A villa with this name already exists".to_string(),
        ));
    }

    let villa = state
        .villa_repository
        .create(&payload)
        .await
        .map_err(name_conflict)?;
    info!("Admin {} created villa {}", user.email, villa.id);

    Ok((StatusCode::CREATED, Json(villa)))
}

/// Partially update a villa (admin)
pub async fn update_villa(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVilla>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    if let Some(name) = &payload.name {
        validate_text("Name", name)?;
        if state.villa_repository.name_taken(name, Some(id)).await? {
            return Err(ApiError::Conflict(
                "A villa with this name already exists".to_string(),
            ));
        }
    }
    if let Some(address) = &payload.address {
        validate_text("Address", address)?;
    }
    if let Some(price) = payload.price_per_night {
        validate_price(price)?;
    }

    let villa = state
        .villa_repository
        .update(id, &payload)
        .await
        .map_err(name_conflict)?
        .ok_or(ApiError::NotFound("Villa"))?;

    Ok(Json(villa))
}

/// Delete a villa that has never been booked (admin)
pub async fn delete_villa(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    if state.villa_repository.find_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound("Villa"));
    }

    if state.villa_repository.has_bookings(id).await? {
        return Err(ApiError::Conflict(
            "Cannot delete a villa with existing bookings".to_string(),
        ));
    }

    state.villa_repository.delete(id).await?;
    info!("Admin {} deleted villa {}", user.email, id);

    Ok(Json(json!({"message": "Villa deleted successfully"})))
}

/// Intervals held by pending and confirmed bookings
pub async fn villa_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if state.villa_repository.find_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound("Villa"));
    }

    let bookings = state.booking_repository.active_for_villa(id).await?;
    let availability = Availability::from_reservations(&bookings);

    Ok(Json(VillaAvailability {
        villa_id: id,
        booked: availability.intervals().to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::name_conflict;
    use crate::{
        error::ApiError,
        models::CreateVilla,
        routes::test_support::TestApp,
    };
    use axum::http::StatusCode;
    use common::Role;
    use serde_json::json;

    #[tokio::test]
    async fn lost_name_race_is_a_conflict() {
        let app = TestApp::new().await;
        let payload = CreateVilla {
            name: "Casa Azul".to_string(),
            description: String::new(),
            address: "Goa".to_string(),
            price_per_night: 100.0,
            image_urls: vec![],
        };
        app.state.villa_repository.create(&payload).await.unwrap();

        let err = app.state.villa_repository.create(&payload).await.unwrap_err();
        let err = name_conflict(err);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = name_conflict(anyhow::anyhow!("disk full"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn only_admins_manage_the_catalogue() {
        let app = TestApp::new().await;
        let admin = app.user("root@example.com", Role::Admin).await;
        let guest = app.user("ada@example.com", Role::User).await;

        let (status, _) = app
            .send(
                "POST",
                "/villas",
                Some(json!({"name": "Casa", "address": "Goa", "price_per_night": 100.0})),
                Some(&guest.token),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let id = app.villa(&admin, "Casa Azul", 120.0).await;

        let (status, body) = app
            .send("GET", &format!("/villas/{id}"), None, Some(&guest.token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Casa Azul");
        assert_eq!(body["total_ratings"], 0);

        let (status, _) = app
            .send(
                "PUT",
                &format!("/villas/{id}"),
                Some(json!({"price_per_night": 90.0})),
                Some(&guest.token),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(
                "PUT",
                &format!("/villas/{id}"),
                Some(json!({"price_per_night": 90.0})),
                Some(&admin.token),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price_per_night"], 90.0);
        assert_eq!(body["name"], "Casa Azul");
    }

    #[tokio::test]
    async fn rejects_duplicate_names_and_bad_prices() {
        let app = TestApp::new().await;
        let admin = app.user("root@example.com", Role::Admin).await;
        app.villa(&admin, "Casa Azul", 120.0).await;
        let other = app.villa(&admin, "Hilltop", 200.0).await;

        let (status, _) = app
            .send(
                "POST",
                "/villas",
                Some(json!({"name": "casa azul", "address": "Goa", "price_per_night": 100.0})),
                Some(&admin.token),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .send(
                "PUT",
                &format!("/villas/{other}"),
                Some(json!({"name": "Casa Azul"})),
                Some(&admin.token),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .send(
                "POST",
                "/villas",
                Some(json!({"name": "Free", "address": "Goa", "price_per_night": 0.0})),
                Some(&admin.token),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_applies_filters_and_sort() {
        let app = TestApp::new().await;
        let admin = app.user("root@example.com", Role::Admin).await;
        app.villa(&admin, "Casa Azul", 120.0).await;
        app.villa(&admin, "Hilltop", 200.0).await;
        app.villa(&admin, "Palm Retreat", 80.0).await;

        let (status, body) = app
            .send(
                "GET",
                "/villas?min_price=100&sort=price_desc",
                None,
                Some(&admin.token),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Hilltop", "Casa Azul"]);

        let (status, body) = app
            .send("GET", "/villas?q=palm", None, Some(&admin.token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = app
            .send(
                "GET",
                "/villas?min_price=300&max_price=100",
                None,
                Some(&admin.token),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn booked_villas_cannot_be_deleted() {
        let app = TestApp::new().await;
        let admin = app.user("root@example.com", Role::Admin).await;
        let guest = app.user("ada@example.com", Role::User).await;
        let booked = app.villa(&admin, "Casa Azul", 120.0).await;
        let empty = app.villa(&admin, "Hilltop", 200.0).await;

        let (status, _) = app.book(&guest, &booked, 5, 2).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = app
            .send("GET", &format!("/villas/{booked}/availability"), None, Some(&guest.token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["booked"].as_array().unwrap().len(), 1);

        let (status, _) = app
            .send("DELETE", &format!("/villas/{booked}"), None, Some(&admin.token))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .send("DELETE", &format!("/villas/{empty}"), None, Some(&admin.token))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send("GET", &format!("/villas/{empty}"), None, Some(&admin.token))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
