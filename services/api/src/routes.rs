//! API service routes

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{middleware::auth_middleware, state::AppState};

pub mod bookings;
pub mod payments;
pub mod ratings;
pub mod villas;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/villas", get(villas::list_villas).post(villas::create_villa))
        .route(
            "/villas/:id",
            get(villas::get_villa)
                .put(villas::update_villa)
                .delete(villas::delete_villa),
        )
        .route("/villas/:id/availability", get(villas::villa_availability))
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/check-availability",
            post(bookings::check_availability),
        )
        .route("/bookings/mine", get(bookings::my_bookings))
        .route("/bookings/summary", get(bookings::booking_summary))
        .route("/bookings/user/:id", get(bookings::user_bookings))
        .route(
            "/bookings/:id",
            get(bookings::get_booking).delete(bookings::delete_booking),
        )
        .route("/bookings/:id/confirm", patch(bookings::confirm_booking))
        .route("/bookings/:id/cancel", patch(bookings::cancel_booking))
        .route("/ratings", post(ratings::create_rating))
        .route("/ratings/villa/:id", get(ratings::villa_ratings))
        .route(
            "/ratings/:id",
            put(ratings::update_rating).delete(ratings::delete_rating),
        )
        .route("/payments", get(payments::list_payments))
        .route("/payments/orders/:booking_id", post(payments::create_order))
        .route("/payments/verify", post(payments::verify_payment))
        .route("/payments/refund", post(payments::refund_payment))
        .route(
            "/payments/booking/:booking_id",
            get(payments::booking_payment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use chrono::{Duration, NaiveDate, Utc};
    use common::{
        Role,
        database::init_memory_pool,
        token::{Claims, JwtConfig},
    };
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::{Value, json};
    use sqlx::SqlitePool;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::create_router;
    use crate::{config::PaymentConfig, state::AppState};

    pub const SECRET: &str = "api-test-secret";
    pub const PAYMENT_SECRET: &str = "payment-test-secret";

    /// Router over a fresh in-memory database
    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
        pub pool: SqlitePool,
    }

    pub struct TestUser {
        pub id: Uuid,
        pub token: String,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let pool = init_memory_pool().await.unwrap();
            let state = AppState::new(
                pool.clone(),
                &JwtConfig {
                    secret: SECRET.to_string(),
                    token_expiry: 3600,
                },
                PaymentConfig {
                    key_id: "rzp_test_key".to_string(),
                    key_secret: PAYMENT_SECRET.to_string(),
                    currency: "INR".to_string(),
                    gateway: "razorpay".to_string(),
                },
            );

            Self {
                router: create_router(state.clone()),
                state,
                pool,
            }
        }

        /// Insert a user row and mint a token for it
        pub async fn user(&self, email: &str, role: Role) -> TestUser {
            let id = Uuid::new_v4();
            let now = Utc::now();
            sqlx::query(
                "INSERT INTO users (id, name, email, mobile, password_hash, role, active, created_at, updated_at) VALUES (?, ?, ?, ?, 'x', ?, 1, ?, ?)",
            )
            .bind(id)
            .bind(email.split('@').next().unwrap())
            .bind(email)
            .bind(id.simple().to_string())
            .bind(role.as_str())
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .unwrap();

            let iat = now.timestamp() as u64;
            let claims = Claims {
                sub: id,
                email: email.to_string(),
                role,
                iat,
                exp: iat + 3600,
            };
            let token = encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret(SECRET.as_bytes()),
            )
            .unwrap();

            TestUser { id, token }
        }

        pub async fn send(
            &self,
            method: &str,
            uri: &str,
            body: Option<Value>,
            token: Option<&str>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        /// Create a villa through the API as `admin`, returning its id
        pub async fn villa(&self, admin: &TestUser, name: &str, price: f64) -> String {
            let (status, body) = self
                .send(
                    "POST",
                    "/villas",
                    Some(json!({
                        "name": name,
                        "address": "Goa",
                        "description": "Sea view",
                        "price_per_night": price,
                        "image_urls": ["https://img.example.com/1.jpg"],
                    })),
                    Some(&admin.token),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["id"].as_str().unwrap().to_string()
        }

        /// Book `nights` nights starting `offset` days from today
        pub async fn book(
            &self,
            guest: &TestUser,
            villa_id: &str,
            offset: i64,
            nights: i64,
        ) -> (StatusCode, Value) {
            let check_in = days_from_today(offset);
            let check_out = days_from_today(offset + nights);
            self.send(
                "POST",
                "/bookings",
                Some(json!({
                    "villa_id": villa_id,
                    "check_in": check_in,
                    "check_out": check_out,
                })),
                Some(&guest.token),
            )
            .await
        }
    }

    pub fn days_from_today(offset: i64) -> NaiveDate {
        Utc::now().date_naive() + Duration::days(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::TestApp;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_is_public_and_everything_else_is_not() {
        let app = TestApp::new().await;

        let (status, body) = app.send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "api-service");

        let (status, _) = app.send("GET", "/villas", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.send("GET", "/villas", None, Some("not-a-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
