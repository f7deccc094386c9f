//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::{Role, database::is_unique_violation, token::Claims};
use serde::Serialize;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    middleware::{auth_middleware, require_admin},
    models::{LoginCredentials, NewUser, PasswordChange, SignupRequest, UpdateUser, UserProfile},
    repositories::user::verify_password,
    validation::{normalize_email, validate_email, validate_mobile, validate_name, validate_password},
};

/// Response for user signup
#[derive(Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserProfile,
}

/// Response for user login
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub role: Role,
    pub token_type: String,
    pub expires_in: u64,
}

/// Response for profile lookups
#[derive(Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserProfile,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin", get(admin_welcome))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/activate", patch(activate_user))
        .route("/admin/users/:id/deactivate", patch(deactivate_user))
        .route_layer(middleware::from_fn(require_admin));

    let protected_routes = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/password", post(change_password))
        .merge(admin_routes)
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
        .route("/users/signup", post(signup))
        .route("/users/login", post(login))
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

fn required(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// User signup endpoint
///
/// Accounts are created with the `USER` role. Asking for `ADMIN` only
/// succeeds when the request is itself authenticated as an admin.
pub async fn signup(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(payload): Json<SignupRequest>,
) -> AuthResult<impl IntoResponse> {
    let (Some(name), Some(email), Some(password), Some(mobile)) = (
        required(payload.name),
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
        required(payload.mobile),
    ) else {
        return Err(AuthError::BadRequest("All fields are required".to_string()));
    };

    let email = normalize_email(&email);
    validate_name(&name).map_err(AuthError::BadRequest)?;
    validate_email(&email).map_err(AuthError::BadRequest)?;
    validate_mobile(&mobile).map_err(AuthError::BadRequest)?;
    validate_password(&password).map_err(AuthError::BadRequest)?;

    let role = match payload.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        None => Role::User,
        Some(requested) => requested
            .parse::<Role>()
            .map_err(|e| AuthError::BadRequest(e.to_string()))?,
    };

    if role.is_admin() {
        let caller_is_admin = bearer
            .and_then(|TypedHeader(Authorization(bearer))| {
                state.jwt_service.validate_token(bearer.token()).ok()
            })
            .is_some_and(|claims| claims.role.is_admin());

        if !caller_is_admin {
            warn!("Rejected self-elevation to ADMIN for {}", email);
            return Err(AuthError::Forbidden(
                "Only an administrator can create administrator accounts".to_string(),
            ));
        }
    }

    if state
        .user_repository
        .exists_by_email_or_mobile(&email, &mobile)
        .await?
    {
        return Err(AuthError::Conflict(
            "User already exists with this email or mobile".to_string(),
        ));
    }

    let user = state
        .user_repository
        .create(&NewUser {
            name,
            email,
            mobile,
            password,
            role,
        })
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::Conflict("User already exists with this email or mobile".to_string())
            } else {
                e.into()
            }
        })?;

    info!("Registered user {} with role {}", user.id, user.role);

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully".to_string(),
            user: UserProfile::from(&user),
        }),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> AuthResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    info!("Login attempt for user: {}", email);

    if !state.rate_limiter.is_allowed(&email).await {
        return Err(AuthError::TooManyRequests);
    }

    let user = state
        .user_repository
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !verify_password(&user, &payload.password)? {
        return Err(AuthError::InvalidCredentials);
    }

    if !user.active {
        return Err(AuthError::Forbidden("Account is deactivated".to_string()));
    }

    state.rate_limiter.reset(&email).await;
    let token = state.jwt_service.generate_token(&user)?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token,
            role: user.role,
            token_type: "Bearer".to_string(),
            expires_in: state.jwt_service.token_expiry(),
        }),
    ))
}

/// Profile of the identity bound to the bearer token
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AuthResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(ProfileResponse {
        message: "User profile".to_string(),
        user: UserProfile::from(&user),
    }))
}

/// Update name and/or mobile of the caller
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateUser>,
) -> AuthResult<impl IntoResponse> {
    let update = UpdateUser {
        name: required(payload.name),
        mobile: required(payload.mobile),
    };

    if let Some(name) = &update.name {
        validate_name(name).map_err(AuthError::BadRequest)?;
    }

    if let Some(mobile) = &update.mobile {
        validate_mobile(mobile).map_err(AuthError::BadRequest)?;
        if state
            .user_repository
            .mobile_taken_by_other(mobile, claims.sub)
            .await?
        {
            return Err(AuthError::Conflict(
                "Mobile number is already registered".to_string(),
            ));
        }
    }

    let user = state
        .user_repository
        .update_profile(claims.sub, &update)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::Conflict("Mobile number is already registered".to_string())
            } else {
                e.into()
            }
        })?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(ProfileResponse {
        message: "Profile updated".to_string(),
        user: UserProfile::from(&user),
    }))
}

/// Change the caller's password after verifying the current one
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PasswordChange>,
) -> AuthResult<impl IntoResponse> {
    validate_password(&payload.new_password).map_err(AuthError::BadRequest)?;

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !verify_password(&user, &payload.current_password)? {
        return Err(AuthError::InvalidCredentials);
    }

    state
        .user_repository
        .update_password(user.id, &payload.new_password)
        .await?;

    Ok(Json(json!({"message": "Password changed successfully"})))
}

/// Role-gated landing endpoint
pub async fn admin_welcome(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    Json(json!({
        "message": "Welcome Admin",
        "email": claims.email,
    }))
}

/// List every account
pub async fn list_users(State(state): State<AppState>) -> AuthResult<impl IntoResponse> {
    let users: Vec<UserProfile> = state
        .user_repository
        .list()
        .await?
        .iter()
        .map(UserProfile::from)
        .collect();

    Ok(Json(users))
}

/// Re-enable a deactivated account
pub async fn activate_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AuthResult<impl IntoResponse> {
    set_active(&state, id, true).await
}

/// Soft-disable an account; it can no longer log in
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AuthResult<impl IntoResponse> {
    if claims.sub == id {
        return Err(AuthError::BadRequest(
            "Administrators cannot deactivate themselves".to_string(),
        ));
    }

    set_active(&state, id, false).await
}

async fn set_active(state: &AppState, id: Uuid, active: bool) -> AuthResult<Json<UserProfile>> {
    if !state.user_repository.set_active(id, active).await? {
        return Err(AuthError::UserNotFound);
    }

    let user = state
        .user_repository
        .find_by_id(id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(UserProfile::from(&user)))
}
