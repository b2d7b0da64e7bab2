use actix_web::{web, HttpResponse};
use validator::Validate;
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, UpdatePreferencesRequest, UserResponse};
use crate::routes::{AppState, AuthenticatedUser};
use crate::services::{hash_password, verify_credentials, AuthError};

/// Configure account and preference routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/user", web::post().to(register))
        .route("/user/login", web::post().to(login))
        .route("/user/preferences", web::get().to(get_preferences))
        .route("/user/preferences", web::put().to(update_preferences));
}

/// Register a new account
///
/// POST /api/user
///
/// Request body:
/// ```json
/// { "username": "string", "password": "string" }
/// ```
async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    let password = req.password;
    let password_hash = web::block(move || hash_password(&password)).await??;
    let user = state.store.create_user(&req.username, &password_hash).await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Exchange credentials for a bearer token
///
/// POST /api/user/login
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let req = req.into_inner();
    let user = state.store.find_user_by_username(&req.username).await?;

    // Argon2 runs on the blocking pool, for unknown users too
    let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
    let password = req.password;
    let verified =
        web::block(move || verify_credentials(&password, stored_hash.as_deref())).await?;

    let user = user.filter(|_| verified).ok_or_else(|| {
        tracing::info!("Rejected login for {}", req.username);
        AuthError::InvalidCredentials
    })?;

    let token = state.tokens.issue(&user)?;
    tracing::debug!("Issued token for user {}", user.id);

    Ok(HttpResponse::Ok().json(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.ttl_secs(),
    }))
}

/// Read the caller's preferences, creating defaults on first access
///
/// GET /api/user/preferences
async fn get_preferences(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let preference = state.store.get_or_create_preference(user.user_id).await?;
    Ok(HttpResponse::Ok().json(preference))
}

/// Partially update the caller's preferences
///
/// PUT /api/user/preferences
///
/// Request body (every field optional):
/// ```json
/// {
///   "genders": ["female"],
///   "age_buckets": ["puppy", "young"],
///   "sizes": ["small"],
///   "requires_behavioral_assessment": false
/// }
/// ```
async fn update_preferences(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<UpdatePreferencesRequest>,
) -> Result<HttpResponse, ApiError> {
    let update = req.into_inner().into_update();
    let preference = state.store.update_preference(user.user_id, &update).await?;

    tracing::info!("Updated preferences for {}", user.username);
    Ok(HttpResponse::Ok().json(preference))
}
