use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, body::Bytes, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use storefront_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use storefront_types::models::UserProfile;

use crate::convert;
use crate::error::ApiError;
use crate::extract::json_body;
use crate::identity::Identity;
use crate::state::{AppState, run_db};

const MIN_PASSWORD_LEN: usize = 8;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: RegisterRequest = json_body(&body)?;
    let email = req.email.trim().to_string();
    let name = req.name.trim().to_string();

    // Validate input
    if !email.contains('@') {
        return Err(ApiError::invalid_field("email", "A valid email is required"));
    }
    if name.is_empty() {
        return Err(ApiError::missing_field("name", "Name"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::invalid_field(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }

    // Check if email is taken
    let lookup = email.clone();
    if run_db(&state, "find user", move |db| db.get_user_by_email(&lookup))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();
    let is_admin = state.is_admin_email(&email);
    let (uid, em) = (user_id.to_string(), email.clone());
    // The unique index settles registrations that race past the check above
    run_db(&state, "create user", move |db| {
        db.create_user(&uid, &em, &name, &password_hash, is_admin)
    })
    .await?
    .ok_or_else(|| ApiError::Conflict("Email already exists".to_string()))?;

    let token = state.tokens.issue(user_id, &email)?;

    info!("Registered user {} (admin: {})", user_id, is_admin);
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    let req: LoginRequest = json_body(&body)?;
    let email = req.email.trim().to_string();

    let user = run_db(&state, "find user", move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthenticated)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}': {}", user.id, e)))?;

    let token = state.tokens.issue(user_id, &user.email)?;

    Ok(Json(LoginResponse {
        user_id,
        name: user.name,
        is_admin: user.is_admin,
        token,
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserProfile>, ApiError> {
    let uid = identity.user_id.to_string();
    let user = run_db(&state, "find user", move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(convert::profile(user)))
}

/// 403 unless the caller is a registered admin.
pub(crate) async fn require_admin(state: &AppState, identity: &Identity) -> Result<(), ApiError> {
    let uid = identity.user_id.to_string();
    let user = run_db(state, "find user", move |db| db.get_user_by_id(&uid)).await?;
    match user {
        Some(user) if user.is_admin => Ok(()),
        _ => Err(ApiError::Forbidden("Admin access required".to_string())),
    }
}
