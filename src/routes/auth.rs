use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use crate::db::DbConn;
use crate::models::{User, UserResponse, RegisterDto, LoginDto};
use crate::services::JwtService;
use crate::utils::{validate_email, validate_phone, ApiResponse, ApiError};
use crate::config::Config;

const MIN_PASSWORD_LEN: usize = 8;

/// --------------------
/// Register
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/register", data = "<dto>")]
pub async fn register(
    db: &State<DbConn>,
    dto: Json<RegisterDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !validate_email(&dto.email) {
        return Err(ApiError::bad_request("Invalid email"));
    }
    if dto.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }
    if dto.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    if let Some(ref phone) = dto.phone {
        if !validate_phone(phone) {
            return Err(ApiError::bad_request("Invalid phone number"));
        }
    }

    let existing = db
        .collection::<User>("users")
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    if existing.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash = bcrypt::hash(&dto.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let user = User {
        id: None,
        email: dto.email.clone(),
        password_hash,
        name: dto.name.clone(),
        phone: dto.phone.clone(),
        is_admin: false,
        is_active: true,
        last_login_at: DateTime::now(),
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let res = db
        .collection::<User>("users")
        .insert_one(&user, None)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let user_id = res
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::internal_error("Invalid user ID"))?;

    let access_token = JwtService::generate_access_token(&user_id, &user.email, false)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    let refresh_token = JwtService::generate_refresh_token(&user_id, &user.email, false)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let mut u = user;
    u.id = Some(user_id);

    Ok(Json(ApiResponse::success_with_message(
        "Registration successful".to_string(),
        serde_json::json!({
            "user": UserResponse::from(u),
            "accessToken": access_token,
            "refreshToken": refresh_token
        }),
    )))
}

/// --------------------
/// Login
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    db: &State<DbConn>,
    dto: Json<LoginDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let user = db
        .collection::<User>("users")
        .find_one(doc! { "email": &dto.email }, None)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let user = match user {
        Some(u) => u,
        // First admin login bootstraps the account from configuration
        None => bootstrap_admin(db, &dto.email)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?,
    };

    if !user.is_active {
        return Err(ApiError::forbidden("Account is deactivated"));
    }

    let valid = bcrypt::verify(&dto.password, &user.password_hash)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    if !valid {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let user_id = user
        .id
        .ok_or_else(|| ApiError::internal_error("User record missing ID"))?;

    db.collection::<User>("users")
        .update_one(
            doc! { "_id": user_id },
            doc! { "$set": { "last_login_at": DateTime::now() } },
            None,
        )
        .await
        .ok();

    let access_token = JwtService::generate_access_token(&user_id, &user.email, user.is_admin)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    let refresh_token = JwtService::generate_refresh_token(&user_id, &user.email, user.is_admin)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Login successful",
        "user": UserResponse::from(user),
        "accessToken": access_token,
        "refreshToken": refresh_token
    }))))
}

/// Creates the admin user on first login if the configured admin email matches.
/// The credential pair lives in the environment, never in source.
async fn bootstrap_admin(db: &DbConn, email: &str) -> Result<Option<User>, ApiError> {
    let (admin_email, password_hash) = match (Config::admin_email(), Config::admin_password_hash()) {
        (Some(e), Some(h)) => (e, h),
        _ => return Ok(None),
    };

    if email != admin_email {
        return Ok(None);
    }

    let user = User {
        id: None,
        email: admin_email,
        password_hash,
        name: "Administrator".to_string(),
        phone: None,
        is_admin: true,
        is_active: true,
        last_login_at: DateTime::now(),
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let res = db
        .collection::<User>("users")
        .insert_one(&user, None)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    info!("Bootstrapped admin account {}", user.email);

    let mut u = user;
    u.id = res.inserted_id.as_object_id();
    Ok(Some(u))
}

/// --------------------
/// Silent Refresh Token
/// --------------------
#[derive(serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct RefreshTokenDto {
    pub refresh_token: String,
}

#[openapi(tag = "Auth")]
#[post("/auth/refresh", data = "<dto>")]
pub async fn refresh_token(
    dto: Json<RefreshTokenDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let claims = JwtService::verify_token(&dto.refresh_token, true)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::unauthorized("Invalid user id in token"))?;

    let access = JwtService::generate_access_token(&user_id, &claims.email, claims.is_admin)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "accessToken": access
    }))))
}
