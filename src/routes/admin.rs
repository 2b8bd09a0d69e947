use crate::db::DbConn;
use crate::guards::AdminGuard;
use crate::models::{AdminUpdateUserDto, Booking, Listing, User, UserResponse};
use crate::utils::{ApiError, ApiResponse};
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use mongodb::options::FindOptions;
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

// ==================== USER ADMIN ROUTES ====================

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct UserListQuery {
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[openapi(tag = "Admin - Users")]
#[get("/admin/users?<query..>")]
pub async fn get_all_users(
    db: &State<DbConn>,
    _admin: AdminGuard,
    query: UserListQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let mut filter = doc! {};
    if let Some(is_active) = query.is_active {
        filter.insert("is_active", is_active);
    }
    if let Some(is_admin) = query.is_admin {
        filter.insert("is_admin", is_admin);
    }

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<User>("users")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut users: Vec<UserResponse> = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let user = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        users.push(UserResponse::from(user));
    }

    let total = db
        .collection::<User>("users")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "users": users,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

#[openapi(tag = "Admin - Users")]
#[put("/admin/users/<user_id>", data = "<dto>")]
pub async fn update_user(
    db: &State<DbConn>,
    admin: AdminGuard,
    user_id: String,
    dto: Json<AdminUpdateUserDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&user_id)
        .map_err(|_| ApiError::bad_request("Invalid user ID"))?;

    // An admin cannot strip their own admin flag
    if object_id == admin.auth.user_id && dto.is_admin == Some(false) {
        return Err(ApiError::bad_request("You cannot revoke your own admin access"));
    }

    let mut update_doc = doc! {
        "updated_at": DateTime::now()
    };

    if let Some(ref name) = dto.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("Name cannot be empty"));
        }
        update_doc.insert("name", name);
    }
    if let Some(ref phone) = dto.phone {
        update_doc.insert("phone", phone);
    }
    if let Some(is_admin) = dto.is_admin {
        update_doc.insert("is_admin", is_admin);
    }
    if let Some(is_active) = dto.is_active {
        update_doc.insert("is_active", is_active);
    }

    let result = db
        .collection::<User>("users")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": update_doc },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update user: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "User updated successfully"
    }))))
}

#[openapi(tag = "Admin - Users")]
#[delete("/admin/users/<user_id>")]
pub async fn delete_user(
    db: &State<DbConn>,
    admin: AdminGuard,
    user_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&user_id)
        .map_err(|_| ApiError::bad_request("Invalid user ID"))?;

    if object_id == admin.auth.user_id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    let result = db
        .collection::<User>("users")
        .delete_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete user: {}", e)))?;

    if result.deleted_count == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "User deleted successfully"
    }))))
}

// ==================== LISTING ADMIN ROUTES ====================

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct AdminListingQuery {
    pub listing_type: Option<String>,
    pub owner_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[openapi(tag = "Admin - Listings")]
#[get("/admin/listings?<query..>")]
pub async fn get_all_listings(
    db: &State<DbConn>,
    _admin: AdminGuard,
    query: AdminListingQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let mut filter = doc! {};
    if let Some(ref listing_type) = query.listing_type {
        filter.insert("listing_type", listing_type);
    }
    if let Some(ref owner_id) = query.owner_id {
        let owner_id = ObjectId::parse_str(owner_id)
            .map_err(|_| ApiError::bad_request("Invalid owner ID"))?;
        filter.insert("owner_id", owner_id);
    }

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<Listing>("listings")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut listings = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let listing = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        listings.push(listing);
    }

    let total = db
        .collection::<Listing>("listings")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "listings": listings,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

#[openapi(tag = "Admin - Listings")]
#[delete("/admin/listings/<listing_id>")]
pub async fn admin_delete_listing(
    db: &State<DbConn>,
    _admin: AdminGuard,
    listing_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&listing_id)
        .map_err(|_| ApiError::bad_request("Invalid listing ID"))?;

    let result = db
        .collection::<Listing>("listings")
        .delete_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete listing: {}", e)))?;

    if result.deleted_count == 0 {
        return Err(ApiError::not_found("Listing not found"));
    }

    // Bookings pointing at the listing stay; landlord views just stop
    // returning them once the listing is gone.
    let orphaned = db
        .collection::<Booking>("bookings")
        .count_documents(doc! { "listing_id": object_id }, None)
        .await
        .unwrap_or(0);
    if orphaned > 0 {
        info!("Deleted listing {} leaves {} booking(s) behind", listing_id, orphaned);
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Listing deleted successfully"
    }))))
}
