use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, Document, oid::ObjectId};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{
    Booking, CreateBookingDto, UpdateBookingStatusDto, AdminUpdateBookingDto,
    Listing, ReviewStatus,
};
use crate::guards::{AuthGuard, AdminGuard};
use crate::utils::{validate_email, validate_iso_date, ApiResponse, ApiError};

/// --------------------
/// Create booking
/// --------------------
#[openapi(tag = "Booking")]
#[post("/booking/create", data = "<dto>")]
pub async fn create_booking(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateBookingDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if let Some(field) = dto.missing_field() {
        return Err(ApiError::bad_request(format!("Missing required field: {}", field)));
    }
    if !validate_email(&dto.email) {
        return Err(ApiError::bad_request("Invalid email"));
    }
    if !validate_iso_date(&dto.preferred_date) {
        return Err(ApiError::bad_request("Preferred date must be YYYY-MM-DD"));
    }

    let listing_id = ObjectId::parse_str(&dto.listing_id)
        .map_err(|_| ApiError::bad_request("Invalid listing ID"))?;

    db.collection::<Listing>("listings")
        .find_one(doc! { "_id": listing_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    let booking = Booking {
        id: None,
        listing_id,
        user_id: auth.user_id,
        name: dto.name.clone(),
        email: dto.email.clone(),
        phone: dto.phone.clone(),
        address: dto.address.clone(),
        preferred_date: dto.preferred_date.clone(),
        status: ReviewStatus::Pending,
        confirmed: false,
        payment: None,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<Booking>("bookings")
        .insert_one(&booking, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create booking: {}", e)))?;

    let mut b = booking;
    b.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Booking created successfully".to_string(),
        serde_json::json!({ "booking": b }),
    )))
}

/// --------------------
/// List by user
/// --------------------
#[openapi(tag = "Booking")]
#[get("/booking/user/<user_id>")]
pub async fn get_bookings_by_user(
    db: &State<DbConn>,
    auth: AuthGuard,
    user_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&user_id)
        .map_err(|_| ApiError::bad_request("Invalid user ID"))?;

    if object_id != auth.user_id && !auth.is_admin {
        return Err(ApiError::forbidden("You can only view your own bookings"));
    }

    let bookings = collect_bookings(db, doc! { "user_id": object_id }).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({ "bookings": bookings }))))
}

/// --------------------
/// List by landlord
/// --------------------
/// Resolves the owner's listings first, then the bookings referencing them.
/// There is no transaction spanning the two queries; a listing deleted in
/// between simply drops out of the result.
#[openapi(tag = "Booking")]
#[get("/booking/landlord/<landlord_id>")]
pub async fn get_bookings_by_landlord(
    db: &State<DbConn>,
    auth: AuthGuard,
    landlord_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&landlord_id)
        .map_err(|_| ApiError::bad_request("Invalid landlord ID"))?;

    if object_id != auth.user_id && !auth.is_admin {
        return Err(ApiError::forbidden("You can only view bookings for your own listings"));
    }

    let mut cursor = db
        .collection::<Listing>("listings")
        .find(doc! { "owner_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut listing_ids = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let listing = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        if let Some(id) = listing.id {
            listing_ids.push(id);
        }
    }

    let bookings = collect_bookings(db, doc! { "listing_id": { "$in": listing_ids } }).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({ "bookings": bookings }))))
}

/// --------------------
/// Update status (listing owner or admin)
/// --------------------
#[openapi(tag = "Booking")]
#[put("/booking/<booking_id>/status", data = "<dto>")]
pub async fn update_booking_status(
    db: &State<DbConn>,
    auth: AuthGuard,
    booking_id: String,
    dto: Json<UpdateBookingStatusDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let new_status = ReviewStatus::parse(&dto.status)
        .ok_or_else(|| ApiError::bad_request(
            "Status must be one of 'pending', 'approved', 'rejected'",
        ))?;

    let object_id = ObjectId::parse_str(&booking_id)
        .map_err(|_| ApiError::bad_request("Invalid booking ID"))?;

    let booking = db
        .collection::<Booking>("bookings")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    if !auth.is_admin {
        let listing = db
            .collection::<Listing>("listings")
            .find_one(doc! { "_id": booking.listing_id }, None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

        let is_owner = listing.map(|l| l.owner_id == auth.user_id).unwrap_or(false);
        if !is_owner {
            return Err(ApiError::forbidden("Only the listing owner can review this booking"));
        }
    }

    if !booking.status.can_transition(new_status) {
        return Err(ApiError::bad_request(format!(
            "Cannot move booking from '{}' to '{}'",
            booking.status.as_str(),
            new_status.as_str()
        )));
    }

    db.collection::<Booking>("bookings")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "status": new_status.as_str(), "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update booking: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": format!("Booking status updated to {}", new_status.as_str())
    }))))
}

/// --------------------
/// Admin: list all
/// --------------------
#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[openapi(tag = "Booking")]
#[get("/booking/all?<query..>")]
pub async fn get_all_bookings(
    db: &State<DbConn>,
    _admin: AdminGuard,
    query: BookingListQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let mut filter = doc! {};
    if let Some(ref status) = query.status {
        if ReviewStatus::parse(status).is_none() {
            return Err(ApiError::bad_request(
                "Status must be one of 'pending', 'approved', 'rejected'",
            ));
        }
        filter.insert("status", status);
    }

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<Booking>("bookings")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut bookings = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let booking = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        bookings.push(booking);
    }

    let total = db
        .collection::<Booking>("bookings")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "bookings": bookings,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

/// --------------------
/// Admin: update fields
/// --------------------
#[openapi(tag = "Booking")]
#[put("/booking/<booking_id>", data = "<dto>")]
pub async fn admin_update_booking(
    db: &State<DbConn>,
    _admin: AdminGuard,
    booking_id: String,
    dto: Json<AdminUpdateBookingDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&booking_id)
        .map_err(|_| ApiError::bad_request("Invalid booking ID"))?;

    let mut update_doc = doc! {
        "updated_at": DateTime::now()
    };

    if let Some(ref name) = dto.name {
        update_doc.insert("name", name);
    }
    if let Some(ref email) = dto.email {
        if !validate_email(email) {
            return Err(ApiError::bad_request("Invalid email"));
        }
        update_doc.insert("email", email);
    }
    if let Some(ref phone) = dto.phone {
        update_doc.insert("phone", phone);
    }
    if let Some(ref address) = dto.address {
        update_doc.insert("address", address);
    }
    if let Some(ref preferred_date) = dto.preferred_date {
        if !validate_iso_date(preferred_date) {
            return Err(ApiError::bad_request("Preferred date must be YYYY-MM-DD"));
        }
        update_doc.insert("preferred_date", preferred_date);
    }
    if let Some(ref status) = dto.status {
        let status = ReviewStatus::parse(status)
            .ok_or_else(|| ApiError::bad_request(
                "Status must be one of 'pending', 'approved', 'rejected'",
            ))?;
        update_doc.insert("status", status.as_str());
    }

    let result = db
        .collection::<Booking>("bookings")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": update_doc },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update booking: {}", e)))?;

    if result.matched_count == 0 {
        return Err(ApiError::not_found("Booking not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Booking updated successfully"
    }))))
}

/// --------------------
/// Admin: delete
/// --------------------
#[openapi(tag = "Booking")]
#[delete("/booking/<booking_id>")]
pub async fn delete_booking(
    db: &State<DbConn>,
    _admin: AdminGuard,
    booking_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&booking_id)
        .map_err(|_| ApiError::bad_request("Invalid booking ID"))?;

    let result = db
        .collection::<Booking>("bookings")
        .delete_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete booking: {}", e)))?;

    if result.deleted_count == 0 {
        return Err(ApiError::not_found("Booking not found"));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Booking deleted successfully"
    }))))
}

/// --------------------
/// Admin: stats
/// --------------------
#[openapi(tag = "Booking")]
#[get("/booking/stats")]
pub async fn get_booking_stats(
    db: &State<DbConn>,
    _admin: AdminGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    // Counts by status
    let mut cursor = db
        .collection::<Document>("bookings")
        .aggregate(
            vec![doc! { "$group": { "_id": "$status", "count": { "$sum": 1 } } }],
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Aggregation error: {}", e)))?;

    let mut pending = 0i64;
    let mut approved = 0i64;
    let mut rejected = 0i64;
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let d = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        let count = d.get_i32("count").map(i64::from).unwrap_or(0);
        match d.get_str("_id").unwrap_or("") {
            "pending" => pending = count,
            "approved" => approved = count,
            "rejected" => rejected = count,
            _ => {}
        }
    }

    // Bookings per month over a trailing 6-month window
    let window_start = trailing_window_start(chrono::Utc::now());
    let window_start = DateTime::from_millis(window_start.timestamp_millis());

    let monthly_pipeline = vec![
        doc! { "$match": { "created_at": { "$gte": window_start } } },
        doc! {
            "$group": {
                "_id": {
                    "year": { "$year": "$created_at" },
                    "month": { "$month": "$created_at" }
                },
                "count": { "$sum": 1 }
            }
        },
        doc! { "$sort": { "_id.year": 1, "_id.month": 1 } },
    ];

    let mut cursor = db
        .collection::<Document>("bookings")
        .aggregate(monthly_pipeline, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Aggregation error: {}", e)))?;

    let mut monthly = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let d = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        let id = d.get_document("_id").cloned().unwrap_or_default();
        monthly.push(serde_json::json!({
            "year": id.get_i32("year").unwrap_or(0),
            "month": id.get_i32("month").unwrap_or(0),
            "count": d.get_i32("count").unwrap_or(0),
        }));
    }

    // Top 5 most-booked listings, joined to listing names
    let top_pipeline = vec![
        doc! { "$group": { "_id": "$listing_id", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
        doc! { "$limit": 5 },
        doc! {
            "$lookup": {
                "from": "listings",
                "localField": "_id",
                "foreignField": "_id",
                "as": "listing"
            }
        },
        doc! { "$unwind": { "path": "$listing", "preserveNullAndEmptyArrays": true } },
    ];

    let mut cursor = db
        .collection::<Document>("bookings")
        .aggregate(top_pipeline, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Aggregation error: {}", e)))?;

    let mut top_listings = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let d = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        let listing_id = d
            .get_object_id("_id")
            .map(|id| id.to_hex())
            .unwrap_or_default();
        let name = d
            .get_document("listing")
            .ok()
            .and_then(|l| l.get_str("name").ok())
            .unwrap_or("(deleted listing)");
        top_listings.push(serde_json::json!({
            "listing_id": listing_id,
            "name": name,
            "count": d.get_i32("count").unwrap_or(0),
        }));
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "pendingBookings": pending,
        "approvedBookings": approved,
        "rejectedBookings": rejected,
        "totalBookings": pending + approved + rejected,
        "bookingsByMonth": monthly,
        "topListings": top_listings,
    }))))
}

/// First day of the month five months before `now`, so the window spans six
/// calendar months including the current one.
fn trailing_window_start(now: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    use chrono::{Datelike, TimeZone};

    let months = now.year() * 12 + now.month() as i32 - 1 - 5;
    let year = months.div_euclid(12);
    let month = months.rem_euclid(12) as u32 + 1;

    chrono::Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

async fn collect_bookings(db: &DbConn, filter: Document) -> Result<Vec<Booking>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<Booking>("bookings")
        .find(filter, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut bookings = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let booking = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        bookings.push(booking);
    }

    Ok(bookings)
}

#[cfg(test)]
mod tests {
    use super::trailing_window_start;
    use chrono::{TimeZone, Utc};

    #[test]
    fn window_spans_six_calendar_months() {
        let now = Utc.with_ymd_and_hms(2025, 8, 15, 10, 30, 0).unwrap();
        let start = trailing_window_start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn window_crosses_year_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap();
        let start = trailing_window_start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn january_window_starts_previous_august() {
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 59).unwrap();
        let start = trailing_window_start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap());
    }
}
