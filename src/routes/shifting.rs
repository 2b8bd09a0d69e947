use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{
    ShiftingRequest, CreateShiftingRequestDto, UpdateShiftingStatusDto,
    ShiftingStatus, Payment, PaymentMethod,
};
use crate::guards::{AuthGuard, AdminGuard};
use crate::utils::{validate_phone, validate_iso_date, ApiResponse, ApiError};

/// --------------------
/// Create shifting request
/// --------------------
#[openapi(tag = "Shifting")]
#[post("/shifting/create", data = "<dto>")]
pub async fn create_shifting_request(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateShiftingRequestDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if let Some(field) = dto.missing_field() {
        return Err(ApiError::bad_request(format!("Missing required field: {}", field)));
    }
    if !validate_phone(&dto.phone) {
        return Err(ApiError::bad_request("Invalid phone number"));
    }
    if !validate_iso_date(&dto.shifting_date) {
        return Err(ApiError::bad_request("Shifting date must be YYYY-MM-DD"));
    }

    let request = ShiftingRequest {
        id: None,
        user_id: auth.user_id,
        worker_id: None,
        name: dto.name.clone(),
        phone: dto.phone.clone(),
        pickup_address: dto.pickup_address.clone(),
        destination_address: dto.destination_address.clone(),
        shifting_date: dto.shifting_date.clone(),
        total_amount: dto.total_amount,
        status: ShiftingStatus::Pending,
        payment: Some(Payment::pending(PaymentMethod::Khalti, dto.total_amount)),
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<ShiftingRequest>("shifting_requests")
        .insert_one(&request, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create shifting request: {}", e)))?;

    let mut r = request;
    r.id = result.inserted_id.as_object_id();

    Ok(Json(ApiResponse::success_with_message(
        "Shifting request created successfully".to_string(),
        serde_json::json!({ "request": r }),
    )))
}

/// --------------------
/// Admin: list all
/// --------------------
#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct ShiftingListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[openapi(tag = "Shifting")]
#[get("/shifting/all?<query..>")]
pub async fn get_all_shifting_requests(
    db: &State<DbConn>,
    _admin: AdminGuard,
    query: ShiftingListQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let mut filter = doc! {};
    if let Some(ref status) = query.status {
        if ShiftingStatus::parse(status).is_none() {
            return Err(ApiError::bad_request(
                "Status must be one of 'pending', 'approved', 'rejected', 'completed'",
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
        .collection::<ShiftingRequest>("shifting_requests")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut requests = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let request = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        requests.push(request);
    }

    let total = db
        .collection::<ShiftingRequest>("shifting_requests")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "requests": requests,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}

/// --------------------
/// List by user
/// --------------------
#[openapi(tag = "Shifting")]
#[get("/shifting/user/<user_id>")]
pub async fn get_shifting_requests_by_user(
    db: &State<DbConn>,
    auth: AuthGuard,
    user_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&user_id)
        .map_err(|_| ApiError::bad_request("Invalid user ID"))?;

    if object_id != auth.user_id && !auth.is_admin {
        return Err(ApiError::forbidden("You can only view your own shifting requests"));
    }

    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<ShiftingRequest>("shifting_requests")
        .find(doc! { "user_id": object_id }, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut requests = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let request = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        requests.push(request);
    }

    Ok(Json(ApiResponse::success(serde_json::json!({ "requests": requests }))))
}

/// --------------------
/// Update status (admin or assigned worker)
/// --------------------
#[openapi(tag = "Shifting")]
#[put("/shifting/<request_id>/status", data = "<dto>")]
pub async fn update_shifting_status(
    db: &State<DbConn>,
    auth: AuthGuard,
    request_id: String,
    dto: Json<UpdateShiftingStatusDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let new_status = ShiftingStatus::parse(&dto.status)
        .ok_or_else(|| ApiError::bad_request(
            "Status must be one of 'pending', 'approved', 'rejected', 'completed'",
        ))?;

    let object_id = ObjectId::parse_str(&request_id)
        .map_err(|_| ApiError::bad_request("Invalid request ID"))?;

    let request = db
        .collection::<ShiftingRequest>("shifting_requests")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Shifting request not found"))?;

    let is_assigned_worker = request.worker_id == Some(auth.user_id);
    if !auth.is_admin && !is_assigned_worker {
        return Err(ApiError::forbidden("Only an admin or the assigned worker can update this request"));
    }

    if !request.status.can_transition(new_status) {
        return Err(ApiError::bad_request(format!(
            "Cannot move shifting request from '{}' to '{}'",
            request.status.as_str(),
            new_status.as_str()
        )));
    }

    let mut update_doc = doc! {
        "status": new_status.as_str(),
        "updated_at": DateTime::now(),
    };

    // Admin may assign a crew while approving
    if let Some(ref worker_id) = dto.worker_id {
        if !auth.is_admin {
            return Err(ApiError::forbidden("Only an admin can assign a worker"));
        }
        let worker_id = ObjectId::parse_str(worker_id)
            .map_err(|_| ApiError::bad_request("Invalid worker ID"))?;
        update_doc.insert("worker_id", worker_id);
    }

    db.collection::<ShiftingRequest>("shifting_requests")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": update_doc },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update shifting request: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": format!("Shifting request status updated to {}", new_status.as_str())
    }))))
}
