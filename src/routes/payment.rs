use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use uuid::Uuid;
use crate::db::DbConn;
use crate::models::{Booking, ShiftingRequest, PaymentStatus};
use crate::guards::AuthGuard;
use crate::services::KhaltiService;
use crate::utils::{ApiResponse, ApiError};

#[derive(serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct InitiatePaymentDto {
    pub booking_id: Option<String>,
    pub shifting_id: Option<String>,
    /// Rupees.
    pub amount: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct VerifyPaymentDto {
    pub pidx: String,
}

/// --------------------
/// Initiate
/// --------------------
/// Creates a hosted-payment session with Khalti and records the returned
/// `pidx` on the parent record. The local payment stays `pending` if the
/// gateway call fails, so the caller can simply retry.
#[openapi(tag = "Payment")]
#[post("/payments/initiate", data = "<dto>")]
pub async fn initiate_payment(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<InitiatePaymentDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.amount <= 0 {
        return Err(ApiError::bad_request("Amount must be positive"));
    }

    let (collection, parent_id, order_name) = match (&dto.booking_id, &dto.shifting_id) {
        (Some(booking_id), None) => {
            let object_id = ObjectId::parse_str(booking_id)
                .map_err(|_| ApiError::bad_request("Invalid booking ID"))?;

            let booking = db
                .collection::<Booking>("bookings")
                .find_one(doc! { "_id": object_id }, None)
                .await
                .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
                .ok_or_else(|| ApiError::not_found("Booking not found"))?;

            if booking.user_id != auth.user_id && !auth.is_admin {
                return Err(ApiError::forbidden("You can only pay for your own bookings"));
            }

            ("bookings", object_id, format!("Booking {}", booking_id))
        }
        (None, Some(shifting_id)) => {
            let object_id = ObjectId::parse_str(shifting_id)
                .map_err(|_| ApiError::bad_request("Invalid shifting request ID"))?;

            let request = db
                .collection::<ShiftingRequest>("shifting_requests")
                .find_one(doc! { "_id": object_id }, None)
                .await
                .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
                .ok_or_else(|| ApiError::not_found("Shifting request not found"))?;

            if request.user_id != auth.user_id && !auth.is_admin {
                return Err(ApiError::forbidden("You can only pay for your own shifting requests"));
            }

            ("shifting_requests", object_id, format!("Shifting request {}", shifting_id))
        }
        _ => {
            return Err(ApiError::bad_request(
                "Exactly one of booking_id or shifting_id is required",
            ))
        }
    };

    let purchase_order_id = Uuid::new_v4().to_string();

    let gateway = KhaltiService::initiate(
        dto.amount,
        &purchase_order_id,
        &order_name,
        &dto.name,
        &dto.email,
        &dto.phone,
    )
    .await
    .map_err(|e| {
        error!("Khalti initiate failed for {}: {}", purchase_order_id, e);
        ApiError::internal_error("Payment gateway unavailable")
    })?;

    db.collection::<mongodb::bson::Document>(collection)
        .update_one(
            doc! { "_id": parent_id },
            doc! {
                "$set": {
                    "payment": {
                        "method": "khalti",
                        "status": PaymentStatus::Initiated.as_str(),
                        "pidx": &gateway.pidx,
                        "purchase_order_id": &purchase_order_id,
                        "amount": dto.amount,
                        "verified_at": mongodb::bson::Bson::Null
                    },
                    "updated_at": DateTime::now()
                }
            },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to record payment: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "pidx": gateway.pidx,
        "payment_url": gateway.payment_url,
        "expires_at": gateway.expires_at,
        "purchase_order_id": purchase_order_id,
    }))))
}

/// --------------------
/// Verify
/// --------------------
/// Looks the `pidx` up with the gateway. A `Completed` report flips the
/// matching record's payment to `completed` and confirms it through a single
/// conditional update, so re-verifying an already-completed payment is a
/// no-op. A `Completed` report with no matching record is a reconciliation
/// error, not something to drop silently.
#[openapi(tag = "Payment")]
#[post("/payments/verify", data = "<dto>")]
pub async fn verify_payment(
    db: &State<DbConn>,
    _auth: AuthGuard,
    dto: Json<VerifyPaymentDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.pidx.trim().is_empty() {
        return Err(ApiError::bad_request("pidx is required"));
    }

    let lookup = KhaltiService::lookup(&dto.pidx).await.map_err(|e| {
        error!("Khalti lookup failed for {}: {}", dto.pidx, e);
        ApiError::internal_error("Payment gateway unavailable")
    })?;

    let local_status = PaymentStatus::from_gateway(&lookup.status);

    if local_status == PaymentStatus::Completed {
        // Bookings additionally get confirmed; the filter keeps the update
        // idempotent across repeated verify calls.
        let booking_update = db
            .collection::<Booking>("bookings")
            .update_one(
                doc! {
                    "payment.pidx": &dto.pidx,
                    "payment.status": { "$ne": PaymentStatus::Completed.as_str() }
                },
                doc! {
                    "$set": {
                        "payment.status": PaymentStatus::Completed.as_str(),
                        "payment.verified_at": DateTime::now(),
                        "status": "approved",
                        "confirmed": true,
                        "updated_at": DateTime::now()
                    }
                },
                None,
            )
            .await
            .map_err(|e| ApiError::internal_error(e.to_string()))?;

        if booking_update.matched_count > 0 {
            return Ok(Json(ApiResponse::success(serde_json::json!({
                "message": "Payment verified successfully",
                "status": PaymentStatus::Completed.as_str(),
                "transaction_id": lookup.transaction_id,
            }))));
        }

        let shifting_update = db
            .collection::<ShiftingRequest>("shifting_requests")
            .update_one(
                doc! {
                    "payment.pidx": &dto.pidx,
                    "payment.status": { "$ne": PaymentStatus::Completed.as_str() }
                },
                doc! {
                    "$set": {
                        "payment.status": PaymentStatus::Completed.as_str(),
                        "payment.verified_at": DateTime::now(),
                        "updated_at": DateTime::now()
                    }
                },
                None,
            )
            .await
            .map_err(|e| ApiError::internal_error(e.to_string()))?;

        if shifting_update.matched_count > 0 {
            return Ok(Json(ApiResponse::success(serde_json::json!({
                "message": "Payment verified successfully",
                "status": PaymentStatus::Completed.as_str(),
                "transaction_id": lookup.transaction_id,
            }))));
        }

        // Already verified earlier, or the gateway knows a pidx we never stored
        if pidx_exists(db, &dto.pidx).await? {
            return Ok(Json(ApiResponse::success(serde_json::json!({
                "message": "Payment already verified",
                "status": PaymentStatus::Completed.as_str(),
                "transaction_id": lookup.transaction_id,
            }))));
        }

        warn!("Gateway reported completed payment for unknown pidx {}", dto.pidx);
        return Err(ApiError::not_found(
            "No payment record matches this transaction; flagged for reconciliation",
        ));
    }

    // Not completed: record the mapped state on whichever record holds the pidx
    for collection in ["bookings", "shifting_requests"] {
        let result = db
            .collection::<mongodb::bson::Document>(collection)
            .update_one(
                doc! {
                    "payment.pidx": &dto.pidx,
                    "payment.status": { "$ne": PaymentStatus::Completed.as_str() }
                },
                doc! {
                    "$set": {
                        "payment.status": local_status.as_str(),
                        "updated_at": DateTime::now()
                    }
                },
                None,
            )
            .await
            .map_err(|e| ApiError::internal_error(e.to_string()))?;

        if result.matched_count > 0 {
            break;
        }
    }

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": format!("Payment not completed (gateway status: {})", lookup.status),
        "status": local_status.as_str(),
    }))))
}

async fn pidx_exists(db: &DbConn, pidx: &str) -> Result<bool, ApiError> {
    for collection in ["bookings", "shifting_requests"] {
        let found = db
            .collection::<mongodb::bson::Document>(collection)
            .find_one(doc! { "payment.pidx": pidx }, None)
            .await
            .map_err(|e| ApiError::internal_error(e.to_string()))?;
        if found.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}
