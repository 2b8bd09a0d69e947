use rocket::serde::json::Json;
use rocket::State;
use rocket::form::FromForm;
use rocket_okapi::openapi;
use mongodb::bson::{doc, DateTime, oid::ObjectId};
use mongodb::options::FindOptions;
use crate::db::DbConn;
use crate::models::{Listing, ListingType, CreateListingDto, UpdateListingDto, discount_is_valid};
use crate::guards::AuthGuard;
use crate::utils::{ApiResponse, ApiError};

#[openapi(tag = "Listing")]
#[post("/listing/create", data = "<dto>")]
pub async fn create_listing(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateListingDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    if dto.address.trim().is_empty() {
        return Err(ApiError::bad_request("Address is required"));
    }
    let listing_type = ListingType::parse(&dto.listing_type)
        .ok_or_else(|| ApiError::bad_request("Type must be 'rent' or 'sale'"))?;
    if dto.regular_price <= 0 {
        return Err(ApiError::bad_request("Price must be positive"));
    }

    let offer = dto.offer.unwrap_or(false);
    let discount_price = dto.discount_price.unwrap_or(0);
    if !discount_is_valid(offer, dto.regular_price, discount_price) {
        return Err(ApiError::bad_request(
            "Discount price must be lower than regular price",
        ));
    }

    let listing = Listing {
        id: None,
        owner_id: auth.user_id,
        name: dto.name.clone(),
        description: dto.description.clone(),
        address: dto.address.clone(),
        listing_type,
        bedrooms: dto.bedrooms,
        bathrooms: dto.bathrooms,
        regular_price: dto.regular_price,
        discount_price,
        offer,
        parking: dto.parking.unwrap_or(false),
        furnished: dto.furnished.unwrap_or(false),
        image_urls: dto.image_urls.clone().unwrap_or_default(),
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<Listing>("listings")
        .insert_one(&listing, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create listing: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Listing created successfully".to_string(),
        serde_json::json!({
            "id": result.inserted_id.as_object_id().map(|id| id.to_hex())
        }),
    )))
}

#[openapi(tag = "Listing")]
#[get("/listing/<listing_id>")]
pub async fn get_listing(
    db: &State<DbConn>,
    listing_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&listing_id)
        .map_err(|_| ApiError::bad_request("Invalid listing ID"))?;

    let listing = db
        .collection::<Listing>("listings")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!(listing))))
}

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct SearchListingsQuery {
    pub search_term: Option<String>,
    pub listing_type: Option<String>,
    pub offer: Option<bool>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[openapi(tag = "Listing")]
#[get("/listing/search?<query..>")]
pub async fn search_listings(
    db: &State<DbConn>,
    query: SearchListingsQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).min(100);
    let skip = (page - 1) * limit;

    let mut filter = doc! {};

    if let Some(ref term) = query.search_term {
        filter.insert("name", doc! { "$regex": term, "$options": "i" });
    }
    if let Some(ref listing_type) = query.listing_type {
        if ListingType::parse(listing_type).is_none() {
            return Err(ApiError::bad_request("Type must be 'rent' or 'sale'"));
        }
        filter.insert("listing_type", listing_type);
    }
    if let Some(offer) = query.offer {
        filter.insert("offer", offer);
    }
    if let Some(furnished) = query.furnished {
        filter.insert("furnished", furnished);
    }
    if let Some(parking) = query.parking {
        filter.insert("parking", parking);
    }
    if query.min_price.is_some() || query.max_price.is_some() {
        let mut range = doc! {};
        if let Some(min) = query.min_price {
            range.insert("$gte", min);
        }
        if let Some(max) = query.max_price {
            range.insert("$lte", max);
        }
        filter.insert("regular_price", range);
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

#[openapi(tag = "Listing")]
#[get("/listing/owner/<owner_id>")]
pub async fn get_listings_by_owner(
    db: &State<DbConn>,
    owner_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&owner_id)
        .map_err(|_| ApiError::bad_request("Invalid owner ID"))?;

    let mut cursor = db
        .collection::<Listing>("listings")
        .find(doc! { "owner_id": object_id }, None)
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

    Ok(Json(ApiResponse::success(serde_json::json!({ "listings": listings }))))
}

#[openapi(tag = "Listing")]
#[put("/listing/<listing_id>", data = "<dto>")]
pub async fn update_listing(
    db: &State<DbConn>,
    auth: AuthGuard,
    listing_id: String,
    dto: Json<UpdateListingDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&listing_id)
        .map_err(|_| ApiError::bad_request("Invalid listing ID"))?;

    let listing = db
        .collection::<Listing>("listings")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    if listing.owner_id != auth.user_id && !auth.is_admin {
        return Err(ApiError::forbidden("You can only update your own listings"));
    }

    // Re-check the discount invariant against the post-update values
    let offer = dto.offer.unwrap_or(listing.offer);
    let regular_price = dto.regular_price.unwrap_or(listing.regular_price);
    let discount_price = dto.discount_price.unwrap_or(listing.discount_price);
    if !discount_is_valid(offer, regular_price, discount_price) {
        return Err(ApiError::bad_request(
            "Discount price must be lower than regular price",
        ));
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
    if let Some(ref description) = dto.description {
        update_doc.insert("description", description);
    }
    if let Some(ref address) = dto.address {
        update_doc.insert("address", address);
    }
    if let Some(ref listing_type) = dto.listing_type {
        if ListingType::parse(listing_type).is_none() {
            return Err(ApiError::bad_request("Type must be 'rent' or 'sale'"));
        }
        update_doc.insert("listing_type", listing_type);
    }
    if let Some(bedrooms) = dto.bedrooms {
        update_doc.insert("bedrooms", bedrooms);
    }
    if let Some(bathrooms) = dto.bathrooms {
        update_doc.insert("bathrooms", bathrooms);
    }
    if let Some(price) = dto.regular_price {
        update_doc.insert("regular_price", price);
    }
    if let Some(discount) = dto.discount_price {
        update_doc.insert("discount_price", discount);
    }
    if let Some(offer) = dto.offer {
        update_doc.insert("offer", offer);
    }
    if let Some(parking) = dto.parking {
        update_doc.insert("parking", parking);
    }
    if let Some(furnished) = dto.furnished {
        update_doc.insert("furnished", furnished);
    }
    if let Some(ref image_urls) = dto.image_urls {
        update_doc.insert("image_urls", image_urls);
    }

    db.collection::<Listing>("listings")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": update_doc },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update listing: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Listing updated successfully"
    }))))
}

#[openapi(tag = "Listing")]
#[delete("/listing/<listing_id>")]
pub async fn delete_listing(
    db: &State<DbConn>,
    auth: AuthGuard,
    listing_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&listing_id)
        .map_err(|_| ApiError::bad_request("Invalid listing ID"))?;

    let listing = db
        .collection::<Listing>("listings")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    if listing.owner_id != auth.user_id && !auth.is_admin {
        return Err(ApiError::forbidden("You can only delete your own listings"));
    }

    db.collection::<Listing>("listings")
        .delete_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to delete listing: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Listing deleted successfully"
    }))))
}
