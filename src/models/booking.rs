use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

use crate::models::{Payment, ReviewStatus};

/// A renter's request to view/rent/buy a specific listing. Duplicate bookings
/// for the same listing, user and date are allowed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub listing_id: ObjectId,
    pub user_id: ObjectId,

    // Requester-supplied contact details, kept verbatim
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub preferred_date: String,

    pub status: ReviewStatus,
    /// Set only by payment verification, never by a reviewer.
    pub confirmed: bool,
    pub payment: Option<Payment>,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateBookingDto {
    pub listing_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub preferred_date: String,
}

impl CreateBookingDto {
    /// Returns the name of the first missing required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        let fields = [
            ("listing_id", self.listing_id.trim()),
            ("name", self.name.trim()),
            ("email", self.email.trim()),
            ("phone", self.phone.trim()),
            ("address", self.address.trim()),
            ("preferred_date", self.preferred_date.trim()),
        ];

        fields.iter().find(|(_, v)| v.is_empty()).map(|(k, _)| *k)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateBookingStatusDto {
    pub status: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AdminUpdateBookingDto {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub preferred_date: Option<String>,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_dto() -> CreateBookingDto {
        CreateBookingDto {
            listing_id: "665f1f77bcf86cd799439011".to_string(),
            name: "Ram Thapa".to_string(),
            email: "ram@example.com".to_string(),
            phone: "9841000000".to_string(),
            address: "Baneshwor, Kathmandu".to_string(),
            preferred_date: "2025-04-01".to_string(),
        }
    }

    #[test]
    fn complete_dto_has_no_missing_field() {
        assert_eq!(complete_dto().missing_field(), None);
    }

    #[test]
    fn each_blank_field_is_reported_by_name() {
        let mut dto = complete_dto();
        dto.listing_id = String::new();
        assert_eq!(dto.missing_field(), Some("listing_id"));

        let mut dto = complete_dto();
        dto.name = "   ".to_string();
        assert_eq!(dto.missing_field(), Some("name"));

        let mut dto = complete_dto();
        dto.email = String::new();
        assert_eq!(dto.missing_field(), Some("email"));

        let mut dto = complete_dto();
        dto.phone = String::new();
        assert_eq!(dto.missing_field(), Some("phone"));

        let mut dto = complete_dto();
        dto.address = String::new();
        assert_eq!(dto.missing_field(), Some("address"));

        let mut dto = complete_dto();
        dto.preferred_date = String::new();
        assert_eq!(dto.missing_field(), Some("preferred_date"));
    }

    #[test]
    fn new_bookings_serialize_pending_status() {
        let booking = Booking {
            id: None,
            listing_id: ObjectId::new(),
            user_id: ObjectId::new(),
            name: "Ram Thapa".to_string(),
            email: "ram@example.com".to_string(),
            phone: "9841000000".to_string(),
            address: "Baneshwor, Kathmandu".to_string(),
            preferred_date: "2025-04-01".to_string(),
            status: ReviewStatus::Pending,
            confirmed: false,
            payment: None,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };

        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["confirmed"], false);
    }
}
