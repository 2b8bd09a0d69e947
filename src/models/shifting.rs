use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

use crate::models::{Payment, ShiftingStatus};

/// A moving/labor-service request, independent of the listing marketplace.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShiftingRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    /// Assigned by an admin once a crew picks the job up.
    pub worker_id: Option<ObjectId>,

    pub name: String,
    pub phone: String,
    pub pickup_address: String,
    pub destination_address: String,
    pub shifting_date: String,
    pub total_amount: i64,

    pub status: ShiftingStatus,
    pub payment: Option<Payment>,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateShiftingRequestDto {
    pub name: String,
    pub phone: String,
    pub pickup_address: String,
    pub destination_address: String,
    pub shifting_date: String,
    pub total_amount: i64,
}

impl CreateShiftingRequestDto {
    /// Returns the name of the first missing required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        let fields = [
            ("name", self.name.trim()),
            ("phone", self.phone.trim()),
            ("pickup_address", self.pickup_address.trim()),
            ("destination_address", self.destination_address.trim()),
            ("shifting_date", self.shifting_date.trim()),
        ];

        if let Some((k, _)) = fields.iter().find(|(_, v)| v.is_empty()) {
            return Some(k);
        }
        if self.total_amount <= 0 {
            return Some("total_amount");
        }
        None
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateShiftingStatusDto {
    pub status: String,
    pub worker_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_dto() -> CreateShiftingRequestDto {
        CreateShiftingRequestDto {
            name: "Gita Rai".to_string(),
            phone: "9761000000".to_string(),
            pickup_address: "Patan, Lalitpur".to_string(),
            destination_address: "Budhanilkantha, Kathmandu".to_string(),
            shifting_date: "2025-05-10".to_string(),
            total_amount: 8000,
        }
    }

    #[test]
    fn complete_dto_has_no_missing_field() {
        assert_eq!(complete_dto().missing_field(), None);
    }

    #[test]
    fn blank_fields_are_reported_by_name() {
        let mut dto = complete_dto();
        dto.phone = String::new();
        assert_eq!(dto.missing_field(), Some("phone"));

        let mut dto = complete_dto();
        dto.destination_address = " ".to_string();
        assert_eq!(dto.missing_field(), Some("destination_address"));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let mut dto = complete_dto();
        dto.total_amount = 0;
        assert_eq!(dto.missing_field(), Some("total_amount"));

        dto.total_amount = -500;
        assert_eq!(dto.missing_field(), Some("total_amount"));
    }
}
