use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Rent,
    Sale,
}

impl ListingType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rent" => Some(ListingType::Rent),
            "sale" => Some(ListingType::Sale),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Listing {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub owner_id: ObjectId,
    pub name: String,
    pub description: String,
    pub address: String,
    pub listing_type: ListingType,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub regular_price: i64,
    pub discount_price: i64,
    pub offer: bool,
    pub parking: bool,
    pub furnished: bool,
    pub image_urls: Vec<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// An offered listing must actually discount the regular price. The check is
/// enforced here on both create and update, not just in a client form.
pub fn discount_is_valid(offer: bool, regular_price: i64, discount_price: i64) -> bool {
    !offer || discount_price < regular_price
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateListingDto {
    pub name: String,
    pub description: String,
    pub address: String,
    pub listing_type: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub regular_price: i64,
    pub discount_price: Option<i64>,
    pub offer: Option<bool>,
    pub parking: Option<bool>,
    pub furnished: Option<bool>,
    pub image_urls: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateListingDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub listing_type: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub regular_price: Option<i64>,
    pub discount_price: Option<i64>,
    pub offer: Option<bool>,
    pub parking: Option<bool>,
    pub furnished: Option<bool>,
    pub image_urls: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_must_undercut_regular_price_when_on_offer() {
        assert!(discount_is_valid(true, 20000, 18000));
        assert!(!discount_is_valid(true, 20000, 20000));
        assert!(!discount_is_valid(true, 20000, 25000));
    }

    #[test]
    fn discount_ignored_without_offer() {
        assert!(discount_is_valid(false, 20000, 25000));
        assert!(discount_is_valid(false, 20000, 0));
    }

    #[test]
    fn listing_type_parses_lowercase_only() {
        assert_eq!(ListingType::parse("rent"), Some(ListingType::Rent));
        assert_eq!(ListingType::parse("sale"), Some(ListingType::Sale));
        assert_eq!(ListingType::parse("Rent"), None);
        assert_eq!(ListingType::parse("lease"), None);
    }
}
