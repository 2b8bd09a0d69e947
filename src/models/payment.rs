use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Khalti,
    Cash,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Initiated,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Maps a Khalti lookup status onto the local vocabulary. Anything the
    /// gateway still considers in flight stays `initiated`; terminal gateway
    /// states other than Completed are failures.
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "Completed" => PaymentStatus::Completed,
            "Pending" | "Initiated" => PaymentStatus::Initiated,
            _ => PaymentStatus::Failed,
        }
    }
}

/// Payment state embedded by both bookings and shifting requests. Keeping one
/// shared sub-document gives a single place to correlate the locally generated
/// `purchase_order_id` with the gateway's `pidx`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub pidx: Option<String>,
    pub purchase_order_id: Option<String>,
    /// Rupees, as entered by the customer.
    pub amount: i64,
    pub verified_at: Option<DateTime>,
}

impl Payment {
    pub fn pending(method: PaymentMethod, amount: i64) -> Self {
        Payment {
            method,
            status: PaymentStatus::Pending,
            pidx: None,
            purchase_order_id: None,
            amount,
            verified_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_completed_maps_to_completed() {
        assert_eq!(PaymentStatus::from_gateway("Completed"), PaymentStatus::Completed);
    }

    #[test]
    fn in_flight_gateway_states_stay_initiated() {
        assert_eq!(PaymentStatus::from_gateway("Pending"), PaymentStatus::Initiated);
        assert_eq!(PaymentStatus::from_gateway("Initiated"), PaymentStatus::Initiated);
    }

    #[test]
    fn terminal_gateway_failures_map_to_failed() {
        assert_eq!(PaymentStatus::from_gateway("Expired"), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_gateway("User canceled"), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_gateway("Refunded"), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_gateway("Partially Refunded"), PaymentStatus::Failed);
    }

    #[test]
    fn new_payment_is_pending_without_gateway_reference() {
        let payment = Payment::pending(PaymentMethod::Khalti, 15000);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.pidx.is_none());
        assert!(payment.verified_at.is_none());
    }
}
