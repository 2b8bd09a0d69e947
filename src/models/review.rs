use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

/// Review lifecycle shared by bookings and shifting requests. A record starts
/// pending, a reviewer (listing owner, worker or admin) moves it to approved or
/// rejected, and nothing ever moves back to pending.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// A reviewer may decide a pending record and may revise a decision, but a
    /// decided record never returns to pending.
    pub fn can_transition(self, to: ReviewStatus) -> bool {
        match (self, to) {
            (ReviewStatus::Pending, ReviewStatus::Approved) => true,
            (ReviewStatus::Pending, ReviewStatus::Rejected) => true,
            (ReviewStatus::Approved, ReviewStatus::Rejected) => true,
            (ReviewStatus::Rejected, ReviewStatus::Approved) => true,
            _ => false,
        }
    }
}

/// Shifting requests extend the shared vocabulary with a terminal `completed`
/// state, reachable only from approved. Everything else delegates to the
/// shared rule.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShiftingStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl ShiftingStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ShiftingStatus::Pending),
            "approved" => Some(ShiftingStatus::Approved),
            "rejected" => Some(ShiftingStatus::Rejected),
            "completed" => Some(ShiftingStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftingStatus::Pending => "pending",
            ShiftingStatus::Approved => "approved",
            ShiftingStatus::Rejected => "rejected",
            ShiftingStatus::Completed => "completed",
        }
    }

    fn as_review(self) -> Option<ReviewStatus> {
        match self {
            ShiftingStatus::Pending => Some(ReviewStatus::Pending),
            ShiftingStatus::Approved => Some(ReviewStatus::Approved),
            ShiftingStatus::Rejected => Some(ReviewStatus::Rejected),
            ShiftingStatus::Completed => None,
        }
    }

    pub fn can_transition(self, to: ShiftingStatus) -> bool {
        match (self.as_review(), to.as_review()) {
            // Completed is terminal
            (None, _) => false,
            // Only an approved request can be completed
            (Some(from), None) => from == ReviewStatus::Approved,
            (Some(from), Some(to)) => from.can_transition(to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_decided() {
        assert!(ReviewStatus::Pending.can_transition(ReviewStatus::Approved));
        assert!(ReviewStatus::Pending.can_transition(ReviewStatus::Rejected));
    }

    #[test]
    fn decisions_never_return_to_pending() {
        assert!(!ReviewStatus::Approved.can_transition(ReviewStatus::Pending));
        assert!(!ReviewStatus::Rejected.can_transition(ReviewStatus::Pending));
        assert!(!ReviewStatus::Pending.can_transition(ReviewStatus::Pending));
    }

    #[test]
    fn decisions_can_be_revised() {
        assert!(ReviewStatus::Approved.can_transition(ReviewStatus::Rejected));
        assert!(ReviewStatus::Rejected.can_transition(ReviewStatus::Approved));
    }

    #[test]
    fn unknown_status_does_not_parse() {
        assert_eq!(ReviewStatus::parse("confirmed"), None);
        assert_eq!(ReviewStatus::parse("Approved"), None);
        assert_eq!(ReviewStatus::parse(""), None);
    }

    #[test]
    fn completed_only_from_approved() {
        assert!(ShiftingStatus::Approved.can_transition(ShiftingStatus::Completed));
        assert!(!ShiftingStatus::Pending.can_transition(ShiftingStatus::Completed));
        assert!(!ShiftingStatus::Rejected.can_transition(ShiftingStatus::Completed));
    }

    #[test]
    fn completed_is_terminal() {
        assert!(!ShiftingStatus::Completed.can_transition(ShiftingStatus::Approved));
        assert!(!ShiftingStatus::Completed.can_transition(ShiftingStatus::Pending));
        assert!(!ShiftingStatus::Completed.can_transition(ShiftingStatus::Completed));
    }

    #[test]
    fn booking_vocabulary_excludes_completed() {
        // "completed" belongs to shifting requests only
        assert!(ShiftingStatus::parse("completed").is_some());
        assert!(ReviewStatus::parse("completed").is_none());
    }
}
