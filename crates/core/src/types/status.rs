//! Purchase lifecycle status.
//!
//! A purchase starts out `ongoing` (pending) and moves exactly once to a
//! terminal state. Terminal purchases can then be removed by their owner.
//!
//! ```text
//! ongoing ──► completed ──┐
//!    │                    ├──► removed (row deleted)
//!    └──────► cancelled ──┘
//! ```

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not one of the known values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid purchase status: {0:?} (expected ongoing, completed or cancelled)")]
pub struct InvalidStatus(pub String);

/// Purchase status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "purchase_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    /// Awaiting a decision from the buyer.
    #[default]
    Ongoing,
    /// Buyer confirmed the purchase.
    Completed,
    /// Buyer cancelled the purchase.
    Cancelled,
}

impl PurchaseStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Ongoing, Self::Completed, Self::Cancelled];

    /// Returns `true` for states that can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a purchase in this state may move to `next`.
    ///
    /// Re-asserting `ongoing` on an ongoing purchase is allowed and is a no-op.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Ongoing, _))
    }

    /// Whether a purchase in this state may be deleted.
    #[must_use]
    pub const fn is_removable(self) -> bool {
        self.is_terminal()
    }

    /// States a purchase may be in for a change to `next` to be allowed.
    pub fn sources_for(next: Self) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |from| from.can_transition_to(next))
    }

    /// States from which a purchase may be deleted.
    pub fn removable() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|s| s.is_removable())
    }

    /// Lowercase wire/database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PurchaseStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(InvalidStatus(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_known_values() {
        assert_eq!("ongoing".parse::<PurchaseStatus>().unwrap(), PurchaseStatus::Ongoing);
        assert_eq!(
            " completed ".parse::<PurchaseStatus>().unwrap(),
            PurchaseStatus::Completed
        );
        assert_eq!(
            "cancelled".parse::<PurchaseStatus>().unwrap(),
            PurchaseStatus::Cancelled
        );
    }

    #[test]
    fn test_from_str_rejects_everything_else() {
        for bad in ["", "pending", "Completed", "delivered", "removed", "canceled"] {
            assert!(bad.parse::<PurchaseStatus>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_transitions_are_one_directional() {
        use PurchaseStatus::{Cancelled, Completed, Ongoing};

        assert!(Ongoing.can_transition_to(Completed));
        assert!(Ongoing.can_transition_to(Cancelled));
        assert!(Ongoing.can_transition_to(Ongoing));

        for terminal in [Completed, Cancelled] {
            for next in [Ongoing, Completed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_only_terminal_purchases_are_removable() {
        assert!(!PurchaseStatus::Ongoing.is_removable());
        assert!(PurchaseStatus::Completed.is_removable());
        assert!(PurchaseStatus::Cancelled.is_removable());
    }

    #[test]
    fn test_status_sets_follow_the_rules() {
        use PurchaseStatus::{Cancelled, Completed, Ongoing};

        for next in PurchaseStatus::ALL {
            assert_eq!(PurchaseStatus::sources_for(next).collect::<Vec<_>>(), vec![Ongoing]);
        }
        assert_eq!(
            PurchaseStatus::removable().collect::<Vec<_>>(),
            vec![Completed, Cancelled]
        );
    }

    #[test]
    fn test_serde_uses_lowercase() {
        assert_eq!(
            serde_json::to_string(&PurchaseStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(PurchaseStatus::default(), PurchaseStatus::Ongoing);
    }
}
