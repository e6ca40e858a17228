//! Votes and the verification threshold.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AlertId, UserId};

/// Direction of a single user's vote on an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn from_upvote(is_upvote: bool) -> Self {
        if is_upvote { Self::Up } else { Self::Down }
    }

    pub fn is_upvote(&self) -> bool {
        matches!(self, Self::Up)
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// One stored vote; unique per `(alert_id, user_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vote {
    pub alert_id: AlertId,
    pub user_id: UserId,
    pub direction: VoteDirection,
}

/// Atomic vote mutation handed to the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    /// First vote by this user; credits the voter's cast bonus.
    Cast {
        direction: VoteDirection,
        voter_bonus: i32,
    },
    /// Switch an existing vote; no score change.
    Flip { to: VoteDirection },
    /// Delete an existing vote; no score change.
    Retract { direction: VoteDirection },
}

impl VoteChange {
    /// Whether the alert must still be open (not removed or expired) for
    /// this change to apply. Retractions are always allowed.
    pub fn needs_open_alert(&self) -> bool {
        !matches!(self, Self::Retract { .. })
    }

    /// `(upvote delta, downvote delta)` this change applies to the counters.
    pub fn counter_deltas(&self) -> (i32, i32) {
        match self {
            Self::Cast {
                direction: VoteDirection::Up,
                ..
            } => (1, 0),
            Self::Cast {
                direction: VoteDirection::Down,
                ..
            } => (0, 1),
            Self::Flip {
                to: VoteDirection::Up,
            } => (1, -1),
            Self::Flip {
                to: VoteDirection::Down,
            } => (-1, 1),
            Self::Retract {
                direction: VoteDirection::Up,
            } => (-1, 0),
            Self::Retract {
                direction: VoteDirection::Down,
            } => (0, -1),
        }
    }
}

/// Minimum community support before an alert counts as verified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationThreshold {
    pub min_upvotes: u32,
    pub min_ratio: f64,
}

impl Default for VerificationThreshold {
    fn default() -> Self {
        Self {
            min_upvotes: 3,
            min_ratio: 0.7,
        }
    }
}

impl VerificationThreshold {
    /// `upvotes ≥ min_upvotes` and `upvotes / (upvotes + downvotes) ≥ min_ratio`.
    ///
    /// # Examples
    /// ```
    /// use roadguard::domain::VerificationThreshold;
    ///
    /// let threshold = VerificationThreshold::default();
    /// assert!(threshold.is_met(3, 1));
    /// assert!(!threshold.is_met(3, 2));
    /// assert!(!threshold.is_met(2, 0));
    /// ```
    pub fn is_met(&self, upvotes: u32, downvotes: u32) -> bool {
        if upvotes < self.min_upvotes || upvotes == 0 {
            return false;
        }
        let total = f64::from(upvotes) + f64::from(downvotes);
        f64::from(upvotes) / total >= self.min_ratio
    }
}
