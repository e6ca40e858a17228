//! Contribution scoring and the level ladder derived from it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Level reached by a contributor; always a pure function of the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserLevel {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl UserLevel {
    /// Highest level whose threshold does not exceed `score`.
    ///
    /// Negative scores are `BRONZE`.
    ///
    /// # Examples
    /// ```
    /// use roadguard::domain::UserLevel;
    ///
    /// assert_eq!(UserLevel::for_score(49), UserLevel::Bronze);
    /// assert_eq!(UserLevel::for_score(50), UserLevel::Silver);
    /// assert_eq!(UserLevel::for_score(-30), UserLevel::Bronze);
    /// ```
    pub fn for_score(score: i32) -> Self {
        match score {
            500.. => Self::Platinum,
            200.. => Self::Gold,
            50.. => Self::Silver,
            _ => Self::Bronze,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "BRONZE",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
            Self::Platinum => "PLATINUM",
        }
    }
}

/// Points awarded or deducted for contribution events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionPoints {
    pub report_alert: i32,
    pub alert_verified: i32,
    /// Magnitude; subtracted from the reporter's score.
    pub alert_removed: i32,
    pub vote_cast: i32,
}

impl Default for ContributionPoints {
    fn default() -> Self {
        Self {
            report_alert: 5,
            alert_verified: 10,
            alert_removed: 15,
            vote_cast: 1,
        }
    }
}

/// One atomic adjustment to a contributor's counters.
///
/// Repositories apply it inside the same transaction as the alert or vote
/// mutation that earned it, recomputing the level from the new score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionChange {
    pub user_id: UserId,
    pub score_delta: i32,
    pub reports_delta: i32,
    pub verified_delta: i32,
}

impl ContributionChange {
    pub fn score(user_id: UserId, score_delta: i32) -> Self {
        Self {
            user_id,
            score_delta,
            reports_delta: 0,
            verified_delta: 0,
        }
    }

    pub fn reported(user_id: UserId, points: &ContributionPoints) -> Self {
        Self {
            reports_delta: 1,
            ..Self::score(user_id, points.report_alert)
        }
    }

    /// Credit for `count` alerts stored together, such as an offline sync.
    pub fn reported_many(user_id: UserId, count: i32, points: &ContributionPoints) -> Self {
        Self {
            user_id,
            score_delta: points.report_alert * count,
            reports_delta: count,
            verified_delta: 0,
        }
    }

    pub fn verified(user_id: UserId, points: &ContributionPoints) -> Self {
        Self {
            verified_delta: 1,
            ..Self::score(user_id, points.alert_verified)
        }
    }

    pub fn removed(user_id: UserId, points: &ContributionPoints) -> Self {
        Self::score(user_id, -points.alert_removed)
    }
}

/// A user's contribution projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributorStats {
    pub user_id: UserId,
    pub contribution_score: i32,
    pub level: UserLevel,
    pub total_reports: i32,
    pub verified_reports: i32,
}

impl ContributorStats {
    /// Stats of a user with no recorded activity.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            contribution_score: 0,
            level: UserLevel::Bronze,
            total_reports: 0,
            verified_reports: 0,
        }
    }

    /// Apply `change`, keeping `level` consistent with the new score.
    ///
    /// Returns the new level when the change promoted the contributor.
    pub fn apply(&mut self, change: &ContributionChange) -> Option<UserLevel> {
        let previous = self.level;
        self.contribution_score += change.score_delta;
        self.total_reports += change.reports_delta;
        self.verified_reports += change.verified_delta;
        self.level = UserLevel::for_score(self.contribution_score);
        (self.level > previous).then_some(self.level)
    }
}
