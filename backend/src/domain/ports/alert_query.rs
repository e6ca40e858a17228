//! Driving port for alert and contribution reads.

use async_trait::async_trait;

use crate::domain::alert::{Alert, AlertFilter, AlertStatus};
use crate::domain::geo::{Coordinates, SearchRadius};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::{AlertId, ContributorStats, Error, UserId, VoteDirection};

/// An alert as seen by a particular caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertView {
    pub alert: Alert,
    pub caller_vote: Option<VoteDirection>,
}

/// A live alert paired with its distance from the query centre.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyAlert {
    pub alert: Alert,
    pub distance_metres: f64,
}

/// A listed alert; the distance is present when the listing had a centre.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedAlert {
    pub alert: Alert,
    pub distance_metres: Option<f64>,
}

/// One leaderboard row; ranks start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub stats: ContributorStats,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertQuery: Send + Sync {
    /// Read one alert, including `viewer`'s vote when a viewer is known.
    async fn get(&self, viewer: Option<UserId>, id: &AlertId) -> Result<AlertView, Error>;

    /// Live alerts within `radius` of `centre`, nearest first.
    async fn nearby(
        &self,
        centre: Coordinates,
        radius: SearchRadius,
    ) -> Result<Vec<NearbyAlert>, Error>;

    /// Unexpired alerts matching `filter`, one page at a time.
    ///
    /// With a centre, only alerts within `radius` are listed, nearest first;
    /// otherwise the most severe come first, newest first within a severity.
    async fn list(
        &self,
        filter: AlertFilter,
        near: Option<(Coordinates, SearchRadius)>,
        page: PageRequest,
    ) -> Result<Page<ListedAlert>, Error>;

    /// Live alerts matching the area and road name text, newest first.
    async fn in_area(&self, filter: AlertFilter) -> Result<Vec<Alert>, Error>;

    /// Alerts `reporter` filed, newest first, optionally in one status.
    async fn reported_by(
        &self,
        reporter: &UserId,
        status: Option<AlertStatus>,
        page: PageRequest,
    ) -> Result<Page<Alert>, Error>;

    /// Top `limit` contributors by score.
    async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, Error>;

    /// Contribution stats; zeroes for a user with no activity.
    async fn contribution(&self, user_id: &UserId) -> Result<ContributorStats, Error>;
}
