//! Geographic primitives: validated coordinates, great-circle distance, and
//! the fixed 0.01° grid used as the real-time broadcast topic space.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Mean Earth radius used by [`haversine_distance`].
pub const EARTH_RADIUS_METRES: f64 = 6_371_000.0;

/// Edge length of one grid cell, in degrees.
pub const GRID_CELL_DEGREES: f64 = 0.01;

/// Reasons a latitude/longitude pair is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude and longitude must be finite numbers")]
    NotFinite,
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
}

/// A WGS84 position in decimal degrees.
///
/// # Examples
/// ```
/// use roadguard::domain::geo::Coordinates;
///
/// assert!(Coordinates::new(23.8103, 90.4125).is_ok());
/// assert!(Coordinates::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Grid cell containing this position.
    pub fn cell(&self) -> GridCell {
        GridCell::containing(*self)
    }
}

/// Great-circle distance between two positions in metres.
///
/// Symmetric, zero for identical inputs, and never negative.
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().atan2((1.0 - h).clamp(0.0, 1.0).sqrt());
    EARTH_RADIUS_METRES * c
}

/// Positive, finite search radius in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRadius(f64);

impl SearchRadius {
    /// Radius used for "alerts near me" lookups and nearby notifications.
    pub const NOTIFICATION: SearchRadius = SearchRadius(500.0);
    /// Radius used for the SOS map view.
    pub const MAP_VIEW: SearchRadius = SearchRadius(10_000.0);

    pub fn new(metres: f64) -> Option<Self> {
        (metres.is_finite() && metres > 0.0).then_some(Self(metres))
    }

    pub fn metres(&self) -> f64 {
        self.0
    }
}

/// Keep the items within `radius` of `centre`, nearest first.
///
/// Each kept item is paired with its distance in metres. Items exactly on the
/// boundary are included.
pub fn nearest_within<T>(
    items: impl IntoIterator<Item = T>,
    centre: Coordinates,
    radius: SearchRadius,
    position_of: impl Fn(&T) -> Coordinates,
) -> Vec<(T, f64)> {
    let mut kept: Vec<(T, f64)> = items
        .into_iter()
        .map(|item| {
            let distance = haversine_distance(centre, position_of(&item));
            (item, distance)
        })
        .filter(|(_, distance)| *distance <= radius.metres())
        .collect();
    kept.sort_by(|a, b| a.1.total_cmp(&b.1));
    kept
}

/// One cell of the fixed 0.01° grid, addressed by integer indices.
///
/// Rendered as `cell_{lat}_{lon}` wherever a textual topic name is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    lat_index: i32,
    lon_index: i32,
}

impl GridCell {
    pub const fn from_indices(lat_index: i32, lon_index: i32) -> Self {
        Self {
            lat_index,
            lon_index,
        }
    }

    /// `floor(lat / 0.01), floor(lon / 0.01)`. Validated coordinates keep both
    /// indices within ±18000, so the casts cannot truncate.
    pub fn containing(position: Coordinates) -> Self {
        Self {
            lat_index: (position.latitude / GRID_CELL_DEGREES).floor() as i32,
            lon_index: (position.longitude / GRID_CELL_DEGREES).floor() as i32,
        }
    }

    pub fn lat_index(&self) -> i32 {
        self.lat_index
    }

    pub fn lon_index(&self) -> i32 {
        self.lon_index
    }

    /// The eight cells surrounding this one, excluding itself.
    pub fn neighbours(&self) -> [GridCell; 8] {
        let mut out = [*self; 8];
        let mut slot = 0;
        for d_lat in -1..=1 {
            for d_lon in -1..=1 {
                if d_lat == 0 && d_lon == 0 {
                    continue;
                }
                out[slot] = Self::from_indices(self.lat_index + d_lat, self.lon_index + d_lon);
                slot += 1;
            }
        }
        out
    }

    /// This cell followed by its eight neighbours.
    pub fn neighbourhood(&self) -> [GridCell; 9] {
        let mut out = [*self; 9];
        out[1..].copy_from_slice(&self.neighbours());
        out
    }
}

impl std::fmt::Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell_{}_{}", self.lat_index, self.lon_index)
    }
}

#[cfg(test)]
#[path = "geo_tests.rs"]
mod tests;
