//! Coordinate validation, distance, and grid addressing.

use super::*;
use rstest::{fixture, rstest};

fn at(latitude: f64, longitude: f64) -> Coordinates {
    Coordinates::new(latitude, longitude).expect("test coordinates are valid")
}

#[fixture]
fn dhaka() -> Coordinates {
    at(23.8103, 90.4125)
}

#[rstest]
#[case(90.0, 180.0)]
#[case(-90.0, -180.0)]
#[case(0.0, 0.0)]
fn accepts_boundary_coordinates(#[case] lat: f64, #[case] lon: f64) {
    assert!(Coordinates::new(lat, lon).is_ok());
}

#[rstest]
#[case(90.0001, 0.0, CoordinateError::LatitudeOutOfRange(90.0001))]
#[case(0.0, -180.5, CoordinateError::LongitudeOutOfRange(-180.5))]
#[case(f64::NAN, 0.0, CoordinateError::NotFinite)]
#[case(0.0, f64::INFINITY, CoordinateError::NotFinite)]
fn rejects_out_of_range_coordinates(
    #[case] lat: f64,
    #[case] lon: f64,
    #[case] expected: CoordinateError,
) {
    assert_eq!(Coordinates::new(lat, lon), Err(expected));
}

#[rstest]
fn distance_to_self_is_zero(dhaka: Coordinates) {
    assert_eq!(haversine_distance(dhaka, dhaka), 0.0);
}

#[rstest]
fn distance_is_symmetric(dhaka: Coordinates) {
    let other = at(23.8283, 90.4125);
    let there = haversine_distance(dhaka, other);
    let back = haversine_distance(other, dhaka);
    assert!((there - back).abs() < 1e-9);
}

#[rstest]
fn two_kilometres_north_of_dhaka(dhaka: Coordinates) {
    // 0.018 degrees of latitude is roughly 2 km.
    let north = at(23.8283, 90.4125);
    let distance = haversine_distance(dhaka, north);
    assert!((distance - 2_001.5).abs() < 10.0, "got {distance}");
}

#[test]
fn antipodal_points_are_half_the_circumference_apart() {
    let distance = haversine_distance(at(0.0, 0.0), at(0.0, 180.0));
    let half = std::f64::consts::PI * EARTH_RADIUS_METRES;
    assert!((distance - half).abs() < 1.0);
}

#[rstest]
fn nearest_within_filters_and_sorts(dhaka: Coordinates) {
    let far = at(23.8283, 90.4125);
    let near = at(23.8113, 90.4125);
    let nearer = at(23.8104, 90.4125);
    let kept = nearest_within(
        vec![("far", far), ("near", near), ("nearer", nearer)],
        dhaka,
        SearchRadius::NOTIFICATION,
        |(_, position)| *position,
    );
    let names: Vec<_> = kept.iter().map(|((name, _), _)| *name).collect();
    assert_eq!(names, vec!["nearer", "near"]);
    assert!(kept[0].1 < kept[1].1);
}

#[rstest]
#[case(0.0)]
#[case(-5.0)]
#[case(f64::NAN)]
fn search_radius_must_be_positive(#[case] metres: f64) {
    assert!(SearchRadius::new(metres).is_none());
}

#[test]
fn cell_uses_floor_division() {
    assert_eq!(at(23.8103, 90.4125).cell(), GridCell::from_indices(2381, 9041));
    assert_eq!(at(-0.005, -0.005).cell(), GridCell::from_indices(-1, -1));
}

#[test]
fn cell_renders_as_topic_name() {
    assert_eq!(GridCell::from_indices(2381, -9041).to_string(), "cell_2381_-9041");
}

#[test]
fn neighbours_exclude_the_centre() {
    let centre = GridCell::from_indices(10, 20);
    let neighbours = centre.neighbours();
    assert_eq!(neighbours.len(), 8);
    assert!(!neighbours.contains(&centre));
    for cell in neighbours {
        assert!((cell.lat_index() - 10).abs() <= 1);
        assert!((cell.lon_index() - 20).abs() <= 1);
    }
}

#[test]
fn neighbourhood_has_nine_distinct_cells() {
    let mut cells = GridCell::from_indices(0, 0).neighbourhood().to_vec();
    cells.sort();
    cells.dedup();
    assert_eq!(cells.len(), 9);
}

#[rstest]
#[case(at(23.815, 90.415), at(23.814, 90.416))]
#[case(at(23.8199, 90.41), at(23.8201, 90.41))]
fn boundary_positions_share_a_neighbourhood(#[case] a: Coordinates, #[case] b: Coordinates) {
    assert!(a.cell().neighbourhood().contains(&b.cell()));
    assert!(b.cell().neighbourhood().contains(&a.cell()));
}

#[test]
fn positions_across_a_cell_edge_land_in_adjacent_cells() {
    let below = at(23.8199, 90.41).cell();
    let above = at(23.8201, 90.41).cell();
    assert_ne!(below, above);
    assert_eq!(above.lat_index() - below.lat_index(), 1);
}
