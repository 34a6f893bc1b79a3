/// Kilometers spanned by one degree of latitude.
const KM_PER_DEGREE: f64 = 111.32;

/// Check that a reference point is a plausible coordinate:
/// latitude in [-90, 90] (north/south), longitude in [-180, 180].
pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// Approximate ground distance in kilometers between a ride's pickup
/// point and a reference point.
///
/// This is an equirectangular (planar) approximation, not haversine:
/// longitude degrees are scaled by cos(reference latitude). Fine at
/// metro scale, degrades at high latitudes and long distances; swapping
/// in a great-circle formula is a behavior change, not a fix.
pub fn planar_distance_km(pickup_lat: f64, pickup_lng: f64, ref_lat: f64, ref_lng: f64) -> f64 {
    let d_lat = (pickup_lat - ref_lat) * KM_PER_DEGREE;
    let d_lng = (pickup_lng - ref_lng) * KM_PER_DEGREE * ref_lat.to_radians().cos();

    (d_lat * d_lat + d_lng * d_lng).sqrt()
}

/// Distance from pickup to the reference point, or `None` when the
/// reference is absent or out of range. Skipping is a designed no-op:
/// the ride passes through unannotated.
pub fn annotate(pickup_lat: f64, pickup_lng: f64, reference: Option<(f64, f64)>) -> Option<f64> {
    let (ref_lat, ref_lng) = reference?;
    if !is_valid_coordinate(ref_lat, ref_lng) {
        return None;
    }

    Some(planar_distance_km(pickup_lat, pickup_lng, ref_lat, ref_lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let d = planar_distance_km(40.0, -73.0, 40.0, -73.0);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_north() {
        // One degree of latitude is ~111.32 km everywhere
        let d = planar_distance_km(41.0, -73.0, 40.0, -73.0);
        assert!((d - 111.32).abs() < 0.01);
    }

    #[test]
    fn test_longitude_shrinks_with_latitude() {
        let at_equator = planar_distance_km(0.0, 1.0, 0.0, 0.0);
        let at_60_north = planar_distance_km(60.0, 1.0, 60.0, 0.0);

        assert!((at_equator - 111.32).abs() < 0.01);
        // cos(60°) = 0.5
        assert!((at_60_north - 111.32 / 2.0).abs() < 0.01);
    }

    #[test]
    fn test_reference_bounds() {
        assert!(is_valid_coordinate(90.0, 180.0));
        assert!(is_valid_coordinate(-90.0, -180.0));
        assert!(!is_valid_coordinate(90.1, 0.0));
        assert!(!is_valid_coordinate(0.0, -180.5));
    }

    #[test]
    fn test_annotate_skips_bad_references() {
        assert_eq!(annotate(40.0, -73.0, None), None);
        assert_eq!(annotate(40.0, -73.0, Some((91.0, -73.0))), None);
        assert_eq!(annotate(40.0, -73.0, Some((40.0, 181.0))), None);

        let d = annotate(40.0, -73.0, Some((41.0, -73.0))).unwrap();
        assert!((d - 111.32).abs() < 0.01);
    }
}
