//! Great-circle distances between bus coordinates.
//!
//! Coordinates are `(longitude, latitude)` in degrees, matching the bus
//! attributes `x` and `y`. Distances are in kilometres.

/// Mean Earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Crow-flies distance between two points.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon0, lat0) = (a.0.to_radians(), a.1.to_radians());
    let (lon1, lat1) = (b.0.to_radians(), b.1.to_radians());

    let h = ((lat1 - lat0) / 2.0).sin().powi(2)
        + lat0.cos() * lat1.cos() * ((lon0 - lon1) / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Distances between every pair; `result[i][j]` is from `from[i]` to `to[j]`.
pub fn haversine_matrix(from: &[(f64, f64)], to: &[(f64, f64)]) -> Vec<Vec<f64>> {
    from.iter()
        .map(|&a| to.iter().map(|&b| haversine_km(a, b)).collect())
        .collect()
}

/// True for a longitude in [-180, 180] and latitude in [-90, 90].
pub fn is_valid_coordinate((lon, lat): (f64, f64)) -> bool {
    (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BERLIN: (f64, f64) = (13.405, 52.52);
    const PARIS: (f64, f64) = (2.3522, 48.8566);
    const LONDON: (f64, f64) = (-0.1276, 51.5072);
    const NEW_YORK: (f64, f64) = (-74.006, 40.7128);

    fn close(actual: f64, expected: f64, tol_km: f64) -> bool {
        (actual - expected).abs() <= tol_km
    }

    #[test]
    fn test_city_pairs() {
        let d = haversine_km(BERLIN, PARIS);
        assert!(close(d, 878.0, 5.0), "Berlin-Paris {}", d);
        let d = haversine_km(LONDON, PARIS);
        assert!(close(d, 344.0, 5.0), "London-Paris {}", d);
        let d = haversine_km(LONDON, NEW_YORK);
        assert!(close(d, 5570.0, 15.0), "London-New York {}", d);
    }

    #[test]
    fn test_reference_pair() {
        // 0.7° east, 0.5° south of the first point
        let d = haversine_km((10.1, 52.6), (10.8, 52.1));
        assert!(close(d, 73.154, 0.01), "{}", d);
        let d = haversine_km((10.1, 52.6), (-34.0, 56.0));
        assert!(close(d, 2836.67, 0.05), "{}", d);
    }

    #[test]
    fn test_symmetric_and_zero() {
        assert_eq!(haversine_km(BERLIN, BERLIN), 0.0);
        let there = haversine_km(BERLIN, NEW_YORK);
        let back = haversine_km(NEW_YORK, BERLIN);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_antipodes_are_half_circumference() {
        let d = haversine_km((0.0, 0.0), (180.0, 0.0));
        assert!(close(d, std::f64::consts::PI * EARTH_RADIUS_KM, 1e-6));
    }

    #[test]
    fn test_matrix_shape() {
        let m = haversine_matrix(&[BERLIN, PARIS], &[LONDON, NEW_YORK, BERLIN]);
        assert_eq!(m.len(), 2);
        assert!(m.iter().all(|row| row.len() == 3));
        assert_eq!(m[0][2], 0.0);
        assert!((m[1][0] - haversine_km(PARIS, LONDON)).abs() < 1e-9);
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(is_valid_coordinate(BERLIN));
        assert!(!is_valid_coordinate((200.0, 10.0)));
        assert!(!is_valid_coordinate((10.0, -91.0)));
    }
}
