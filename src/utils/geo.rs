const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Check if a point is within the given radius of a reference place
pub fn is_within_radius(
    lat: f64,
    lng: f64,
    center_lat: f64,
    center_lng: f64,
    max_radius_km: f64,
) -> bool {
    haversine_distance(lat, lng, center_lat, center_lng) <= max_radius_km
}

/// Axis-aligned lat/lng box used to prefilter gazetteer queries before the
/// exact haversine check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Box around a center point sized to `radius_km`.
    ///
    /// Uses 110 km per degree of latitude and 111·cos(lat) km per degree of
    /// longitude; both are slight underestimates so the box always contains
    /// the radius circle.
    pub fn around(lat: f64, lng: f64, radius_km: f64) -> Self {
        let lat_delta = radius_km / 110.0;
        let lng_delta = radius_km / (111.0 * lat.to_radians().cos());

        Self {
            min_lat: lat - lat_delta,
            max_lat: lat + lat_delta,
            min_lng: lng - lng_delta,
            max_lng: lng + lng_delta,
        }
    }

    /// Smallest box holding every `(lat, lng)` point, grown by `padding_deg`
    /// on each side. `None` for an empty slice.
    pub fn enclosing(points: &[(f64, f64)], padding_deg: f64) -> Option<Self> {
        let (first_lat, first_lng) = *points.first()?;
        let mut bbox = Self {
            min_lat: first_lat,
            max_lat: first_lat,
            min_lng: first_lng,
            max_lng: first_lng,
        };

        for &(lat, lng) in &points[1..] {
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
            bbox.min_lng = bbox.min_lng.min(lng);
            bbox.max_lng = bbox.max_lng.max(lng);
        }

        bbox.min_lat -= padding_deg;
        bbox.max_lat += padding_deg;
        bbox.min_lng -= padding_deg;
        bbox.max_lng += padding_deg;
        Some(bbox)
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lng..=self.max_lng).contains(&lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BERLIN: (f64, f64) = (52.5200, 13.4050);
    const POZNAN: (f64, f64) = (52.4064, 16.9252);

    #[test]
    fn test_haversine_berlin_poznan() {
        let distance = haversine_distance(BERLIN.0, BERLIN.1, POZNAN.0, POZNAN.1);
        // Roughly 240 km as the crow flies
        assert!(distance > 230.0 && distance < 250.0, "got {distance}");
    }

    #[test]
    fn test_haversine_same_point_is_zero() {
        assert_eq!(haversine_distance(BERLIN.0, BERLIN.1, BERLIN.0, BERLIN.1), 0.0);
    }

    #[test]
    fn test_within_radius() {
        let nearby = (52.53, 13.41);
        assert!(is_within_radius(nearby.0, nearby.1, BERLIN.0, BERLIN.1, 10.0));
        assert!(!is_within_radius(POZNAN.0, POZNAN.1, BERLIN.0, BERLIN.1, 100.0));
    }

    #[test]
    fn test_bounding_box_contains_radius_circle() {
        let radius_km = 50.0;
        let bbox = BoundingBox::around(BERLIN.0, BERLIN.1, radius_km);

        // Points exactly `radius_km` away along each axis stay inside the box.
        let north = BERLIN.0 + radius_km / 111.19;
        let east = BERLIN.1 + radius_km / (111.19 * BERLIN.0.to_radians().cos());
        assert!(bbox.contains(north, BERLIN.1));
        assert!(bbox.contains(BERLIN.0, east));
        assert!(!bbox.contains(POZNAN.0, POZNAN.1));
    }

    #[test]
    fn test_enclosing_box_pads_every_side() {
        let bbox = BoundingBox::enclosing(&[BERLIN, POZNAN], 0.1).unwrap();
        assert!((bbox.min_lng - (BERLIN.1 - 0.1)).abs() < 1e-9);
        assert!((bbox.max_lng - (POZNAN.1 + 0.1)).abs() < 1e-9);
        assert!((bbox.max_lat - (BERLIN.0 + 0.1)).abs() < 1e-9);
        assert!(BoundingBox::enclosing(&[], 0.1).is_none());
    }
}
