/// Bounding box of the supported service region.
///
/// The forecast API only carries data for one country; coordinates outside
/// the box are rejected before any network call is made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Geofence {
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Whether the coordinate lies inside the service region (inclusive).
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.lat_min
            && latitude <= self.lat_max
            && longitude >= self.lon_min
            && longitude <= self.lon_max
    }
}

impl Default for Geofence {
    /// Swiss service region.
    fn default() -> Self {
        Self::new(45.7, 47.9, 5.9, 10.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inside_region() {
        let fence = Geofence::default();
        // Bern
        assert!(fence.contains(46.948, 7.4474));
    }

    #[test]
    fn test_outside_region() {
        let fence = Geofence::default();
        // Berlin
        assert!(!fence.contains(52.52, 13.405));
        // Southern hemisphere
        assert!(!fence.contains(-33.86, 151.21));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let fence = Geofence::new(45.0, 47.0, 6.0, 10.0);
        assert!(fence.contains(45.0, 6.0));
        assert!(fence.contains(47.0, 10.0));
        assert!(!fence.contains(44.999, 6.0));
        assert!(!fence.contains(45.0, 10.001));
    }
}
