use std::sync::Arc;

use nimbus_api::{Location, WeatherDataSource};

use crate::device::DeviceLocation;
use crate::error::ErrorKind;
use crate::geofence::Geofence;

/// Turns a raw device position into a concrete location record.
pub struct LocationResolver {
    source: Arc<dyn WeatherDataSource>,
    geofence: Geofence,
}

impl LocationResolver {
    pub fn new(source: Arc<dyn WeatherDataSource>, geofence: Geofence) -> Self {
        Self { source, geofence }
    }

    /// Resolve a device position to the nearest known location.
    ///
    /// Positions outside the service region are rejected before any
    /// network call. A search returning zero matches behaves like a
    /// transport failure.
    pub async fn resolve(&self, position: DeviceLocation) -> Result<Location, ErrorKind> {
        if !self
            .geofence
            .contains(position.latitude, position.longitude)
        {
            tracing::warn!(
                lat = position.latitude,
                lon = position.longitude,
                "Device position outside service region"
            );
            return Err(ErrorKind::OutsideServiceRegion);
        }

        let query = format!("{:.4},{:.4}", position.latitude, position.longitude);
        let results = self
            .source
            .search_locations(&query)
            .await
            .map_err(ErrorKind::from)?;

        let Some(first) = results.first() else {
            tracing::warn!(%query, "Location search returned no results");
            return Err(ErrorKind::Network);
        };

        let location = self
            .source
            .location(&first.id)
            .await
            .map_err(ErrorKind::from)?;

        tracing::info!(
            name = %location.name,
            hash = %location.hash,
            "Resolved device position"
        );
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{location_fixture, FakeFailure, FakeSource};

    const BERN: DeviceLocation = DeviceLocation {
        latitude: 46.948,
        longitude: 7.4474,
    };

    fn resolver(source: Arc<FakeSource>) -> LocationResolver {
        LocationResolver::new(source, Geofence::default())
    }

    #[tokio::test]
    async fn test_resolves_position_inside_region() {
        let source = FakeSource::new(location_fixture("u0m4", "Bern"));
        let resolver = resolver(source.clone());

        let location = resolver.resolve(BERN).await.unwrap();

        assert_eq!(location.name, "Bern");
        assert_eq!(source.search_calls(), 1);
        assert_eq!(source.location_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejects_position_outside_region_without_network() {
        let source = FakeSource::new(location_fixture("u0m4", "Bern"));
        let resolver = resolver(source.clone());

        let err = resolver
            .resolve(DeviceLocation {
                latitude: 52.52,
                longitude: 13.405,
            })
            .await
            .unwrap_err();

        assert_eq!(err, ErrorKind::OutsideServiceRegion);
        assert_eq!(source.search_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_search_behaves_like_transport_failure() {
        let source = FakeSource::new(location_fixture("u0m4", "Bern"));
        source.set_empty_search(true);
        let resolver = resolver(source);

        let err = resolver.resolve(BERN).await.unwrap_err();

        assert_eq!(err, ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_search_failure_maps_to_network() {
        let source = FakeSource::new(location_fixture("u0m4", "Bern"));
        source.fail_search(FakeFailure::Status(502));
        let resolver = resolver(source);

        let err = resolver.resolve(BERN).await.unwrap_err();

        assert_eq!(err, ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_malformed_location_record_maps_to_data() {
        let source = FakeSource::new(location_fixture("u0m4", "Bern"));
        source.fail_location(FakeFailure::Decode);
        let resolver = resolver(source);

        let err = resolver.resolve(BERN).await.unwrap_err();

        assert_eq!(err, ErrorKind::Data);
    }
}
