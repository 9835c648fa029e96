//! Location text helpers
//!
//! Reports carry location as free text. When the text is a `"lat, lng"`
//! pair it can drive the dashboard map; anything else stays opaque.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Geographic coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
}

impl GeoPoint {
    /// Create new point
    #[inline]
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Parse `"lat, lng"` into coordinates
///
/// Returns `None` unless the text is exactly two comma-separated finite
/// floats.
#[must_use]
pub fn parse_coordinates(text: &str) -> Option<GeoPoint> {
    let (lat, lng) = text.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    if !lat.is_finite() || !lng.is_finite() {
        return None;
    }
    Some(GeoPoint::new(lat, lng))
}

/// Render coordinates the way the report form prefills them
#[must_use]
pub fn format_location(point: GeoPoint) -> String {
    format!("{:.6}, {:.6}", point.lat, point.lng)
}

/// Geolocation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// No positioning source available
    #[error("Geolocation is not supported")]
    Unsupported,

    /// Positioning source failed
    #[error("Unable to retrieve your location: {0}")]
    Unavailable(String),
}

/// One-shot device position source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Request the current position
    async fn current_position(&self) -> Result<GeoPoint, LocationError>;
}

/// Position supplied up front (command-line flags, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPosition(pub Option<GeoPoint>);

#[async_trait]
impl Geolocator for FixedPosition {
    async fn current_position(&self) -> Result<GeoPoint, LocationError> {
        self.0.ok_or(LocationError::Unsupported)
    }
}

/// Prefill a location field from a geolocator
///
/// # Errors
/// Returns the geolocator's error unchanged.
pub async fn prefill_location(geolocator: &dyn Geolocator) -> Result<String, LocationError> {
    let point = geolocator.current_position().await?;
    tracing::debug!(lat = point.lat, lng = point.lng, "prefilled location");
    Ok(format_location(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_coordinate_pair() {
        assert_eq!(
            parse_coordinates("13.05, 80.20"),
            Some(GeoPoint::new(13.05, 80.20))
        );
        assert_eq!(
            parse_coordinates("-33.8688,151.2093"),
            Some(GeoPoint::new(-33.8688, 151.2093))
        );
    }

    #[test]
    fn free_text_is_not_coordinates() {
        assert_eq!(parse_coordinates("near the river"), None);
        assert_eq!(parse_coordinates("13.05"), None);
        assert_eq!(parse_coordinates("13.05, 80.20, 4"), None);
        assert_eq!(parse_coordinates("NaN, 1"), None);
        assert_eq!(parse_coordinates(""), None);
    }

    #[test]
    fn formats_six_decimals() {
        assert_eq!(
            format_location(GeoPoint::new(13.05, 80.2)),
            "13.050000, 80.200000"
        );
    }

    #[test]
    fn formatted_location_parses_back() {
        let point = GeoPoint::new(12.971_599, 77.594_566);
        assert_eq!(parse_coordinates(&format_location(point)), Some(point));
    }

    #[tokio::test]
    async fn prefill_uses_geolocator() {
        let geo = FixedPosition(Some(GeoPoint::new(1.5, -2.25)));
        assert_eq!(
            prefill_location(&geo).await.unwrap(),
            "1.500000, -2.250000"
        );
    }

    #[tokio::test]
    async fn prefill_surfaces_geolocator_error() {
        let mut geo = MockGeolocator::new();
        geo.expect_current_position()
            .times(1)
            .returning(|| Err(LocationError::Unavailable("permission denied".into())));

        let err = prefill_location(&geo).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to retrieve your location: permission denied"
        );
    }

    #[tokio::test]
    async fn missing_position_is_unsupported() {
        let err = prefill_location(&FixedPosition(None)).await.unwrap_err();
        assert_eq!(err, LocationError::Unsupported);
    }
}
