//! Resolving "where am I" into weather.
//!
//! The device capability is tried first. If it fails, an IP-based lookup
//! stands in for it; if that also fails the device failure
//! reason decides the message the user sees.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{fmt::Debug, sync::Arc};

use crate::{
    config::HomeLocation,
    error::{DeviceError, GeolocationError, LookupError},
    model::{ForecastData, WeatherReport},
    provider::WeatherService,
    units::UnitSystem,
};

pub mod ip_api;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Device location capability.
#[async_trait]
pub trait DeviceLocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, DeviceError>;
}

/// IP-based location lookup used when the device capability fails.
#[async_trait]
pub trait IpLocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, LookupError>;
}

/// Device capability backed by coordinates from the configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocator {
    home: Option<HomeLocation>,
}

impl ConfiguredLocator {
    pub fn new(home: Option<HomeLocation>) -> Self {
        Self { home }
    }
}

#[async_trait]
impl DeviceLocator for ConfiguredLocator {
    async fn locate(&self) -> Result<Coordinates, DeviceError> {
        self.home
            .map(|home| Coordinates { latitude: home.latitude, longitude: home.longitude })
            .ok_or(DeviceError::PositionUnavailable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverState {
    #[default]
    Idle,
    Requesting,
    TryingIpFallback,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSource {
    Device,
    IpFallback,
}

/// Weather for the resolved position.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub coordinates: Coordinates,
    pub source: PositionSource,
    pub report: WeatherReport,
    pub forecast: ForecastData,
}

#[derive(Debug)]
pub struct GeolocationResolver {
    device: Option<Arc<dyn DeviceLocator>>,
    ip: Arc<dyn IpLocator>,
    state: Mutex<ResolverState>,
}

impl GeolocationResolver {
    /// `device` is `None` when the environment has no location capability.
    pub fn new(device: Option<Arc<dyn DeviceLocator>>, ip: Arc<dyn IpLocator>) -> Self {
        Self { device, ip, state: Mutex::new(ResolverState::Idle) }
    }

    pub fn state(&self) -> ResolverState {
        *self.state.lock()
    }

    fn transition(&self, next: ResolverState) {
        let mut state = self.state.lock();
        tracing::debug!(from = ?*state, to = ?next, "geolocation state");
        *state = next;
    }

    pub async fn resolve(
        &self,
        service: &dyn WeatherService,
        unit: UnitSystem,
    ) -> Result<Resolved, GeolocationError> {
        self.transition(ResolverState::Requesting);

        let Some(device) = &self.device else {
            self.transition(ResolverState::Failed);
            return Err(GeolocationError::Unsupported);
        };

        let reason = match device.locate().await {
            Ok(coordinates) => {
                return match fetch_weather(service, coordinates, unit).await {
                    Ok((report, forecast)) => {
                        self.transition(ResolverState::Succeeded);
                        Ok(Resolved { coordinates, source: PositionSource::Device, report, forecast })
                    }
                    Err(err) => {
                        self.transition(ResolverState::Failed);
                        Err(GeolocationError::Fetch(err))
                    }
                };
            }
            Err(reason) => reason,
        };

        tracing::info!("Device location failed ({reason}), trying IP-based fallback");
        self.transition(ResolverState::TryingIpFallback);

        match self.ip_fallback(service, unit).await {
            Ok(resolved) => {
                self.transition(ResolverState::Succeeded);
                Ok(resolved)
            }
            Err(err) => {
                tracing::warn!("IP geolocation fallback failed: {err}");
                self.transition(ResolverState::Failed);
                Err(GeolocationError::Device(reason))
            }
        }
    }

    async fn ip_fallback(
        &self,
        service: &dyn WeatherService,
        unit: UnitSystem,
    ) -> Result<Resolved, LookupError> {
        let coordinates = self.ip.locate().await?;
        let (report, forecast) = fetch_weather(service, coordinates, unit).await?;
        Ok(Resolved { coordinates, source: PositionSource::IpFallback, report, forecast })
    }
}

/// Current conditions then forecast. The forecast reuses the place resolved
/// for the current conditions; one without a country is looked up again.
async fn fetch_weather(
    service: &dyn WeatherService,
    coordinates: Coordinates,
    unit: UnitSystem,
) -> Result<(WeatherReport, ForecastData), LookupError> {
    let Coordinates { latitude, longitude } = coordinates;

    let report = service.current_weather_by_coords(latitude, longitude, unit, None, None).await?;
    let forecast = service
        .forecast_by_coords(
            latitude,
            longitude,
            unit,
            Some(report.location.name.as_str()),
            Some(report.location.country.as_str()),
        )
        .await?;

    Ok((report, forecast))
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use crate::model::{Location, PlaceName, fixtures};
    use crate::provider::place_or_reverse;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Serves canned weather for any coordinates; optionally fails.
    #[derive(Debug, Default)]
    struct CannedService {
        fail: AtomicBool,
    }

    #[async_trait]
    impl WeatherService for CannedService {
        async fn geocode(&self, city_name: &str) -> Result<Location, LookupError> {
            Ok(fixtures::location(city_name))
        }

        async fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> PlaceName {
            PlaceName::unknown()
        }

        async fn current_weather_by_coords(
            &self,
            latitude: f64,
            longitude: f64,
            _unit: UnitSystem,
            _city_name: Option<&str>,
            _country: Option<&str>,
        ) -> Result<WeatherReport, LookupError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(LookupError::Http { status: 500, message: "boom".into() });
            }
            let mut report = fixtures::report("Here", 12.0);
            report.location.latitude = latitude;
            report.location.longitude = longitude;
            Ok(report)
        }

        async fn forecast_by_coords(
            &self,
            _latitude: f64,
            _longitude: f64,
            _unit: UnitSystem,
            city_name: Option<&str>,
            _country: Option<&str>,
        ) -> Result<ForecastData, LookupError> {
            Ok(fixtures::forecast(city_name.unwrap_or_default()))
        }
    }

    /// Names locations the way the HTTP client does and counts reverse
    /// geocodes.
    #[derive(Debug)]
    struct NamingService {
        place: PlaceName,
        reverses: AtomicUsize,
    }

    impl NamingService {
        fn new(name: &str, country: &str) -> Self {
            let place = PlaceName { name: name.into(), country: country.into() };
            Self { place, reverses: AtomicUsize::new(0) }
        }

        fn reverses(&self) -> usize {
            self.reverses.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherService for NamingService {
        async fn geocode(&self, city_name: &str) -> Result<Location, LookupError> {
            Ok(fixtures::location(city_name))
        }

        async fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> PlaceName {
            self.reverses.fetch_add(1, Ordering::SeqCst);
            self.place.clone()
        }

        async fn current_weather_by_coords(
            &self,
            latitude: f64,
            longitude: f64,
            _unit: UnitSystem,
            city_name: Option<&str>,
            country: Option<&str>,
        ) -> Result<WeatherReport, LookupError> {
            let place = place_or_reverse(self, latitude, longitude, city_name, country).await;
            let mut report = fixtures::report(&place.name, 12.0);
            report.location.country = place.country;
            Ok(report)
        }

        async fn forecast_by_coords(
            &self,
            latitude: f64,
            longitude: f64,
            _unit: UnitSystem,
            city_name: Option<&str>,
            country: Option<&str>,
        ) -> Result<ForecastData, LookupError> {
            let place = place_or_reverse(self, latitude, longitude, city_name, country).await;
            let mut forecast = fixtures::forecast(&place.name);
            forecast.location.country = place.country;
            Ok(forecast)
        }
    }

    fn resolver(device: Option<FakeDevice>, ip: FakeIp) -> GeolocationResolver {
        GeolocationResolver::new(
            device.map(|d| Arc::new(d) as Arc<dyn DeviceLocator>),
            Arc::new(ip),
        )
    }

    #[tokio::test]
    async fn device_success_feeds_weather_client() {
        let resolver = resolver(Some(FakeDevice(Ok(HERE))), ip_down());
        assert_eq!(resolver.state(), ResolverState::Idle);

        let resolved = resolver.resolve(&CannedService::default(), UnitSystem::Metric).await.unwrap();

        assert_eq!(resolved.source, PositionSource::Device);
        assert_eq!(resolved.coordinates, HERE);
        assert_eq!(resolved.report.location.latitude, HERE.latitude);
        assert_eq!(resolved.forecast.location.name, "Here");
        assert_eq!(resolver.state(), ResolverState::Succeeded);
    }

    #[tokio::test]
    async fn forecast_reuses_reverse_geocoded_place() {
        let service = NamingService::new("Oslo", "Norway");
        let resolver = resolver(Some(FakeDevice(Ok(HERE))), ip_down());

        let resolved = resolver.resolve(&service, UnitSystem::Metric).await.unwrap();

        assert_eq!(service.reverses(), 1);
        assert_eq!(resolved.report.location.name, "Oslo");
        assert_eq!(resolved.forecast.location.name, "Oslo");
        assert_eq!(resolved.forecast.location.country, "Norway");
    }

    #[tokio::test]
    async fn place_without_country_is_looked_up_again_for_forecast() {
        let service = NamingService::new(PlaceName::UNKNOWN_LOCATION, "");
        let resolver = resolver(Some(FakeDevice(Ok(HERE))), ip_down());

        let resolved = resolver.resolve(&service, UnitSystem::Metric).await.unwrap();

        assert_eq!(service.reverses(), 2);
        assert_eq!(resolved.forecast.location.name, "Unknown location");
    }

    #[tokio::test]
    async fn missing_capability_fails_as_unsupported() {
        let resolver = resolver(None, FakeIp(Ok(IP_HERE)));

        let err = resolver.resolve(&CannedService::default(), UnitSystem::Metric).await.unwrap_err();

        assert_eq!(err, GeolocationError::Unsupported);
        assert_eq!(resolver.state(), ResolverState::Failed);
    }

    #[tokio::test]
    async fn device_failure_falls_back_to_ip() {
        let resolver = resolver(Some(FakeDevice(Err(DeviceError::Timeout))), FakeIp(Ok(IP_HERE)));

        let resolved = resolver.resolve(&CannedService::default(), UnitSystem::Metric).await.unwrap();

        assert_eq!(resolved.source, PositionSource::IpFallback);
        assert_eq!(resolved.coordinates, IP_HERE);
        assert_eq!(resolver.state(), ResolverState::Succeeded);
    }

    #[tokio::test]
    async fn permission_denied_reason_survives_failed_fallback() {
        let resolver = resolver(Some(FakeDevice(Err(DeviceError::PermissionDenied))), ip_down());

        let err = resolver.resolve(&CannedService::default(), UnitSystem::Metric).await.unwrap_err();

        assert_eq!(err, GeolocationError::Device(DeviceError::PermissionDenied));
        assert!(err.user_message().contains("allow location access"));
        assert_eq!(resolver.state(), ResolverState::Failed);
    }

    #[tokio::test]
    async fn weather_failure_on_ip_path_reports_device_reason() {
        let service = CannedService::default();
        service.fail.store(true, Ordering::SeqCst);
        let resolver =
            resolver(Some(FakeDevice(Err(DeviceError::PositionUnavailable))), FakeIp(Ok(IP_HERE)));

        let err = resolver.resolve(&service, UnitSystem::Metric).await.unwrap_err();

        assert_eq!(err, GeolocationError::Device(DeviceError::PositionUnavailable));
    }

    #[tokio::test]
    async fn weather_failure_after_device_success_is_a_fetch_error() {
        let service = CannedService::default();
        service.fail.store(true, Ordering::SeqCst);
        let resolver = resolver(Some(FakeDevice(Ok(HERE))), FakeIp(Ok(IP_HERE)));

        let err = resolver.resolve(&service, UnitSystem::Metric).await.unwrap_err();

        assert!(matches!(err, GeolocationError::Fetch(LookupError::Http { status: 500, .. })));
        assert_eq!(resolver.state(), ResolverState::Failed);
    }

    #[tokio::test]
    async fn configured_locator_without_home_is_unavailable() {
        let locator = ConfiguredLocator::new(None);
        assert_eq!(locator.locate().await, Err(DeviceError::PositionUnavailable));

        let locator = ConfiguredLocator::new(Some(HomeLocation { latitude: 1.5, longitude: 2.5 }));
        assert_eq!(locator.locate().await, Ok(Coordinates { latitude: 1.5, longitude: 2.5 }));
    }
}
