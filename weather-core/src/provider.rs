use crate::{
    error::LookupError,
    model::{ForecastData, Location, PlaceName, WeatherReport},
    units::UnitSystem,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod open_meteo;

/// Geocoding and weather lookups.
///
/// Implementors supply the four primitive lookups; the city-name
/// compositions are provided on top of them.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    /// Resolve a city name to its best-matching location.
    async fn geocode(&self, city_name: &str) -> Result<Location, LookupError>;

    /// Best-effort place name for coordinates. Never fails: lookup problems
    /// yield [`PlaceName::unknown`].
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> PlaceName;

    async fn current_weather_by_coords(
        &self,
        latitude: f64,
        longitude: f64,
        unit: UnitSystem,
        city_name: Option<&str>,
        country: Option<&str>,
    ) -> Result<WeatherReport, LookupError>;

    async fn forecast_by_coords(
        &self,
        latitude: f64,
        longitude: f64,
        unit: UnitSystem,
        city_name: Option<&str>,
        country: Option<&str>,
    ) -> Result<ForecastData, LookupError>;

    async fn current_weather(
        &self,
        city_name: &str,
        unit: UnitSystem,
    ) -> Result<WeatherReport, LookupError> {
        let location = self.geocode(city_name).await?;
        self.current_weather_by_coords(
            location.latitude,
            location.longitude,
            unit,
            Some(location.name.as_str()),
            Some(location.country.as_str()),
        )
        .await
    }

    async fn forecast(&self, city_name: &str, unit: UnitSystem) -> Result<ForecastData, LookupError> {
        let location = self.geocode(city_name).await?;
        self.forecast_by_coords(
            location.latitude,
            location.longitude,
            unit,
            Some(location.name.as_str()),
            Some(location.country.as_str()),
        )
        .await
    }
}

/// Use the supplied name and country when both are known, otherwise ask
/// the service to reverse geocode the coordinates.
pub async fn place_or_reverse<S>(
    service: &S,
    latitude: f64,
    longitude: f64,
    city_name: Option<&str>,
    country: Option<&str>,
) -> PlaceName
where
    S: WeatherService + ?Sized,
{
    let known = |value: Option<&str>| value.filter(|v| !v.trim().is_empty()).map(str::to_string);

    match (known(city_name), known(country)) {
        (Some(name), Some(country)) => PlaceName { name, country },
        _ => service.reverse_geocode(latitude, longitude).await,
    }
}
