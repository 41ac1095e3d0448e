use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    Config,
    config::Endpoints,
    error::LookupError,
    http::fetch_json,
    model::{CurrentWeather, DailyForecast, ForecastData, Location, PlaceName, WeatherReport},
    units::UnitSystem,
    weather_code,
};

use super::{WeatherService, place_or_reverse};

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const REVERSE_GEOCODING_URL: &str =
    "https://api.bigdatacloud.net/data/reverse-geocode-client";

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,weather_code,pressure_msl,wind_speed_10m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,apparent_temperature_max,apparent_temperature_min,sunrise,sunset,precipitation_probability_max";

/// Days of daily aggregates requested per forecast.
pub const FORECAST_DAYS: u8 = 7;

/// Open-Meteo geocoding + forecast, with BigDataCloud for reverse geocoding.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    endpoints: Endpoints,
}

impl OpenMeteoClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self::with_client(Client::new(), endpoints)
    }

    pub fn with_client(http: Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    /// Build a client honouring the configured endpoints and timeout.
    /// Without a configured timeout the transport default applies.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        Ok(Self::with_client(http, config.endpoints.clone()))
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    async fn try_reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<PlaceName, LookupError> {
        let query = ReverseQuery { latitude, longitude, locality_language: "en" };
        let parsed: ReverseResponse = fetch_json(
            self.http.get(&self.endpoints.reverse_geocoding).query(&query),
            "reverse geocode",
        )
        .await?;

        let name = non_empty(parsed.city)
            .or_else(|| non_empty(parsed.locality))
            .unwrap_or_else(|| PlaceName::UNKNOWN_LOCATION.to_string());
        let country = non_empty(parsed.country_name).unwrap_or_default();

        Ok(PlaceName { name, country })
    }
}

#[derive(Debug, Serialize)]
struct GeocodeQuery<'a> {
    name: &'a str,
    count: u8,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReverseQuery<'a> {
    latitude: f64,
    longitude: f64,
    #[serde(rename = "localityLanguage")]
    locality_language: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    city: Option<String>,
    locality: Option<String>,
    #[serde(rename = "countryName")]
    country_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct CurrentQuery<'a> {
    latitude: f64,
    longitude: f64,
    current: &'a str,
    temperature_unit: &'a str,
    wind_speed_unit: &'a str,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: OmCurrent,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: String,
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: f64,
    weather_code: i32,
    pressure_msl: f64,
    wind_speed_10m: f64,
}

#[derive(Debug, Serialize)]
struct DailyQuery<'a> {
    latitude: f64,
    longitude: f64,
    daily: &'a str,
    temperature_unit: &'a str,
    forecast_days: u8,
    timezone: &'a str,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    daily: OmDaily,
}

/// Daily arrays as sent. Entries are `null` where a model has no data,
/// typically the tail beyond its horizon.
#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    weather_code: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    apparent_temperature_max: Vec<Option<f64>>,
    apparent_temperature_min: Vec<Option<f64>>,
    sunrise: Vec<Option<String>>,
    sunset: Vec<Option<String>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
}

impl OmDaily {
    /// First array whose length differs from `time`. Precipitation may be
    /// omitted entirely.
    fn mismatched_field(&self) -> Option<&'static str> {
        let days = self.time.len();
        let precipitation = match self.precipitation_probability_max.len() {
            0 => days,
            len => len,
        };

        [
            ("weather_code", self.weather_code.len()),
            ("temperature_2m_max", self.temperature_2m_max.len()),
            ("temperature_2m_min", self.temperature_2m_min.len()),
            ("apparent_temperature_max", self.apparent_temperature_max.len()),
            ("apparent_temperature_min", self.apparent_temperature_min.len()),
            ("sunrise", self.sunrise.len()),
            ("sunset", self.sunset.len()),
            ("precipitation_probability_max", precipitation),
        ]
        .into_iter()
        .find(|(_, len)| *len != days)
        .map(|(name, _)| name)
    }

    /// Number of leading days with every required value present.
    fn complete_days(&self) -> usize {
        let temperatures = [
            &self.temperature_2m_max,
            &self.temperature_2m_min,
            &self.apparent_temperature_max,
            &self.apparent_temperature_min,
        ];

        (0..self.time.len())
            .take_while(|&day| {
                present(&self.weather_code, day)
                    && temperatures.iter().all(|values| present(values, day))
                    && present(&self.sunrise, day)
                    && present(&self.sunset, day)
            })
            .count()
    }

    /// Validate the shape and keep the complete leading days.
    fn into_forecast(self) -> Result<DailyForecast, LookupError> {
        if let Some(field) = self.mismatched_field() {
            return Err(LookupError::InvalidResponse(format!(
                "forecast payload: daily.{field} length differs from daily.time ({} days)",
                self.time.len()
            )));
        }

        let days = self.complete_days();
        if days < self.time.len() {
            tracing::warn!(
                days,
                returned = self.time.len(),
                "dropping forecast days with missing values"
            );
        }

        let precipitation = if self.precipitation_probability_max.is_empty() {
            vec![None; days]
        } else {
            self.precipitation_probability_max
                .into_iter()
                .take(days)
                .map(|p| p.map(percent))
                .collect()
        };

        Ok(DailyForecast {
            time: self.time.into_iter().take(days).collect(),
            weather_code: leading(self.weather_code, days),
            temperature_max: leading(self.temperature_2m_max, days),
            temperature_min: leading(self.temperature_2m_min, days),
            apparent_temperature_max: leading(self.apparent_temperature_max, days),
            apparent_temperature_min: leading(self.apparent_temperature_min, days),
            sunrise: leading(self.sunrise, days),
            sunset: leading(self.sunset, days),
            precipitation_probability_max: precipitation,
        })
    }
}

fn present<T>(values: &[Option<T>], day: usize) -> bool {
    matches!(values.get(day), Some(Some(_)))
}

fn leading<T>(values: Vec<Option<T>>, days: usize) -> Vec<T> {
    values.into_iter().take(days).flatten().collect()
}

#[async_trait]
impl WeatherService for OpenMeteoClient {
    async fn geocode(&self, city_name: &str) -> Result<Location, LookupError> {
        tracing::debug!(city = city_name, "geocoding");

        let query = GeocodeQuery { name: city_name, count: 1, format: "json" };
        let parsed: GeocodeResponse = fetch_json(
            self.http.get(&self.endpoints.geocoding).query(&query),
            "geocode",
        )
        .await?;

        let result = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NotFound(city_name.to_string()))?;

        Ok(Location {
            name: result.name,
            country: result.country.unwrap_or_default(),
            latitude: result.latitude,
            longitude: result.longitude,
        })
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> PlaceName {
        match self.try_reverse_geocode(latitude, longitude).await {
            Ok(place) => {
                tracing::info!("Reverse geocoded to: {}", place.name);
                place
            }
            Err(err) => {
                tracing::warn!("Reverse geocode failed: {err}");
                PlaceName::unknown()
            }
        }
    }

    async fn current_weather_by_coords(
        &self,
        latitude: f64,
        longitude: f64,
        unit: UnitSystem,
        city_name: Option<&str>,
        country: Option<&str>,
    ) -> Result<WeatherReport, LookupError> {
        tracing::debug!(latitude, longitude, %unit, "fetching current weather");

        let query = CurrentQuery {
            latitude,
            longitude,
            current: CURRENT_FIELDS,
            temperature_unit: unit.temperature_param(),
            wind_speed_unit: unit.wind_speed_param(),
        };
        let parsed: CurrentResponse = fetch_json(
            self.http.get(&self.endpoints.forecast).query(&query),
            "current weather",
        )
        .await?;

        let place = place_or_reverse(self, latitude, longitude, city_name, country).await;

        let current = parsed.current;
        let info = weather_code::lookup(current.weather_code);

        Ok(WeatherReport {
            location: Location { name: place.name, country: place.country, latitude, longitude },
            current: CurrentWeather {
                time: current.time,
                temperature: current.temperature_2m,
                apparent_temperature: current.apparent_temperature,
                humidity: percent(current.relative_humidity_2m),
                pressure: current.pressure_msl,
                wind_speed: current.wind_speed_10m,
                weather_code: current.weather_code,
                weather_description: info.description.to_string(),
                weather_icon: info.icon.to_string(),
            },
        })
    }

    async fn forecast_by_coords(
        &self,
        latitude: f64,
        longitude: f64,
        unit: UnitSystem,
        city_name: Option<&str>,
        country: Option<&str>,
    ) -> Result<ForecastData, LookupError> {
        tracing::debug!(latitude, longitude, %unit, "fetching daily forecast");

        let query = DailyQuery {
            latitude,
            longitude,
            daily: DAILY_FIELDS,
            temperature_unit: unit.temperature_param(),
            forecast_days: FORECAST_DAYS,
            timezone: "auto",
        };
        let parsed: DailyResponse = fetch_json(
            self.http.get(&self.endpoints.forecast).query(&query),
            "forecast",
        )
        .await?;

        let daily = parsed.daily.into_forecast()?;

        let place = place_or_reverse(self, latitude, longitude, city_name, country).await;

        Ok(ForecastData {
            location: Location { name: place.name, country: place.country, latitude, longitude },
            daily,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
