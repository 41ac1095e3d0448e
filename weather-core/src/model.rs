use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
    units::{UnitSystem, convert_temperature, convert_wind_speed},
    weather_code::{self, WeatherInfo},
};

/// Timestamp layout the provider uses for local times (`2024-05-01T14:15`).
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parse a provider local time, tolerating an optional seconds component.
pub fn parse_local_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, LOCAL_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// `"Name, Country"`, or just the name when the country is unknown.
    pub fn display_name(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// Place name produced by reverse geocoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceName {
    pub name: String,
    pub country: String,
}

impl PlaceName {
    pub const UNKNOWN_LOCATION: &'static str = "Unknown location";

    pub fn unknown() -> Self {
        Self { name: Self::UNKNOWN_LOCATION.to_string(), country: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub time: String,
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: u8,
    /// Mean sea level pressure in hPa.
    pub pressure: f64,
    pub wind_speed: f64,
    pub weather_code: i32,
    pub weather_description: String,
    pub weather_icon: String,
}

impl CurrentWeather {
    pub fn observed_at(&self) -> Option<NaiveDateTime> {
        parse_local_time(&self.time)
    }

    /// Copy with temperatures and wind speed expressed in `to`.
    pub fn converted(&self, from: UnitSystem, to: UnitSystem) -> Self {
        Self {
            temperature: convert_temperature(self.temperature, from, to),
            apparent_temperature: convert_temperature(self.apparent_temperature, from, to),
            wind_speed: convert_wind_speed(self.wind_speed, from, to),
            ..self.clone()
        }
    }
}

/// Result of a current-conditions lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: Location,
    pub current: CurrentWeather,
}

impl WeatherReport {
    pub fn converted(&self, from: UnitSystem, to: UnitSystem) -> Self {
        Self { location: self.location.clone(), current: self.current.converted(from, to) }
    }
}

/// Daily aggregates as parallel arrays indexed by day offset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyForecast {
    pub time: Vec<String>,
    pub weather_code: Vec<i32>,
    pub temperature_max: Vec<f64>,
    pub temperature_min: Vec<f64>,
    pub apparent_temperature_max: Vec<f64>,
    pub apparent_temperature_min: Vec<f64>,
    pub sunrise: Vec<String>,
    pub sunset: Vec<String>,
    pub precipitation_probability_max: Vec<Option<u8>>,
}

impl DailyForecast {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn day(&self, index: usize) -> Option<DayForecast<'_>> {
        let code = *self.weather_code.get(index)?;
        Some(DayForecast {
            date: self.time.get(index)?,
            weather_code: code,
            info: weather_code::lookup(code),
            temperature_max: *self.temperature_max.get(index)?,
            temperature_min: *self.temperature_min.get(index)?,
            apparent_temperature_max: *self.apparent_temperature_max.get(index)?,
            apparent_temperature_min: *self.apparent_temperature_min.get(index)?,
            sunrise: self.sunrise.get(index)?,
            sunset: self.sunset.get(index)?,
            precipitation_probability_max: *self.precipitation_probability_max.get(index)?,
        })
    }

    pub fn days(&self) -> impl Iterator<Item = DayForecast<'_>> + '_ {
        (0..self.len()).map_while(|index| self.day(index))
    }

    pub fn converted(&self, from: UnitSystem, to: UnitSystem) -> Self {
        let convert = |values: &[f64]| -> Vec<f64> {
            values.iter().map(|value| convert_temperature(*value, from, to)).collect()
        };

        Self {
            temperature_max: convert(&self.temperature_max),
            temperature_min: convert(&self.temperature_min),
            apparent_temperature_max: convert(&self.apparent_temperature_max),
            apparent_temperature_min: convert(&self.apparent_temperature_min),
            ..self.clone()
        }
    }
}

/// One row of a [`DailyForecast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayForecast<'a> {
    pub date: &'a str,
    pub weather_code: i32,
    pub info: WeatherInfo,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub apparent_temperature_max: f64,
    pub apparent_temperature_min: f64,
    pub sunrise: &'a str,
    pub sunset: &'a str,
    pub precipitation_probability_max: Option<u8>,
}

impl DayForecast<'_> {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date, "%Y-%m-%d").ok()
    }

    pub fn average_temperature(&self) -> f64 {
        (self.temperature_min + self.temperature_max) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastData {
    pub location: Location,
    pub daily: DailyForecast,
}

impl ForecastData {
    pub fn converted(&self, from: UnitSystem, to: UnitSystem) -> Self {
        Self { location: self.location.clone(), daily: self.daily.converted(from, to) }
    }
}
