//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Unit conversion and the shared WMO weather-code table
//! - The weather client (geocoding, reverse geocoding, current conditions, forecast)
//! - Device/IP geolocation with fallback
//! - Recent searches and theme persistence
//! - The dashboard controller that ties them together
//! - Configuration handling
//!
//! It is used by `weather-dashboard-cli`, but the controller only depends on
//! injected capabilities so other front-ends can drive it too.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod geolocation;
mod http;
pub mod model;
pub mod provider;
pub mod recent;
pub mod storage;
pub mod theme;
pub mod units;
pub mod weather_code;

pub use config::{Config, Endpoints, HomeLocation};
pub use dashboard::{Dashboard, DashboardState};
pub use error::{DeviceError, GeolocationError, LookupError};
pub use geolocation::{
    ConfiguredLocator, Coordinates, DeviceLocator, GeolocationResolver, IpLocator,
    ip_api::IpApiLocator,
};
pub use model::{CurrentWeather, DailyForecast, ForecastData, Location, PlaceName, WeatherReport};
pub use provider::{WeatherService, open_meteo::OpenMeteoClient};
pub use recent::RecentSearches;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use theme::{Theme, ThemePreference};
pub use units::UnitSystem;
