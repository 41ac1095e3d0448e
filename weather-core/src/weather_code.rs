//! WMO weather interpretation codes as used by Open-Meteo.
//!
//! Every consumer (current conditions, forecast days, rendering) goes
//! through [`lookup`] so the mapping lives in exactly one place.

/// Human-readable description and icon code for a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherInfo {
    pub description: &'static str,
    pub icon: &'static str,
}

const fn info(description: &'static str, icon: &'static str) -> WeatherInfo {
    WeatherInfo { description, icon }
}

pub const UNKNOWN: WeatherInfo = info("Unknown", "50d");

pub fn lookup(code: i32) -> WeatherInfo {
    match code {
        0 => info("Clear sky", "01d"),
        1 => info("Mainly clear", "01d"),
        2 => info("Partly cloudy", "02d"),
        3 => info("Overcast", "03d"),
        45 | 48 => info("Fog", "50d"),
        51 => info("Light drizzle", "09d"),
        53 => info("Moderate drizzle", "09d"),
        55 => info("Dense drizzle", "09d"),
        56 | 57 => info("Freezing drizzle", "09d"),
        61 => info("Slight rain", "10d"),
        63 => info("Moderate rain", "10d"),
        65 => info("Heavy rain", "10d"),
        66 | 67 => info("Freezing rain", "13d"),
        71 => info("Slight snow fall", "13d"),
        73 => info("Moderate snow fall", "13d"),
        75 => info("Heavy snow fall", "13d"),
        77 => info("Snow grains", "13d"),
        80 => info("Slight rain showers", "09d"),
        81 => info("Moderate rain showers", "09d"),
        82 => info("Violent rain showers", "09d"),
        85 | 86 => info("Snow showers", "13d"),
        95 => info("Thunderstorm", "11d"),
        96 | 99 => info("Thunderstorm with hail", "11d"),
        _ => UNKNOWN,
    }
}

/// URL of the rendered icon image for an icon code.
pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}
