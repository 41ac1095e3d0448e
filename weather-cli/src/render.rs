//! Human-readable output for the dashboard state.

use chrono::{NaiveDate, NaiveDateTime};

use weather_dashboard_core::{
    DashboardState, ForecastData, Theme, UnitSystem, WeatherReport,
    model::{DayForecast, parse_local_time},
    units::format_temp,
    weather_code::icon_url,
};

/// Days shown from the 7-day forecast.
pub const DISPLAY_DAYS: usize = 5;

/// Newline-terminated lines joined into one block.
fn block(lines: impl IntoIterator<Item = String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

pub fn dashboard(state: &DashboardState, theme: Theme) -> String {
    let mut status = vec![header(theme)];

    if state.loading {
        status.push("Loading...".to_string());
    }
    if let Some(error) = &state.error {
        status.push(format!("Error: {error}"));
    }

    let idle = !state.loading && state.error.is_none();
    if idle && state.weather.is_none() && state.forecast.is_none() {
        status.push("No weather loaded yet. Search for a city or use your location.".to_string());
    }

    let mut out = block(status);
    if let Some(report) = &state.weather {
        out.push('\n');
        out.push_str(&current(report, state.unit, state.using_geolocation));
    }
    if let Some(forecast) = &state.forecast {
        out.push('\n');
        out.push_str(&forecast_table(forecast, state.unit));
    }

    out
}

fn header(theme: Theme) -> String {
    let rule = match theme {
        Theme::Light => '-',
        Theme::Dark => '=',
    };
    let title = format!("Weather Dashboard ({theme} theme)");
    let line: String = std::iter::repeat_n(rule, title.chars().count()).collect();
    format!("{line}\n{title}\n{line}")
}

pub fn current(report: &WeatherReport, unit: UnitSystem, using_geolocation: bool) -> String {
    let now = &report.current;
    let temp = unit.temperature_label();
    let marker = if using_geolocation { " (your location)" } else { "" };

    let mut lines = vec![format!("{}{marker}", report.location.display_name())];
    if let Some(observed) = now.observed_at() {
        lines.push(format!("Observed {}", observed.format("%a %-d %b, %H:%M")));
    }
    lines.extend([
        format!("{} [{}]", now.weather_description, icon_url(&now.weather_icon)),
        format!(
            "Temperature: {}{temp} (feels like {}{temp})",
            format_temp(now.temperature),
            format_temp(now.apparent_temperature)
        ),
        format!("Humidity:    {}%", now.humidity),
        format!("Pressure:    {:.0} hPa", now.pressure),
        format!("Wind:        {:.1} {}", now.wind_speed, unit.wind_speed_label()),
    ]);

    block(lines)
}

pub fn forecast_table(forecast: &ForecastData, unit: UnitSystem) -> String {
    let title = format!("{DISPLAY_DAYS}-day forecast for {}", forecast.location.display_name());
    let rows = forecast.daily.days().take(DISPLAY_DAYS).map(|day| forecast_row(&day, unit));

    block(std::iter::once(title).chain(rows))
}

fn forecast_row(day: &DayForecast<'_>, unit: UnitSystem) -> String {
    let temp = unit.temperature_label();
    let date = day.date().map(day_label).unwrap_or_else(|| day.date.to_string());
    let precipitation = day
        .precipitation_probability_max
        .map(|p| format!("{p}%"))
        .unwrap_or_else(|| "n/a".to_string());
    let sun = match (parse_local_time(day.sunrise), parse_local_time(day.sunset)) {
        (Some(rise), Some(set)) => format!("  sun {}-{}", clock(rise), clock(set)),
        _ => String::new(),
    };

    format!(
        "  {date}  {:<24} {}{temp} / {}{temp}  avg {}{temp}  precip {precipitation}{sun}",
        day.info.description,
        format_temp(day.temperature_max),
        format_temp(day.temperature_min),
        format_temp(day.average_temperature()),
    )
}

fn day_label(date: NaiveDate) -> String {
    date.format("%a %d %b").to_string()
}

fn clock(time: NaiveDateTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn recent(searches: &[String]) -> String {
    if searches.is_empty() {
        return "No recent searches.\n".to_string();
    }

    let entries = searches.iter().enumerate().map(|(i, city)| format!("  {}. {city}", i + 1));
    block(std::iter::once("Recent searches:".to_string()).chain(entries))
}
