//! Dashboard state and the operations the UI triggers.
//!
//! Operations may overlap: every search or location request takes a ticket
//! from a generation counter, and its results are applied only if no newer
//! request has been issued since. Stale results are dropped.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::{
    error::LookupError,
    geolocation::GeolocationResolver,
    model::{ForecastData, PlaceName, WeatherReport},
    provider::WeatherService,
    recent::RecentSearches,
    units::UnitSystem,
};

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    /// Contents of the city input.
    pub city: String,
    pub unit: UnitSystem,
    pub weather: Option<WeatherReport>,
    pub forecast: Option<ForecastData>,
    pub loading: bool,
    pub error: Option<String>,
    pub using_geolocation: bool,
}

impl DashboardState {
    /// Store freshly fetched data, converting it if the unit was toggled
    /// while the request was in flight.
    fn store(&mut self, fetched_in: UnitSystem, report: WeatherReport, forecast: ForecastData) {
        if fetched_in == self.unit {
            self.weather = Some(report);
            self.forecast = Some(forecast);
        } else {
            self.weather = Some(report.converted(fetched_in, self.unit));
            self.forecast = Some(forecast.converted(fetched_in, self.unit));
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: DashboardState,
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    generation: u64,
    unit: UnitSystem,
}

#[derive(Debug)]
pub struct Dashboard {
    service: Arc<dyn WeatherService>,
    resolver: GeolocationResolver,
    recent: RecentSearches,
    inner: Mutex<Inner>,
}

impl Dashboard {
    pub fn new(
        service: Arc<dyn WeatherService>,
        resolver: GeolocationResolver,
        recent: RecentSearches,
        unit: UnitSystem,
    ) -> Self {
        let state = DashboardState { unit, ..DashboardState::default() };
        Self { service, resolver, recent, inner: Mutex::new(Inner { state, generation: 0 }) }
    }

    pub fn snapshot(&self) -> DashboardState {
        self.inner.lock().state.clone()
    }

    pub fn set_city_input(&self, city: &str) {
        self.inner.lock().state.city = city.to_string();
    }

    pub fn recent_searches(&self) -> Vec<String> {
        self.recent.load()
    }

    pub fn clear_recent_searches(&self) {
        self.recent.clear();
    }

    /// Initial load: locate the user.
    pub async fn mount(&self) {
        self.use_my_location().await;
    }

    pub async fn search(&self, city_name: &str) {
        let city = city_name.trim();
        if city.is_empty() {
            return;
        }

        let ticket = self.begin();
        match self.fetch_city(city, ticket.unit).await {
            Ok((report, forecast)) => {
                let applied = self.finish(ticket, |state| {
                    state.city = city.to_string();
                    state.store(ticket.unit, report, forecast);
                    state.using_geolocation = false;
                });
                if applied {
                    self.recent.add(city);
                }
            }
            Err(err) => {
                tracing::warn!(city, "search failed: {err}");
                self.finish(ticket, |state| state.error = Some(err.user_message().to_string()));
            }
        }
    }

    pub async fn use_my_location(&self) {
        let ticket = self.begin();
        match self.resolver.resolve(self.service.as_ref(), ticket.unit).await {
            Ok(resolved) => {
                let name = resolved.report.location.name.clone();
                let named = !name.is_empty() && name != PlaceName::UNKNOWN_LOCATION;

                let applied = self.finish(ticket, |state| {
                    state.store(ticket.unit, resolved.report, resolved.forecast);
                    state.using_geolocation = true;
                    if !name.is_empty() {
                        state.city = name.clone();
                    }
                });
                if applied && named {
                    self.recent.add(&name);
                }
            }
            Err(err) => {
                tracing::warn!("geolocation failed: {err}");
                self.finish(ticket, |state| state.error = Some(err.user_message()));
            }
        }
    }

    /// Flip the unit system and convert whatever is on screen. No I/O.
    pub fn toggle_unit(&self) -> UnitSystem {
        let mut inner = self.inner.lock();
        let state = &mut inner.state;
        let from = state.unit;
        let to = from.toggled();

        state.weather = state.weather.as_ref().map(|w| w.converted(from, to));
        state.forecast = state.forecast.as_ref().map(|f| f.converted(from, to));
        state.unit = to;

        tracing::debug!(%from, %to, "toggled units");
        to
    }

    async fn fetch_city(
        &self,
        city: &str,
        unit: UnitSystem,
    ) -> Result<(WeatherReport, ForecastData), LookupError> {
        let report = self.service.current_weather(city, unit).await?;
        let forecast = self.service.forecast(city, unit).await?;
        Ok((report, forecast))
    }

    fn begin(&self) -> Ticket {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state.loading = true;
        inner.state.error = None;
        Ticket { generation: inner.generation, unit: inner.state.unit }
    }

    /// Apply `update` and clear loading if `ticket` is still the latest
    /// request. Returns whether it was.
    fn finish(&self, ticket: Ticket, update: impl FnOnce(&mut DashboardState)) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != ticket.generation {
            tracing::debug!(
                stale = ticket.generation,
                latest = inner.generation,
                "dropping stale result"
            );
            return false;
        }

        update(&mut inner.state);
        inner.state.loading = false;
        true
    }
}
