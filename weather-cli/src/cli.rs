use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, CustomType, Select};
use std::sync::Arc;

use weather_dashboard_core::{
    Config, ConfiguredLocator, Dashboard, DeviceLocator, FileStorage, GeolocationResolver,
    IpApiLocator, OpenMeteoClient, RecentSearches, Storage, Theme, ThemePreference, UnitSystem,
};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    /// Unit system for this run; defaults to the configured one.
    #[arg(long, global = true, value_parser = parse_unit)]
    pub unit: Option<UnitSystem>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive dashboard, starting from your location (default).
    Dashboard,

    /// Show current conditions and forecast for a city.
    Search {
        /// City name, e.g. "San Francisco".
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },

    /// Show weather for your location (configured home, else IP lookup).
    Locate,

    /// List recent searches.
    Recent {
        /// Forget all recent searches instead.
        #[arg(long)]
        clear: bool,
    },

    /// Show or change the colour theme.
    Theme {
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },

    /// Interactively set the default unit system and home location.
    Configure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Dark,
    Light,
    Toggle,
}

fn parse_unit(value: &str) -> Result<UnitSystem, String> {
    UnitSystem::try_from(value).map_err(|e| e.to_string())
}

/// The dashboard plus the capabilities it was built from.
#[derive(Debug)]
pub struct App {
    pub dashboard: Dashboard,
    pub theme: ThemePreference,
}

impl App {
    pub fn build(config: &Config, unit: UnitSystem) -> Result<Self> {
        let client = OpenMeteoClient::from_config(config).context("Failed to build HTTP client")?;
        let ip = IpApiLocator::new(client.http().clone(), config.endpoints.ip_geolocation.clone());
        let device: Arc<dyn DeviceLocator> = Arc::new(ConfiguredLocator::new(config.home));
        let resolver = GeolocationResolver::new(Some(device), Arc::new(ip));

        let storage = open_storage();
        let recent = RecentSearches::with_max(storage.clone(), config.max_recent_searches);
        let theme = ThemePreference::new(storage);

        let dashboard = Dashboard::new(Arc::new(client), resolver, recent, unit);
        Ok(Self { dashboard, theme })
    }

    pub fn current_theme(&self) -> Theme {
        self.theme.initial(Theme::default())
    }

    /// Print the dashboard, or fail with the error it recorded.
    fn report(&self) -> Result<()> {
        let state = self.dashboard.snapshot();
        if let Some(error) = &state.error {
            bail!("{error}");
        }
        print!("{}", render::dashboard(&state, self.current_theme()));
        Ok(())
    }
}

/// File storage in the data dir; without one, persistence is unavailable.
fn open_storage() -> Option<Arc<dyn Storage>> {
    match FileStorage::in_data_dir() {
        Ok(storage) => Some(Arc::new(storage) as Arc<dyn Storage>),
        Err(err) => {
            tracing::warn!("Persistent storage unavailable: {err:#}");
            None
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let command = self.command.unwrap_or(Command::Dashboard);
        let config = Config::load()?;
        let app = App::build(&config, self.unit.unwrap_or(config.unit))?;

        match command {
            Command::Dashboard => interactive::run(&app).await?,
            Command::Search { city } => {
                app.dashboard.search(&city.join(" ")).await;
                app.report()?;
            }
            Command::Locate => {
                app.dashboard.use_my_location().await;
                app.report()?;
            }
            Command::Recent { clear: true } => {
                app.dashboard.clear_recent_searches();
                println!("Recent searches cleared.");
            }
            Command::Recent { clear: false } => {
                print!("{}", render::recent(&app.dashboard.recent_searches()));
            }
            Command::Theme { action } => {
                let current = app.current_theme();
                let theme = match action {
                    None => current,
                    Some(ThemeAction::Dark) => set_theme(&app.theme, Theme::Dark),
                    Some(ThemeAction::Light) => set_theme(&app.theme, Theme::Light),
                    Some(ThemeAction::Toggle) => app.theme.toggle(current),
                };
                println!("Theme: {theme}");
            }
            Command::Configure => configure(config)?,
        }

        Ok(())
    }
}

fn set_theme(preference: &ThemePreference, theme: Theme) -> Theme {
    preference.set(theme);
    theme
}

fn configure(mut config: Config) -> Result<()> {
    let units = UnitSystem::all().to_vec();
    let start = units.iter().position(|u| *u == config.unit).unwrap_or(0);
    config.unit = Select::new("Default unit system:", units).with_starting_cursor(start).prompt()?;

    let wants_home = Confirm::new("Use a fixed home location for \"use my location\"?")
        .with_default(config.home.is_some())
        .with_help_message("Without one, your location is estimated from your IP address.")
        .prompt()?;

    if wants_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please type a number, e.g. 52.52")
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please type a number, e.g. 13.41")
            .prompt()?;
        config.set_home(latitude, longitude)?;
    } else {
        config.clear_home();
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}
