//! The interactive dashboard loop.

use anyhow::Result;
use inquire::{InquireError, Select, Text};
use std::fmt;

use crate::{cli::App, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Search,
    Recent,
    UseMyLocation,
    ToggleUnits,
    ToggleTheme,
    ClearRecent,
    Quit,
}

impl Action {
    const ALL: [Action; 7] = [
        Action::Search,
        Action::Recent,
        Action::UseMyLocation,
        Action::ToggleUnits,
        Action::ToggleTheme,
        Action::ClearRecent,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Search => "Search for a city",
            Action::Recent => "Pick a recent search",
            Action::UseMyLocation => "Use my location",
            Action::ToggleUnits => "Switch °C / °F",
            Action::ToggleTheme => "Switch light / dark theme",
            Action::ClearRecent => "Clear recent searches",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Esc and Ctrl-C end the prompt without an error.
fn cancelled<T>(result: Result<T, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub async fn run(app: &App) -> Result<()> {
    let mut theme = app.current_theme();

    app.dashboard.mount().await;

    loop {
        println!();
        print!("{}", render::dashboard(&app.dashboard.snapshot(), theme));
        println!();

        let Some(action) = cancelled(Select::new("What next?", Action::ALL.to_vec()).prompt())?
        else {
            break;
        };

        match action {
            Action::Search => {
                let Some(city) = cancelled(Text::new("City:").prompt())? else {
                    continue;
                };
                app.dashboard.set_city_input(&city);
                app.dashboard.search(&city).await;
            }
            Action::Recent => {
                let recent = app.dashboard.recent_searches();
                if recent.is_empty() {
                    println!("No recent searches yet.");
                    continue;
                }
                if let Some(city) = cancelled(Select::new("Recent searches:", recent).prompt())? {
                    app.dashboard.set_city_input(&city);
                    app.dashboard.search(&city).await;
                }
            }
            Action::UseMyLocation => app.dashboard.use_my_location().await,
            Action::ToggleUnits => {
                app.dashboard.toggle_unit();
            }
            Action::ToggleTheme => theme = app.theme.toggle(theme),
            Action::ClearRecent => app.dashboard.clear_recent_searches(),
            Action::Quit => break,
        }
    }

    Ok(())
}
