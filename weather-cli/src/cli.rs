use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, Select};
use tracing::debug;
use weather_core::{
    AppState, Config, Coordinates, FilePreferences, FixedLocationWatcher, MemoryPreferences,
    Preferences, Resume, ViewState, Weather, client_from_config,
    state::MIN_SUGGESTION_QUERY_CHARS, user_message,
};

/// How long `resume` waits for a location-driven fetch.
const LOCATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Don't remember the last displayed location.
    #[arg(long, global = true)]
    pub no_persist: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key and an optional current location.
    Configure,

    /// Show current weather for a city name or a coordinate pair.
    Show {
        /// City name, e.g. "London" or "Springfield, IL, US".
        #[arg(required_unless_present_all = ["lat", "lon"], conflicts_with_all = ["lat", "lon"])]
        name: Option<String>,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// List matching locations.
    Search {
        /// At least three characters.
        query: String,

        /// Pick one of the matches and show its weather.
        #[arg(long)]
        pick: bool,
    },

    /// Show weather for the configured location, or the last one displayed.
    Resume,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        debug!(command = ?self.command, no_persist = self.no_persist, "Running command");

        let settled = match self.command {
            Command::Configure => return configure(),
            Command::Show { name: Some(name), .. } => {
                let state = open_state(self.no_persist)?;
                state.fetch_weather_by_name(&name).await?;
                state.view_state()
            }
            Command::Show { lat: Some(lat), lon: Some(lon), .. } => {
                let state = open_state(self.no_persist)?;
                state.fetch_weather_by_coordinates(lat, lon).await?;
                state.view_state()
            }
            Command::Show { .. } => bail!("Provide a city name or both --lat and --lon."),
            Command::Search { query, pick } => {
                let state = open_state(self.no_persist)?;
                match search(&state, &query, pick).await? {
                    Some(view_state) => view_state,
                    None => return Ok(()),
                }
            }
            Command::Resume => {
                let state = open_state(self.no_persist)?;
                match state.resume() {
                    Resume::Refetching(task) => {
                        task.await?;
                        state.view_state()
                    }
                    Resume::Locating => {
                        let settled = state.wait_until_settled();
                        let result = tokio::time::timeout(LOCATION_TIMEOUT, settled).await;
                        state.stop_updating_location();
                        result.context("Timed out waiting for the current location")?
                    }
                    Resume::Idle => {
                        println!(
                            "Nothing to show yet. Search for a city with `weather show <name>`."
                        );
                        return Ok(());
                    }
                }
            }
        };

        render(&settled)
    }
}

fn open_state(no_persist: bool) -> anyhow::Result<AppState> {
    let config = Config::load()?;
    build_state(&config, no_persist)
}

fn build_state(config: &Config, no_persist: bool) -> anyhow::Result<AppState> {
    let service = client_from_config(config)?;
    let preferences: Arc<dyn Preferences> = if no_persist {
        Arc::new(MemoryPreferences::default())
    } else {
        Arc::new(FilePreferences::open_default()?)
    };
    let watcher = Arc::new(FixedLocationWatcher::new(config.location));

    Ok(AppState::new(service, preferences, watcher))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_toggle_enabled()
        .with_help_message("Get one at https://home.openweathermap.org/api_keys")
        .prompt()?;
    config.api_key = Some(api_key.trim().to_string());

    let use_location = Confirm::new("Use a fixed current location for `weather resume`?")
        .with_default(config.location.is_some())
        .prompt()?;

    config.location = if use_location {
        let lat = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please type a number, e.g. 40.71")
            .prompt()?;
        let lon = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please type a number, e.g. -74.01")
            .prompt()?;
        Some(Coordinates::new(lat, lon))
    } else {
        None
    };

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

/// Prints matches; with `pick`, fetches the chosen one and returns the result.
async fn search(state: &AppState, query: &str, pick: bool) -> anyhow::Result<Option<ViewState>> {
    let Some(task) = state.fetch_location_suggestions(query) else {
        bail!("Search needs at least {MIN_SUGGESTION_QUERY_CHARS} characters.");
    };
    task.await?;

    let suggestions = state.suggestions();
    if suggestions.is_empty() {
        println!("No matching locations.");
        return Ok(None);
    }

    if !pick {
        for suggestion in &suggestions {
            println!("{:<16} {}", suggestion.id(), suggestion.display_name());
        }
        return Ok(None);
    }

    let options: Vec<String> = suggestions.iter().map(|s| s.display_name()).collect();
    let choice = Select::new("Pick a location:", options).raw_prompt()?;
    let chosen = suggestions[choice.index].coordinates();

    state.fetch_weather_by_coordinates(chosen.lat, chosen.lon).await?;
    Ok(Some(state.view_state()))
}

fn render(view_state: &ViewState) -> anyhow::Result<()> {
    match view_state {
        ViewState::Success(weather) => {
            print_weather(weather);
            Ok(())
        }
        ViewState::Error(key) => bail!("{}", user_message(key)),
        ViewState::Idle | ViewState::Loading => bail!("{}", user_message("")),
    }
}

fn print_weather(weather: &Weather) {
    println!("{}", weather.display_name);
    if !weather.description.is_empty() {
        println!("{}", weather.description);
    }
    println!(
        "Temperature: {} (feels like {})",
        weather.temperature, weather.feels_like_temperature
    );
    println!("Min / Max:   {} / {}", weather.min_temperature, weather.max_temperature);
    println!("Wind:        {} mph", weather.wind);
    println!("Humidity:    {}%", weather.humidity);
    if let Some(url) = &weather.icon_url {
        println!("Icon:        {url}");
    }
    println!("Updated:     {}", chrono::Local::now().format("%Y-%m-%d %H:%M"));
}
