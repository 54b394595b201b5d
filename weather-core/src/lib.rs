//! Core library for the `weather` app.
//!
//! This crate defines:
//! - The OpenWeather client behind the [`WeatherService`] trait
//! - Raw response models and their display-ready projection
//! - The [`AppState`] view-state machine and its collaborators
//!   (location watcher, preference storage, suggestion debouncing)
//! - Configuration handling
//!
//! It is used by `weather-cli`, but can also drive any other front end that
//! observes [`ViewState`].

pub mod client;
pub mod config;
pub mod error;
pub mod location;
pub mod mapper;
pub mod model;
pub mod preferences;
pub mod search;
pub mod state;

pub use client::{WeatherService, client_from_config};
pub use config::Config;
pub use error::{NetworkError, user_message};
pub use location::{FixedLocationWatcher, LocationWatcher};
pub use mapper::map_to_weather;
pub use model::{Coordinates, LocationSuggestion, Weather, WeatherResponse};
pub use preferences::{FilePreferences, MemoryPreferences, Preferences};
pub use search::SuggestionDebouncer;
pub use state::{AppState, Resume, ViewState};
