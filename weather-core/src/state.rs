//! View state owner.
//!
//! [`AppState`] is the single writer of the current [`ViewState`] and the
//! suggestion list; renderers observe both through `watch` receivers.
//!
//! Every fetch sets its immediate state synchronously and then runs as an
//! independent tokio task. Weather fetches and suggestion fetches each take a
//! generation number when they start; a completion whose generation is no
//! longer the latest is dropped, so the most recently *issued* request wins
//! no matter in which order responses arrive.

use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    client::WeatherService,
    error::{ERROR_GENERIC_KEY, NetworkError},
    location::LocationWatcher,
    mapper::map_to_weather,
    model::{LocationSuggestion, Weather, WeatherResponse},
    preferences::{LAST_SEARCHED_WEATHER_KEY, Preferences},
};

/// Suggestions are only looked up once the query has this many characters.
pub const MIN_SUGGESTION_QUERY_CHARS: usize = 3;

/// What the UI should currently render.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading,
    Success(Weather),
    Error(String),
}

impl ViewState {
    /// `Success` or `Error`.
    pub fn is_settled(&self) -> bool {
        matches!(self, ViewState::Success(_) | ViewState::Error(_))
    }
}

/// Outcome of [`AppState::resume`].
#[derive(Debug)]
pub enum Resume {
    /// Location is authorized; weather follows the watcher's first emission.
    Locating,
    /// The persisted query is being fetched again.
    Refetching(JoinHandle<()>),
    /// Nothing to show until the user searches.
    Idle,
}

#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    service: Arc<dyn WeatherService>,
    preferences: Arc<dyn Preferences>,
    watcher: Arc<dyn LocationWatcher>,
    view_state: watch::Sender<ViewState>,
    suggestions: watch::Sender<Vec<LocationSuggestion>>,
    weather_generation: AtomicU64,
    suggestion_generation: AtomicU64,
}

impl AppState {
    /// Must be called within a tokio runtime: it spawns the task that turns
    /// watcher emissions into coordinate fetches.
    pub fn new(
        service: Arc<dyn WeatherService>,
        preferences: Arc<dyn Preferences>,
        watcher: Arc<dyn LocationWatcher>,
    ) -> Self {
        let (view_state, _) = watch::channel(ViewState::Idle);
        let (suggestions, _) = watch::channel(Vec::new());

        let state = Self {
            inner: Arc::new(Inner {
                service,
                preferences,
                watcher,
                view_state,
                suggestions,
                weather_generation: AtomicU64::new(0),
                suggestion_generation: AtomicU64::new(0),
            }),
        };
        state.listen_for_location();
        state
    }

    pub fn view_state(&self) -> ViewState {
        self.inner.view_state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.view_state.subscribe()
    }

    pub fn suggestions(&self) -> Vec<LocationSuggestion> {
        self.inner.suggestions.borrow().clone()
    }

    pub fn subscribe_suggestions(&self) -> watch::Receiver<Vec<LocationSuggestion>> {
        self.inner.suggestions.subscribe()
    }

    /// Resolves once the view state is `Success` or `Error`.
    pub async fn wait_until_settled(&self) -> ViewState {
        let mut rx = self.subscribe();
        match rx.wait_for(ViewState::is_settled).await {
            Ok(state) => (*state).clone(),
            // The sender lives in `inner`, which `self` keeps alive.
            Err(_) => self.view_state(),
        }
    }

    pub fn fetch_weather_by_name(&self, name: &str) -> JoinHandle<()> {
        let generation = self.inner.begin_weather_fetch();
        let inner = Arc::clone(&self.inner);
        let name = name.to_string();

        tokio::spawn(async move {
            let result = inner.service.fetch_by_name(&name).await;
            inner.complete_weather_fetch(generation, result, |_| name.clone());
        })
    }

    /// Persists the resolved display name rather than the coordinates.
    pub fn fetch_weather_by_coordinates(&self, lat: f64, lon: f64) -> JoinHandle<()> {
        let generation = self.inner.begin_weather_fetch();
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let result = inner.service.fetch_by_coordinates(lat, lon).await;
            inner.complete_weather_fetch(generation, result, |weather| {
                weather.display_name.clone()
            });
        })
    }

    /// Returns `None` without touching anything when `query` is too short.
    /// Failures clear the list and never reach the view state.
    pub fn fetch_location_suggestions(&self, query: &str) -> Option<JoinHandle<()>> {
        if query.chars().count() < MIN_SUGGESTION_QUERY_CHARS {
            return None;
        }

        let generation = self.inner.suggestion_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        let query = query.to_string();

        Some(tokio::spawn(async move {
            let suggestions = match inner.service.fetch_suggestions(&query).await {
                Ok(suggestions) => suggestions,
                Err(e) => {
                    warn!(error = %e, query = %query, "Location suggestions failed");
                    Vec::new()
                }
            };

            let published = inner.suggestions.send_if_modified(|current| {
                if inner.suggestion_generation.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *current = suggestions;
                true
            });

            if !published {
                debug!(generation, query = %query, "Discarding stale suggestions");
            }
        }))
    }

    /// Startup policy: follow device location when authorized, otherwise
    /// re-fetch the last successful query if there is one.
    pub fn resume(&self) -> Resume {
        if self.inner.watcher.is_authorized() {
            self.inner.watcher.start();
            return Resume::Locating;
        }

        match self.inner.preferences.get(LAST_SEARCHED_WEATHER_KEY) {
            Some(last) => {
                info!(query = %last, "Resuming last searched weather");
                Resume::Refetching(self.fetch_weather_by_name(&last))
            }
            None => Resume::Idle,
        }
    }

    pub fn stop_updating_location(&self) {
        if self.inner.watcher.is_authorized() {
            self.inner.watcher.stop();
        }
    }

    fn listen_for_location(&self) {
        let mut updates = self.inner.watcher.subscribe();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(coordinates) => {
                        let Some(inner) = weak.upgrade() else { break };
                        let state = AppState { inner };
                        state.fetch_weather_by_coordinates(coordinates.lat, coordinates.lon);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed location updates");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}

impl Inner {
    fn begin_weather_fetch(&self) -> u64 {
        let generation = self.weather_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.view_state.send_replace(ViewState::Loading);
        generation
    }

    fn complete_weather_fetch(
        &self,
        generation: u64,
        result: Result<WeatherResponse, NetworkError>,
        persisted_value: impl FnOnce(&Weather) -> String,
    ) {
        let (next, persist) = match result {
            Ok(response) => {
                let weather = map_to_weather(&response);
                let value = persisted_value(&weather);
                (ViewState::Success(weather), Some(value))
            }
            Err(e) => {
                warn!(error = %e, "Weather fetch failed");
                (ViewState::Error(ERROR_GENERIC_KEY.to_string()), None)
            }
        };

        // Checked under the channel's lock so a fetch that starts concurrently
        // cannot have its `Loading` overwritten by this older result.
        let published = self.view_state.send_if_modified(|current| {
            if self.weather_generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = next;
            true
        });

        if !published {
            debug!(generation, "Discarding stale weather result");
            return;
        }

        if let Some(value) = persist {
            if let Err(e) = self.preferences.set(LAST_SEARCHED_WEATHER_KEY, &value) {
                warn!(error = %e, "Failed to persist last searched weather");
            }
        }
    }
}
