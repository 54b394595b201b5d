//! Input debouncing for location suggestions.
//!
//! Debouncing is a policy of whoever collects keystrokes, so it lives here
//! rather than in [`AppState`].

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time::timeout};
use tracing::debug;

use crate::state::AppState;

/// Quiet period after the last keystroke before suggestions are requested.
pub const SUGGESTION_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct SuggestionDebouncer {
    input: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl SuggestionDebouncer {
    pub fn new(state: AppState) -> Self {
        Self::with_delay(state, SUGGESTION_DEBOUNCE)
    }

    pub fn with_delay(state: AppState, delay: Duration) -> Self {
        let (input, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(state, rx, delay));
        Self { input, task }
    }

    /// Feed the current search text.
    pub fn push(&self, text: impl Into<String>) {
        // The receiver only goes away with the task, which outlives `self`.
        let _ = self.input.send(text.into());
    }

    /// Flushes pending input immediately and waits for the most recent
    /// lookup, settled or flushed, to finish.
    pub async fn finish(self) {
        drop(self.input);
        let _ = self.task.await;
    }
}

async fn run(state: AppState, mut rx: mpsc::UnboundedReceiver<String>, delay: Duration) {
    let mut pending: Option<String> = None;
    // Most recent lookup; awaited on shutdown so `finish` returns after it lands.
    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        let Some(text) = pending.take() else {
            match rx.recv().await {
                Some(text) => pending = Some(text),
                None => break,
            }
            continue;
        };

        match timeout(delay, rx.recv()).await {
            Ok(Some(newer)) => pending = Some(newer),
            Ok(None) => {
                if let Some(task) = state.fetch_location_suggestions(&text) {
                    in_flight = Some(task);
                }
                break;
            }
            Err(_) => {
                debug!(query = %text, "Input settled, fetching suggestions");
                // A later lookup supersedes this one, so it is not awaited here.
                if let Some(task) = state.fetch_location_suggestions(&text) {
                    in_flight = Some(task);
                }
            }
        }
    }

    if let Some(task) = in_flight {
        let _ = task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::WeatherService,
        error::NetworkError,
        location::FixedLocationWatcher,
        model::{LocationSuggestion, WeatherResponse},
        preferences::MemoryPreferences,
    };
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct RecordingService {
        queries: Mutex<Vec<String>>,
        latency: Option<Duration>,
    }

    #[async_trait]
    impl WeatherService for RecordingService {
        async fn fetch_by_name(&self, _name: &str) -> Result<WeatherResponse, NetworkError> {
            Err(NetworkError::Service("unused".into()))
        }

        async fn fetch_by_coordinates(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> Result<WeatherResponse, NetworkError> {
            Err(NetworkError::Service("unused".into()))
        }

        async fn fetch_suggestions(
            &self,
            query: &str,
        ) -> Result<Vec<LocationSuggestion>, NetworkError> {
            self.queries.lock().unwrap().push(query.to_string());
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            Ok(vec![LocationSuggestion {
                name: query.to_string(),
                lat: 1.0,
                lon: 2.0,
                state: None,
                country: None,
            }])
        }
    }

    fn setup() -> (AppState, Arc<RecordingService>) {
        setup_with(RecordingService::default())
    }

    fn setup_with(service: RecordingService) -> (AppState, Arc<RecordingService>) {
        let service = Arc::new(service);
        let state = AppState::new(
            service.clone(),
            Arc::new(MemoryPreferences::default()),
            Arc::new(FixedLocationWatcher::new(None)),
        );
        (state, service)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_issues_a_single_lookup() {
        let (state, service) = setup();
        let debouncer = SuggestionDebouncer::new(state.clone());
        let mut suggestions = state.subscribe_suggestions();

        for text in ["Spr", "Spri", "Sprin", "Springf"] {
            debouncer.push(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        suggestions.wait_for(|s| !s.is_empty()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(service.queries.lock().unwrap().as_slice(), ["Springf".to_string()]);
        assert_eq!(state.suggestions()[0].name, "Springf");
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_words_issue_separate_lookups() {
        let (state, service) = setup();
        let debouncer = SuggestionDebouncer::new(state);

        debouncer.push("Lon");
        tokio::time::sleep(Duration::from_millis(700)).await;
        debouncer.push("London");
        tokio::time::sleep(Duration::from_millis(700)).await;
        debouncer.finish().await;

        assert_eq!(
            service.queries.lock().unwrap().as_slice(),
            ["Lon".to_string(), "London".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn finish_flushes_pending_input() {
        let (state, service) = setup();
        let debouncer = SuggestionDebouncer::new(state.clone());

        debouncer.push("Paris");
        debouncer.finish().await;

        assert_eq!(service.queries.lock().unwrap().as_slice(), ["Paris".to_string()]);
        assert_eq!(state.suggestions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn short_final_input_is_ignored() {
        let (state, service) = setup();
        let debouncer = SuggestionDebouncer::new(state);

        debouncer.push("Pa");
        tokio::time::sleep(Duration::from_secs(1)).await;
        debouncer.finish().await;

        assert!(service.queries.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn finish_waits_for_settled_lookup_in_flight() {
        let (state, service) = setup_with(RecordingService {
            latency: Some(Duration::from_millis(300)),
            ..RecordingService::default()
        });
        let debouncer = SuggestionDebouncer::new(state.clone());

        debouncer.push("Paris");
        // The lookup starts at 500ms and is still in flight at 600ms.
        tokio::time::sleep(Duration::from_millis(600)).await;
        debouncer.finish().await;

        assert_eq!(service.queries.lock().unwrap().as_slice(), ["Paris".to_string()]);
        assert_eq!(state.suggestions().len(), 1);
    }
}
