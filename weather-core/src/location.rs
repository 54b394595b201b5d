use std::{
    fmt::Debug,
    sync::atomic::{AtomicBool, Ordering},
};

use tokio::sync::broadcast;
use tracing::info;

use crate::model::Coordinates;

/// Source of device coordinates.
///
/// `start` acquires a single position: the watcher emits once on
/// [`subscribe`](LocationWatcher::subscribe) and then stops itself.
pub trait LocationWatcher: Send + Sync + Debug {
    fn is_authorized(&self) -> bool;

    fn start(&self);

    fn stop(&self);

    fn subscribe(&self) -> broadcast::Receiver<Coordinates>;
}

/// Watcher backed by a location known up front (from config or flags).
/// Without coordinates it is never authorized and never emits.
#[derive(Debug)]
pub struct FixedLocationWatcher {
    coordinates: Option<Coordinates>,
    updating: AtomicBool,
    updates: broadcast::Sender<Coordinates>,
}

impl FixedLocationWatcher {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        let (updates, _) = broadcast::channel(4);
        Self { coordinates, updating: AtomicBool::new(false), updates }
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }
}

impl LocationWatcher for FixedLocationWatcher {
    fn is_authorized(&self) -> bool {
        self.coordinates.is_some()
    }

    fn start(&self) {
        let Some(coordinates) = self.coordinates else {
            info!("Location not authorized");
            return;
        };

        if self.updating.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(lat = coordinates.lat, lon = coordinates.lon, "Found location");
        // No receivers is fine, nobody is listening yet.
        let _ = self.updates.send(coordinates);
        self.stop();
    }

    fn stop(&self) {
        self.updating.store(false, Ordering::SeqCst);
    }

    fn subscribe(&self) -> broadcast::Receiver<Coordinates> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn unauthorized_watcher_never_emits() {
        let watcher = FixedLocationWatcher::new(None);
        let mut rx = watcher.subscribe();

        assert!(!watcher.is_authorized());
        watcher.start();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn emits_once_per_start_then_stops() {
        let watcher = FixedLocationWatcher::new(Some(Coordinates::new(10.0, 20.0)));
        let mut rx = watcher.subscribe();

        watcher.start();
        assert_eq!(rx.try_recv().unwrap(), Coordinates::new(10.0, 20.0));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert!(!watcher.is_updating());

        watcher.start();
        assert_eq!(rx.try_recv().unwrap(), Coordinates::new(10.0, 20.0));
    }
}
