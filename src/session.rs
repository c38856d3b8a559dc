use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};

use crate::config::GuideConfig;
use crate::location::{
    LocationError, LocationFix, LocationSource, SubscriptionHandle, WatchOptions,
};
use crate::navigator::{NavigationState, Navigator};
use crate::waypoint::Waypoint;

struct Shared {
    navigator: Navigator,
    enabled: bool,
    generation: u64,
    /// Only callbacks from this subscription may touch the state.
    live_generation: Option<u64>,
    subscribers: Vec<Sender<NavigationState>>,
}

impl Shared {
    fn publish(&mut self) {
        let snapshot = self.navigator.state().clone();
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
    }

    fn accept_fix(&mut self, generation: u64, fix: &LocationFix) {
        if self.live_generation != Some(generation) {
            debug!("Discarding fix from stale subscription {}", generation);
            return;
        }
        if !fix.position.is_finite() {
            debug!("Discarding fix without usable coordinates");
            return;
        }
        self.navigator.on_fix(fix);
        self.publish();
    }

    fn accept_error(&mut self, generation: u64, error: &LocationError) {
        if self.live_generation != Some(generation) {
            debug!("Discarding error from stale subscription {}", generation);
            return;
        }
        self.navigator.on_location_error(error);
        self.publish();
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // State is rebuilt wholesale on each update, so a poisoned lock still holds a
    // consistent snapshot.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct NavigationSession {
    shared: Arc<Mutex<Shared>>,
    source: Box<dyn LocationSource>,
    options: WatchOptions,
    subscription: Option<SubscriptionHandle>,
    reset_heading_on_disable: bool,
}

impl NavigationSession {
    /// A disabled session with no path.
    pub fn new(source: Box<dyn LocationSource>, options: WatchOptions) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                navigator: Navigator::new(Vec::new()),
                enabled: false,
                generation: 0,
                live_generation: None,
                subscribers: Vec::new(),
            })),
            source,
            options,
            subscription: None,
            reset_heading_on_disable: false,
        }
    }

    pub fn from_config(source: Box<dyn LocationSource>, config: &GuideConfig) -> Self {
        Self::new(source, config.location.watch_options())
            .with_reset_heading_on_disable(config.navigation.reset_heading_on_disable)
    }

    pub fn with_reset_heading_on_disable(mut self, reset: bool) -> Self {
        self.reset_heading_on_disable = reset;
        self
    }

    /// Latest published state.
    pub fn snapshot(&self) -> NavigationState {
        lock(&self.shared).navigator.state().clone()
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> Receiver<NavigationState> {
        let (tx, rx) = mpsc::channel();
        lock(&self.shared).subscribers.push(tx);
        rx
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.shared).enabled
    }

    /// Whether a location subscription is currently live.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn waypoints(&self) -> Vec<Waypoint> {
        lock(&self.shared).navigator.waypoints().to_vec()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        {
            let mut shared = lock(&self.shared);
            if shared.enabled == enabled {
                return;
            }
            shared.enabled = enabled;
            if !enabled {
                shared.live_generation = None;
                shared.navigator.reset(!self.reset_heading_on_disable);
            }
        }
        info!("Navigation {}", if enabled { "enabled" } else { "disabled" });
        self.sync_subscription();
    }

    /// Replace the route. A non-empty list starts a new session; an empty one
    /// stops the subscription and reports that there is nothing to follow.
    pub fn set_waypoints(&mut self, waypoints: Vec<Waypoint>) {
        {
            let mut shared = lock(&self.shared);
            if waypoints.is_empty() {
                let had_path = !shared.navigator.waypoints().is_empty();
                shared.live_generation = None;
                shared.navigator.clear_waypoints();
                if had_path && shared.enabled {
                    shared.publish();
                }
            } else {
                info!("New path with {} waypoints", waypoints.len());
                shared.navigator.set_waypoints(waypoints);
                shared.navigator.reset(true);
            }
        }
        self.sync_subscription();
    }

    /// Heading from a dedicated sensor; applied on the next fix.
    pub fn update_heading(&mut self, heading: f64) {
        lock(&self.shared).navigator.on_heading(heading);
    }

    fn sync_subscription(&mut self) {
        let wanted = {
            let shared = lock(&self.shared);
            shared.enabled && !shared.navigator.waypoints().is_empty()
        };

        match (wanted, self.subscription) {
            (true, None) => self.start_subscription(),
            (false, Some(handle)) => self.stop_subscription(handle),
            _ => {}
        }
    }

    fn start_subscription(&mut self) {
        let generation = {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            shared.live_generation = Some(shared.generation);
            shared.generation
        };

        let fix_shared = Arc::clone(&self.shared);
        let error_shared = Arc::clone(&self.shared);
        let started = self.source.start(
            &self.options,
            Box::new(move |fix: LocationFix| lock(&fix_shared).accept_fix(generation, &fix)),
            Box::new(move |error: LocationError| {
                lock(&error_shared).accept_error(generation, &error)
            }),
        );

        match started {
            Ok(handle) => {
                info!("Location subscription {} started", handle.0);
                self.subscription = Some(handle);
            }
            Err(error) => {
                let mut shared = lock(&self.shared);
                shared.live_generation = None;
                shared.navigator.on_location_error(&error);
                shared.publish();
            }
        }
    }

    fn stop_subscription(&mut self, handle: SubscriptionHandle) {
        lock(&self.shared).live_generation = None;
        self.source.cancel(handle);
        self.subscription = None;
        info!("Location subscription {} cancelled", handle.0);
    }
}

impl Drop for NavigationSession {
    fn drop(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.stop_subscription(handle);
        }
    }
}
