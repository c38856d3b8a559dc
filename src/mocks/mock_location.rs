// This file is only compiled during tests

use std::sync::{Arc, Mutex};

use crate::location::{
    ErrorCallback, FixCallback, LocationError, LocationFix, LocationSource, SubscriptionHandle,
    WatchOptions,
};

struct Subscription {
    handle: SubscriptionHandle,
    on_fix: Option<FixCallback>,
    on_error: Option<ErrorCallback>,
    active: bool,
}

#[derive(Default)]
struct MockState {
    subscriptions: Vec<Subscription>,
    starts: usize,
    cancels: usize,
    fail_next_start: Option<LocationError>,
}

/// Location source driven by hand from the test thread.
pub struct MockLocationSource {
    state: Arc<Mutex<MockState>>,
}

/// Test-side handle to push fixes and inspect subscription bookkeeping.
#[derive(Clone)]
pub struct MockFeed {
    state: Arc<Mutex<MockState>>,
}

pub fn mock_location_source() -> (MockLocationSource, MockFeed) {
    let state = Arc::new(Mutex::new(MockState::default()));
    (
        MockLocationSource {
            state: Arc::clone(&state),
        },
        MockFeed { state },
    )
}

impl LocationSource for MockLocationSource {
    fn start(
        &mut self,
        _options: &WatchOptions,
        on_fix: FixCallback,
        on_error: ErrorCallback,
    ) -> Result<SubscriptionHandle, LocationError> {
        let mut state = self.state.lock().unwrap();
        state.starts += 1;
        if let Some(error) = state.fail_next_start.take() {
            return Err(error);
        }
        let handle = SubscriptionHandle(state.subscriptions.len() as u64 + 1);
        state.subscriptions.push(Subscription {
            handle,
            on_fix: Some(on_fix),
            on_error: Some(on_error),
            active: true,
        });
        Ok(handle)
    }

    fn cancel(&mut self, handle: SubscriptionHandle) {
        let mut state = self.state.lock().unwrap();
        state.cancels += 1;
        if let Some(sub) = state.subscriptions.iter_mut().find(|s| s.handle == handle) {
            sub.active = false;
        }
    }
}

impl MockFeed {
    pub fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn cancels(&self) -> usize {
        self.state.lock().unwrap().cancels
    }

    pub fn active_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.subscriptions.iter().filter(|s| s.active).count()
    }

    pub fn fail_next_start(&self, error: LocationError) {
        self.state.lock().unwrap().fail_next_start = Some(error);
    }

    fn latest(&self) -> Option<usize> {
        let state = self.state.lock().unwrap();
        state.subscriptions.iter().rposition(|s| s.active)
    }

    fn last_ever(&self) -> Option<usize> {
        let state = self.state.lock().unwrap();
        state.subscriptions.len().checked_sub(1)
    }

    /// Callbacks run without the mock lock held, like a real provider thread.
    fn deliver_fix(&self, index: usize, fix: LocationFix) {
        let callback = self.state.lock().unwrap().subscriptions[index].on_fix.take();
        if let Some(mut callback) = callback {
            callback(fix);
            self.state.lock().unwrap().subscriptions[index].on_fix = Some(callback);
        }
    }

    fn deliver_error(&self, index: usize, error: LocationError) {
        let callback = self.state.lock().unwrap().subscriptions[index].on_error.take();
        if let Some(mut callback) = callback {
            callback(error);
            self.state.lock().unwrap().subscriptions[index].on_error = Some(callback);
        }
    }

    /// Deliver to the live subscription. Returns false when nothing is subscribed.
    pub fn push_fix(&self, fix: LocationFix) -> bool {
        match self.latest() {
            Some(index) => {
                self.deliver_fix(index, fix);
                true
            }
            None => false,
        }
    }

    pub fn push_error(&self, error: LocationError) -> bool {
        match self.latest() {
            Some(index) => {
                self.deliver_error(index, error);
                true
            }
            None => false,
        }
    }

    /// Deliver through the most recent subscription even if it was cancelled,
    /// as a provider with a fix already in flight would.
    pub fn push_late_fix(&self, fix: LocationFix) {
        if let Some(index) = self.last_ever() {
            self.deliver_fix(index, fix);
        }
    }
}
