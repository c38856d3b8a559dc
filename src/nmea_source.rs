use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::gps_tracker::GpsTracker;
use crate::location::{
    ErrorCallback, FixCallback, LocationError, LocationSource, SubscriptionHandle, WatchOptions,
};

/// Location provider reading NMEA 0183 from a serial device or a recorded log.
///
/// `maximum_age` is irrelevant here: every fix comes straight off the receiver.
pub struct NmeaLocationSource {
    path: PathBuf,
    replay_interval: Option<Duration>,
    next_id: u64,
    active: Option<(SubscriptionHandle, Arc<AtomicBool>)>,
}

impl NmeaLocationSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            replay_interval: None,
            next_id: 1,
            active: None,
        }
    }

    /// Pause between fixes, for replaying a recorded log at walking pace.
    pub fn with_replay_interval(mut self, interval: Duration) -> Self {
        self.replay_interval = Some(interval);
        self
    }

    fn open(&self) -> Result<File, LocationError> {
        File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => LocationError::PermissionDenied,
            _ => LocationError::Io(e),
        })
    }
}

fn read_sentences(
    reader: impl BufRead,
    mut tracker: GpsTracker,
    stop: &AtomicBool,
    replay_interval: Option<Duration>,
    on_fix: &mut FixCallback,
    on_error: &mut ErrorCallback,
) {
    for line in reader.lines() {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        match line {
            Ok(content) => match tracker.ingest(&content) {
                Ok(Some(fix)) => {
                    if let Some(interval) = replay_interval {
                        thread::sleep(interval);
                    }
                    if stop.load(Ordering::SeqCst) {
                        return;
                    }
                    on_fix(fix);
                }
                Ok(None) => {}
                Err(e) => warn!("{}", e),
            },
            Err(e) => {
                if !stop.load(Ordering::SeqCst) {
                    on_error(LocationError::Io(e));
                }
                return;
            }
        }
    }

    if !stop.load(Ordering::SeqCst) {
        on_error(LocationError::Unavailable("end of NMEA stream".to_string()));
    }
}

impl LocationSource for NmeaLocationSource {
    fn start(
        &mut self,
        options: &WatchOptions,
        mut on_fix: FixCallback,
        mut on_error: ErrorCallback,
    ) -> Result<SubscriptionHandle, LocationError> {
        if let Some((handle, _)) = &self.active {
            return Err(LocationError::Unavailable(format!(
                "subscription {} still active",
                handle.0
            )));
        }

        let file = self.open()?;
        let handle = SubscriptionHandle(self.next_id);
        self.next_id += 1;

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let tracker = GpsTracker::new(options.high_accuracy);
        let replay_interval = self.replay_interval;

        thread::Builder::new()
            .name("nmea-reader".into())
            .spawn(move || {
                read_sentences(
                    BufReader::new(file),
                    tracker,
                    &thread_stop,
                    replay_interval,
                    &mut on_fix,
                    &mut on_error,
                );
            })?;

        info!("Reading NMEA from {} (subscription {})", self.path.display(), handle.0);
        self.active = Some((handle, stop));
        Ok(handle)
    }

    /// Stops the reader thread of `handle`. No callback fires afterwards.
    ///
    /// The thread checks the stop flag between lines, so on a quiet serial
    /// device it stays blocked in `read` (holding the device open) until the
    /// receiver sends its next sentence.
    fn cancel(&mut self, handle: SubscriptionHandle) {
        match self.active.take() {
            Some((active, stop)) if active == handle => {
                stop.store(true, Ordering::SeqCst);
                info!("Stopped NMEA subscription {}", handle.0);
            }
            other => {
                warn!("Cancel for unknown subscription {}", handle.0);
                self.active = other;
            }
        }
    }
}
