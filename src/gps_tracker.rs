use chrono::{NaiveDateTime, NaiveTime, TimeZone, Utc};
use log::debug;
use nmea::sentences::FixType;
use nmea::{Nmea, SentenceType};
use thiserror::Error;

use crate::config::{ASSUMED_UERE_M, MAX_HIGH_ACCURACY_HDOP};
use crate::location::LocationFix;
use crate::position::Position;

#[derive(Debug, Error)]
#[error("unparsable NMEA sentence '{sentence}': {reason}")]
pub struct SentenceError {
    pub sentence: String,
    pub reason: String,
}

const KNOTS_TO_MPS: f64 = 0.514_444;

/// Accumulates NMEA sentences and turns position reports into location fixes.
///
/// A receiver reports one reading in several sentences (GGA and RMC share a
/// fix time). Only the first of them yields a fix.
pub struct GpsTracker {
    nmea: Nmea,
    high_accuracy: bool,
    last_reading: Option<(NaiveTime, Position)>,
}

impl GpsTracker {
    pub fn new(high_accuracy: bool) -> Self {
        Self {
            nmea: Nmea::default(),
            high_accuracy,
            last_reading: None,
        }
    }

    /// Feed one sentence. Returns a fix when the sentence carried a usable position.
    pub fn ingest(&mut self, sentence: &str) -> Result<Option<LocationFix>, SentenceError> {
        let trimmed = sentence.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let sentence_type = self.nmea.parse(trimmed).map_err(|e| SentenceError {
            sentence: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(
            sentence_type,
            SentenceType::GGA | SentenceType::RMC | SentenceType::GLL
        ) {
            return Ok(None);
        }

        if matches!(self.nmea.fix_type, Some(FixType::Invalid)) {
            debug!("Skipping {:?} without a valid fix", sentence_type);
            return Ok(None);
        }

        let (Some(lat), Some(lon)) = (self.nmea.latitude, self.nmea.longitude) else {
            return Ok(None);
        };
        let position = Position::new(lat, lon);

        if let Some(time) = self.nmea.fix_time {
            if self.last_reading == Some((time, position)) {
                return Ok(None);
            }
            self.last_reading = Some((time, position));
        }

        let hdop = self.nmea.hdop.map(f64::from);
        if self.high_accuracy
            && let Some(hdop) = hdop
            && hdop > MAX_HIGH_ACCURACY_HDOP
        {
            debug!("Dropping fix {} with HDOP {:.1}", position, hdop);
            return Ok(None);
        }

        Ok(Some(LocationFix {
            position,
            accuracy: hdop.map(|h| h * ASSUMED_UERE_M),
            heading: self.nmea.true_course.map(f64::from),
            speed: self
                .nmea
                .speed_over_ground
                .map(|knots| f64::from(knots) * KNOTS_TO_MPS),
            satellites: self.nmea.num_of_fix_satellites,
            timestamp: self.fix_timestamp(),
        }))
    }

    /// Receiver time when known. Without a date (GGA only) today's date is assumed.
    fn fix_timestamp(&self) -> chrono::DateTime<Utc> {
        match self.nmea.fix_time {
            Some(time) => {
                let date = self
                    .nmea
                    .fix_date
                    .unwrap_or_else(|| Utc::now().date_naive());
                Utc.from_utc_datetime(&NaiveDateTime::new(date, time))
            }
            None => Utc::now(),
        }
    }
}
