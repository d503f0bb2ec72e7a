//! DOS date/time packing for ZIP header fields.
//!
//! ZIP stores modification times as two 16-bit words in local calendar time:
//!
//! ```text
//! date: YYYYYYYM MMMDDDDD   (year - 1980, month 1-12, day 1-31)
//! time: HHHHHMMM MMMSSSSS   (hour, minute, second / 2)
//! ```
//!
//! Seconds have 2-second resolution. Years outside 1980..=2107 do not fit the
//! 7-bit year field and are rejected with [`ZipError::OutOfRange`].

use std::time::SystemTime;

use time::{OffsetDateTime, UtcOffset};

use crate::error::{Result, ZipError};

pub const MIN_YEAR: i32 = 1980;
pub const MAX_YEAR: i32 = 2107;

/// A packed DOS timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// Pack the calendar fields of `datetime` as they are, in its own offset.
    pub fn from_datetime(datetime: OffsetDateTime) -> Result<Self> {
        let year = datetime.year();
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ZipError::OutOfRange { year });
        }

        let year = (year - MIN_YEAR) as u16;
        let month = u8::from(datetime.month()) as u16;
        let day = datetime.day() as u16;
        let date = day | (month << 5) | (year << 9);

        let hour = datetime.hour() as u16;
        let minute = datetime.minute() as u16;
        let second = datetime.second() as u16;
        let time = (second / 2) | (minute << 5) | (hour << 11);

        Ok(Self { time, date })
    }

    /// Pack a filesystem timestamp using the local calendar.
    pub fn from_system_time(time: SystemTime) -> Result<Self> {
        Self::from_datetime(to_local(time))
    }
}

/// Convert a `SystemTime` to local calendar time.
///
/// Falls back to UTC when the local offset cannot be determined, which the
/// `time` crate reports on some platforms while other threads are running.
pub fn to_local(time: SystemTime) -> OffsetDateTime {
    let utc = OffsetDateTime::from(time);
    match UtcOffset::local_offset_at(utc) {
        Ok(offset) => utc.to_offset(offset),
        Err(e) => {
            log::debug!("local UTC offset unavailable ({e}), using UTC");
            utc
        }
    }
}
