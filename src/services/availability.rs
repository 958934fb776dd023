use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use rusqlite::Connection;

use crate::db::queries;

/// Working hours of the studio: appointments may start in [09:00, 19:00).
pub const OPEN_HOUR: u32 = 9;
pub const CLOSE_HOUR: u32 = 19;

pub fn within_working_hours(time: NaiveTime) -> bool {
    time.hour() >= OPEN_HOUR && time.hour() < CLOSE_HOUR
}

/// Strict interval overlap: `[a_start, a_end)` intersects `[b_start, b_end)`.
pub fn overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Whether the candidate slot is free of conflicts with stored bookings.
///
/// Reads all bookings on the candidate's date; malformed rows are already
/// skipped by the store. A storage read failure reports the slot as free
/// (availability over consistency) and logs the error — the insert
/// transaction is the final arbiter either way.
pub fn is_slot_available(conn: &Connection, start: NaiveDateTime, duration_minutes: i32) -> bool {
    let bookings = match queries::bookings_on_date(conn, start.date()) {
        Ok(bookings) => bookings,
        Err(e) => {
            tracing::error!(error = %e, "availability read failed, reporting slot as free");
            return true;
        }
    };

    let end = start + Duration::minutes(duration_minutes as i64);
    !bookings.iter().any(|booking| {
        let booking_end =
            booking.scheduled_at + Duration::minutes(booking.duration_minutes as i64);
        overlaps(start, end, booking.scheduled_at, booking_end)
    })
}
