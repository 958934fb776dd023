use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, TransactionBehavior};

use crate::models::{Booking, BookingStatus, NewBooking, ReminderKind, Requester, Service};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn day_bounds(date: NaiveDate) -> (String, String) {
    let start = date.and_hms_opt(0, 0, 0).map(|dt| fmt_dt(&dt));
    let end = date.and_hms_opt(23, 59, 59).map(|dt| fmt_dt(&dt));
    (start.unwrap_or_default(), end.unwrap_or_default())
}

/// Result of a booking insert. The slot is re-checked inside the insert
/// transaction, so two confirmations racing for the same interval cannot
/// both be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(i64),
    SlotTaken,
}

/// Next id in the monotone sequence: max(existing) + 1, or 1 when empty.
pub fn next_booking_id(conn: &Connection) -> anyhow::Result<i64> {
    let max: Option<i64> = conn.query_row("SELECT MAX(id) FROM appointments", [], |row| {
        row.get(0)
    })?;
    Ok(max.unwrap_or(0) + 1)
}

/// Inserts a booking inside an IMMEDIATE transaction. The id is assigned and
/// the slot overlap is re-verified under the same write lock; the row is
/// durable before this returns, so callers may notify admins afterwards.
pub fn insert_booking(conn: &mut Connection, new: &NewBooking) -> anyhow::Result<InsertOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let start = new.scheduled_at;
    let end = start + Duration::minutes(new.duration_minutes as i64);
    for existing in bookings_on_date(&tx, start.date())? {
        let existing_end =
            existing.scheduled_at + Duration::minutes(existing.duration_minutes as i64);
        if start < existing_end && existing.scheduled_at < end {
            return Ok(InsertOutcome::SlotTaken);
        }
    }

    let id = next_booking_id(&tx)?;
    let created_at = Local::now().naive_local();
    tx.execute(
        "INSERT INTO appointments (id, service, scheduled_at, duration_minutes, contact,
                                   chat_id, user_id, username, display_name, status,
                                   reminder_day_sent, reminder_hour_sent, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, 0, ?11)",
        params![
            id,
            new.service.key(),
            fmt_dt(&new.scheduled_at),
            new.duration_minutes,
            new.contact,
            new.requester.chat_id,
            new.requester.user_id,
            new.requester.username,
            new.requester.display_name,
            BookingStatus::Pending.as_str(),
            fmt_dt(&created_at),
        ],
    )?;
    tx.commit()?;

    Ok(InsertOutcome::Created(id))
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Upcoming bookings for one user, in insertion order.
pub fn bookings_for_user(
    conn: &Connection,
    user_id: i64,
    now: &NaiveDateTime,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE user_id = ?1 AND scheduled_at >= ?2 ORDER BY id ASC"
    ))?;

    let rows = stmt.query_map(params![user_id, fmt_dt(now)], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// One page of the full appointment book, ascending by scheduled time.
/// Pages are 1-based.
pub fn all_bookings_page(
    conn: &Connection,
    page: u32,
    page_size: u32,
) -> anyhow::Result<Vec<Booking>> {
    let page = page.max(1);
    let offset = (page as i64 - 1) * page_size as i64;

    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} ORDER BY scheduled_at ASC LIMIT ?1 OFFSET ?2"
    ))?;

    let rows = stmt.query_map(params![page_size as i64, offset], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// All bookings on a calendar date. Rows that no longer parse (malformed
/// service or timestamp) are skipped with a warning instead of poisoning
/// conflict checks and listings.
pub fn bookings_on_date(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let (start, end) = day_bounds(date);
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE scheduled_at >= ?1 AND scheduled_at <= ?2 ORDER BY scheduled_at ASC"
    ))?;

    let rows = stmt.query_map(params![start, end], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        match row? {
            Ok(booking) => bookings.push(booking),
            Err(e) => tracing::warn!(error = %e, "skipping malformed appointment row"),
        }
    }
    Ok(bookings)
}

pub fn set_status(conn: &Connection, id: i64, status: BookingStatus) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

/// Flips a reminder flag false→true. The guard keeps the flag monotone and
/// makes repeated calls no-ops.
pub fn set_reminder_flag(conn: &Connection, id: i64, kind: ReminderKind) -> anyhow::Result<bool> {
    let sql = match kind {
        ReminderKind::DayBefore => {
            "UPDATE appointments SET reminder_day_sent = 1 WHERE id = ?1 AND reminder_day_sent = 0"
        }
        ReminderKind::HourBefore => {
            "UPDATE appointments SET reminder_hour_sent = 1 WHERE id = ?1 AND reminder_hour_sent = 0"
        }
    };
    let count = conn.execute(sql, params![id])?;
    Ok(count > 0)
}

pub fn count_bookings(conn: &Connection) -> anyhow::Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_upcoming(conn: &Connection, now: &NaiveDateTime) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE scheduled_at >= ?1",
        params![fmt_dt(now)],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Confirmed bookings on `date` still awaiting their day-before notice.
pub fn day_reminders_due(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let (start, end) = day_bounds(date);
    reminders_due(
        conn,
        "reminder_day_sent",
        &start,
        &end,
    )
}

/// Confirmed bookings starting inside `[from, to]` still awaiting their
/// hour-before notice.
pub fn hour_reminders_due(
    conn: &Connection,
    from: &NaiveDateTime,
    to: &NaiveDateTime,
) -> anyhow::Result<Vec<Booking>> {
    reminders_due(conn, "reminder_hour_sent", &fmt_dt(from), &fmt_dt(to))
}

fn reminders_due(
    conn: &Connection,
    flag_column: &str,
    start: &str,
    end: &str,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE status = 'confirmed' AND {flag_column} = 0
         AND scheduled_at >= ?1 AND scheduled_at <= ?2
         ORDER BY scheduled_at ASC"
    ))?;

    let rows = stmt.query_map(params![start, end], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        match row? {
            Ok(booking) => bookings.push(booking),
            Err(e) => tracing::warn!(error = %e, "skipping malformed appointment row"),
        }
    }
    Ok(bookings)
}

const SELECT_COLUMNS: &str = "SELECT id, service, scheduled_at, duration_minutes, contact, \
     chat_id, user_id, username, display_name, status, \
     reminder_day_sent, reminder_hour_sent, created_at FROM appointments";

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: i64 = row.get(0)?;
    let service_key: String = row.get(1)?;
    let scheduled_at_str: String = row.get(2)?;
    let duration_minutes: i32 = row.get(3)?;
    let contact: String = row.get(4)?;
    let chat_id: i64 = row.get(5)?;
    let user_id: i64 = row.get(6)?;
    let username: Option<String> = row.get(7)?;
    let display_name: Option<String> = row.get(8)?;
    let status_str: String = row.get(9)?;
    let reminder_day_sent: bool = row.get::<_, i32>(10)? != 0;
    let reminder_hour_sent: bool = row.get::<_, i32>(11)? != 0;
    let created_at_str: String = row.get(12)?;

    let service = Service::from_key(&service_key)
        .ok_or_else(|| anyhow::anyhow!("unknown service in appointment {id}: {service_key}"))?;
    let scheduled_at = NaiveDateTime::parse_from_str(&scheduled_at_str, DATETIME_FMT)
        .map_err(|e| anyhow::anyhow!("bad scheduled_at in appointment {id}: {e}"))?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or(scheduled_at);

    Ok(Booking {
        id,
        service,
        scheduled_at,
        duration_minutes,
        contact,
        requester: Requester {
            chat_id,
            user_id,
            username,
            display_name,
        },
        status: BookingStatus::parse(&status_str),
        reminder_day_sent,
        reminder_hour_sent,
        created_at,
    })
}
