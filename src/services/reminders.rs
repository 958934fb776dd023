use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Local, NaiveDateTime};

use crate::db::queries;
use crate::models::{Booking, ReminderKind};
use crate::state::AppState;

const STARTUP_DELAY: StdDuration = StdDuration::from_secs(10);
const TICK_INTERVAL: StdDuration = StdDuration::from_secs(300);

/// Starts the background reminder loop: first tick shortly after startup,
/// then every five minutes until process shutdown.
pub fn spawn(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(STARTUP_DELAY).await;
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        loop {
            ticker.tick().await;
            run_tick(&state, Local::now().naive_local()).await;
        }
    })
}

/// One scheduler pass. Confirmed bookings scheduled for tomorrow get the
/// day-before notice; bookings starting within [now+55min, now+65min] get
/// the hour-before notice. The window (rather than an exact-minute match)
/// guarantees every appointment is sampled by some five-minute tick. Flags
/// flip only after a successful send, so failed deliveries retry on the
/// next tick and successful ones never repeat.
pub async fn run_tick(state: &Arc<AppState>, now: NaiveDateTime) {
    let day_due = {
        let db = state.db.lock().unwrap();
        queries::day_reminders_due(&db, now.date() + Duration::days(1)).unwrap_or_else(|e| {
            tracing::error!(error = %e, "day reminder query failed");
            vec![]
        })
    };
    deliver(state, day_due, ReminderKind::DayBefore).await;

    let window_start = now + Duration::minutes(55);
    let window_end = now + Duration::minutes(65);
    let hour_due = {
        let db = state.db.lock().unwrap();
        queries::hour_reminders_due(&db, &window_start, &window_end).unwrap_or_else(|e| {
            tracing::error!(error = %e, "hour reminder query failed");
            vec![]
        })
    };
    deliver(state, hour_due, ReminderKind::HourBefore).await;
}

async fn deliver(state: &Arc<AppState>, due: Vec<Booking>, kind: ReminderKind) {
    for booking in due {
        let text = notice_text(&booking, kind);
        match state
            .chat
            .send_message(booking.requester.chat_id, &text)
            .await
        {
            Ok(()) => {
                let db = state.db.lock().unwrap();
                if let Err(e) = queries::set_reminder_flag(&db, booking.id, kind) {
                    tracing::error!(booking_id = booking.id, error = %e, "failed to record reminder flag");
                } else {
                    tracing::info!(booking_id = booking.id, kind = ?kind, "reminder sent");
                }
            }
            Err(e) => {
                // Flag stays unset; the next tick retries.
                tracing::warn!(booking_id = booking.id, error = %e, "reminder send failed, will retry");
            }
        }
    }
}

fn notice_text(booking: &Booking, kind: ReminderKind) -> String {
    let time = booking.scheduled_at.format("%H:%M");
    match kind {
        ReminderKind::DayBefore => format!(
            "⏰ Reminder: tomorrow at {time} you have {service}.\nWe look forward to seeing you!",
            service = booking.service.label(),
        ),
        ReminderKind::HourBefore => format!(
            "⏰ Reminder: your {service} starts at {time}, about an hour from now.",
            service = booking.service.label(),
        ),
    }
}
