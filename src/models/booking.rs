use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Service;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub service: Service,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub contact: String,
    pub requester: Requester,
    pub status: BookingStatus,
    pub reminder_day_sent: bool,
    pub reminder_hour_sent: bool,
    pub created_at: NaiveDateTime,
}

/// Who asked for the appointment, as seen by the chat transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requester {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

/// A booking about to be inserted. The store assigns the id and the
/// created-at timestamp; new bookings always start pending with both
/// reminder flags unset.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub service: Service,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub contact: String,
    pub requester: Requester,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            _ => BookingStatus::Pending,
        }
    }
}

/// The two one-shot reminder thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    DayBefore,
    HourBefore,
}
