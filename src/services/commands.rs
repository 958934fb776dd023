use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};

use crate::config::StudioInfo;
use crate::db::queries;
use crate::models::{Booking, BookingStatus, ChatUpdate, Command, Service};
use crate::services::dialogue;
use crate::state::AppState;

const PAGE_SIZE: u32 = 10;
const ACCESS_DENIED: &str = "⛔ Access denied.";

/// Handles every command that does not drive the booking dialogue itself.
/// Admin commands are gated up front: non-admin callers get a denial and
/// nothing is executed.
pub async fn handle(
    state: &Arc<AppState>,
    update: &ChatUpdate,
    command: &Command,
) -> anyhow::Result<()> {
    let is_admin = state.config.admins.is_admin(update.user_id);

    let reply = match command {
        Command::Help => help_text(is_admin),
        Command::Status => status_text(state),
        Command::Contacts => contacts_text(&state.config.studio),
        Command::About => about_text(),
        Command::MyBookings => my_bookings_text(state, update.user_id),
        Command::AdminStats => {
            if !is_admin {
                ACCESS_DENIED.to_string()
            } else {
                admin_stats_text(state)
            }
        }
        Command::AllBookings { page } => {
            if !is_admin {
                ACCESS_DENIED.to_string()
            } else {
                bookings_page_text(state, *page)
            }
        }
        Command::TodayBookings => {
            if !is_admin {
                ACCESS_DENIED.to_string()
            } else {
                date_listing_text(state, Local::now().date_naive(), "today")
            }
        }
        Command::TomorrowBookings => {
            if !is_admin {
                ACCESS_DENIED.to_string()
            } else {
                date_listing_text(
                    state,
                    Local::now().date_naive() + Duration::days(1),
                    "tomorrow",
                )
            }
        }
        Command::ConfirmBooking { id } => {
            if !is_admin {
                ACCESS_DENIED.to_string()
            } else {
                confirm_booking(state, *id).await
            }
        }
        // Dialogue-driving commands are dispatched before this layer.
        Command::Start | Command::Menu | Command::Cancel => dialogue::main_menu_text(),
    };

    if let Err(e) = state.chat.send_message(update.chat_id, &reply).await {
        tracing::error!(chat_id = update.chat_id, error = %e, "failed to send command reply");
    }
    Ok(())
}

fn help_text(is_admin: bool) -> String {
    let mut text = String::from(
        "🤖 BOT COMMANDS:\n\n\
         💅 /start — book an appointment\n\
         📊 /mybookings — your bookings\n\
         📞 /contacts — studio contacts\n\
         🏠 /menu — main menu\n\
         📈 /status — system status\n\
         ℹ️ /help — this help\n\n\
         Use the menu buttons to navigate! 🚀",
    );
    if is_admin {
        text.push_str(
            "\n\nAdmin commands:\n\
             /admin — booking stats\n\
             /bookings [page] — all bookings\n\
             /today — today's bookings\n\
             /tomorrow — tomorrow's bookings\n\
             /confirm <id> — confirm a booking",
        );
    }
    text
}

fn status_text(state: &Arc<AppState>) -> String {
    let now = Local::now().naive_local();
    let db = state.db.lock().unwrap();
    let total = queries::count_bookings(&db).unwrap_or_else(|e| {
        tracing::error!(error = %e, "booking count failed");
        0
    });
    let upcoming = queries::count_upcoming(&db, &now).unwrap_or_else(|e| {
        tracing::error!(error = %e, "upcoming count failed");
        0
    });

    format!(
        "📊 SYSTEM STATUS:\n\n\
         • Total bookings: {total}\n\
         • Upcoming bookings: {upcoming}\n\
         • System is running ✅"
    )
}

fn admin_stats_text(state: &Arc<AppState>) -> String {
    let now = Local::now().naive_local();
    let db = state.db.lock().unwrap();
    let total = queries::count_bookings(&db).unwrap_or_else(|e| {
        tracing::error!(error = %e, "booking count failed");
        0
    });
    let upcoming = queries::count_upcoming(&db, &now).unwrap_or_else(|e| {
        tracing::error!(error = %e, "upcoming count failed");
        0
    });

    format!(
        "📊 SYSTEM STATS:\n\n\
         • Total bookings: {total}\n\
         • Upcoming bookings: {upcoming}\n\
         • Past bookings: {past}",
        past = total - upcoming,
    )
}

fn contacts_text(studio: &StudioInfo) -> String {
    format!(
        "📞 STUDIO CONTACTS\n\n\
         📱 Phone: {phone}\n\
         📸 Instagram: {instagram}\n\
         🏠 Address: {address}\n\
         🕐 Hours: {hours}\n\n\
         📍 We look forward to seeing you!",
        phone = studio.phone,
        instagram = studio.instagram,
        address = studio.address,
        hours = studio.hours,
    )
}

fn about_text() -> String {
    let services = Service::ALL
        .iter()
        .map(|svc| format!("• {}", svc.label()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "💖 ABOUT OUR STUDIO\n\n\
         We are a modern beauty studio staffed by true professionals!\n\n\
         ✨ Our services:\n{services}\n\n\
         We look forward to your visit! 💫"
    )
}

fn my_bookings_text(state: &Arc<AppState>, user_id: i64) -> String {
    let now = Local::now().naive_local();
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::bookings_for_user(&db, user_id, &now).unwrap_or_else(|e| {
            tracing::error!(user_id, error = %e, "listing user bookings failed");
            vec![]
        })
    };

    if bookings.is_empty() {
        return "📋 You have no upcoming bookings yet.\n\nWould you like to book a service?"
            .to_string();
    }

    let mut text = String::from("📋 YOUR UPCOMING BOOKINGS:\n\n");
    for (i, booking) in bookings.iter().enumerate() {
        let (emoji, status) = match booking.status {
            BookingStatus::Confirmed => ("✅", "Confirmed"),
            BookingStatus::Pending => ("⏳", "Awaiting confirmation"),
        };
        text.push_str(&format!(
            "{n}. {emoji} {service}\n   📅 {when}\n   🔢 #{id}\n   📞 {contact}\n   🏷 Status: {status}\n\n",
            n = i + 1,
            service = booking.service.label(),
            when = booking.scheduled_at.format("%d.%m.%Y %H:%M"),
            id = booking.id,
            contact = booking.contact,
        ));
    }
    text
}

fn bookings_page_text(state: &Arc<AppState>, page: u32) -> String {
    let page = page.max(1);
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::all_bookings_page(&db, page, PAGE_SIZE).unwrap_or_else(|e| {
            tracing::error!(page, error = %e, "listing all bookings failed");
            vec![]
        })
    };

    if bookings.is_empty() {
        return format!("📖 No bookings on page {page}.");
    }

    let mut text = format!("📖 ALL BOOKINGS — page {page}:\n\n");
    for booking in &bookings {
        text.push_str(&booking_line(booking));
    }
    text.push_str(&format!("\nNext page: /bookings {}", page + 1));
    text
}

fn date_listing_text(state: &Arc<AppState>, date: NaiveDate, title: &str) -> String {
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::bookings_on_date(&db, date).unwrap_or_else(|e| {
            tracing::error!(%date, error = %e, "listing bookings by date failed");
            vec![]
        })
    };

    if bookings.is_empty() {
        return format!("📖 No bookings for {title} ({}).", date.format("%d.%m.%Y"));
    }

    let mut text = format!(
        "📖 BOOKINGS FOR {} ({}):\n\n",
        title.to_uppercase(),
        date.format("%d.%m.%Y")
    );
    for booking in &bookings {
        text.push_str(&booking_line(booking));
    }
    text
}

fn booking_line(booking: &Booking) -> String {
    format!(
        "#{id} {service} — {when} ({duration} min) — {status}\n",
        id = booking.id,
        service = booking.service.label(),
        when = booking.scheduled_at.format("%d.%m.%Y %H:%M"),
        duration = booking.duration_minutes,
        status = booking.status.as_str(),
    )
}

async fn confirm_booking(state: &Arc<AppState>, id: Option<i64>) -> String {
    let Some(id) = id else {
        return "Usage: /confirm <booking id>".to_string();
    };

    let booking = {
        let db = state.db.lock().unwrap();
        match queries::get_booking(&db, id) {
            Ok(Some(booking)) => booking,
            Ok(None) => return format!("❌ Booking #{id} not found."),
            Err(e) => {
                tracing::error!(booking_id = id, error = %e, "booking lookup failed");
                return format!("❌ Could not load booking #{id}, try again later.");
            }
        }
    };

    let updated = {
        let db = state.db.lock().unwrap();
        match queries::set_status(&db, id, BookingStatus::Confirmed) {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!(booking_id = id, error = %e, "status update failed");
                return format!("❌ Could not confirm booking #{id}, try again later.");
            }
        }
    };
    if !updated {
        return format!("❌ Booking #{id} not found.");
    }

    let notice = format!(
        "✅ Your booking #{id} ({service} on {when}) has been confirmed.\nSee you soon!",
        service = booking.service.label(),
        when = booking.scheduled_at.format("%d.%m.%Y %H:%M"),
    );
    if let Err(e) = state
        .chat
        .send_message(booking.requester.chat_id, &notice)
        .await
    {
        tracing::error!(booking_id = id, error = %e, "failed to notify client about confirmation");
    }

    format!("✅ Booking #{id} confirmed. The client has been notified.")
}
