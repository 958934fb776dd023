use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};

use crate::db::queries::{self, InsertOutcome};
use crate::models::{
    ChatUpdate, Command, DialogueSession, DialogueStage, Event, NewBooking, Requester, Service,
    SharedContact, BTN_ABOUT, BTN_BOOK, BTN_CONTACTS, BTN_MY_BOOKINGS,
};
use crate::services::{availability, commands, notify};
use crate::state::AppState;

/// Entry point for every inbound update. Classifies the event, locks the
/// chat's session for the whole transition and dispatches to the current
/// stage. Every path either completes a transition or re-prompts the same
/// stage; nothing here can leave a session stuck.
pub async fn process_update(state: &Arc<AppState>, update: ChatUpdate) -> anyhow::Result<()> {
    let event = Event::classify(&update);
    let session_handle = state.session(update.chat_id);
    let mut session = session_handle.lock().await;

    tracing::info!(
        chat_id = update.chat_id,
        stage = session.stage.as_str(),
        event = ?event,
        "processing update"
    );

    match event {
        Event::Command(Command::Start) => {
            // A new booking always starts from a clean draft.
            session.reset();
            session.stage = DialogueStage::AwaitingService;
            send(state, update.chat_id, &service_prompt()).await;
        }
        Event::Command(Command::Cancel) | Event::Command(Command::Menu) => {
            session.reset();
            send(state, update.chat_id, &main_menu_text()).await;
        }
        Event::Command(command) => {
            commands::handle(state, &update, &command).await?;
        }
        event => match session.stage {
            DialogueStage::Idle => {
                send(state, update.chat_id, &main_menu_text()).await;
            }
            DialogueStage::AwaitingService => {
                on_service(state, &update, &mut session, event).await
            }
            DialogueStage::AwaitingDate => on_date(state, &update, &mut session, event).await,
            DialogueStage::AwaitingTime => on_time(state, &update, &mut session, event).await,
            DialogueStage::AwaitingContact => {
                on_contact(state, &update, &mut session, event).await
            }
            DialogueStage::AwaitingConfirmation => {
                on_confirm(state, &update, &mut session, event).await
            }
        },
    }

    Ok(())
}

async fn on_service(
    state: &Arc<AppState>,
    update: &ChatUpdate,
    session: &mut DialogueSession,
    event: Event,
) {
    match event {
        Event::Back => {
            session.reset();
            send(state, update.chat_id, &main_menu_text()).await;
        }
        Event::ServiceSelected(service) => {
            session.draft.service = Some(service);
            session.stage = DialogueStage::AwaitingDate;
            let text = format!(
                "💅 You picked: {label}\n⏰ Duration: {duration} min\n\n{prompt}",
                label = service.label(),
                duration = service.duration_minutes(),
                prompt = date_prompt(Local::now().date_naive()),
            );
            send(state, update.chat_id, &text).await;
        }
        _ => {
            let text = format!("❌ Please choose a service from the list.\n\n{}", service_prompt());
            send(state, update.chat_id, &text).await;
        }
    }
}

async fn on_date(
    state: &Arc<AppState>,
    update: &ChatUpdate,
    session: &mut DialogueSession,
    event: Event,
) {
    match event {
        Event::Back => {
            session.stage = DialogueStage::AwaitingService;
            send(state, update.chat_id, &service_prompt()).await;
        }
        Event::Text(text) if text.contains("Other date") => {
            send(
                state,
                update.chat_id,
                "📅 Enter a date as DD.MM.YYYY\n\nExample: 25.12.2030",
            )
            .await;
        }
        Event::Text(text) => {
            let today = Local::now().date_naive();
            match parse_date_input(&text, today) {
                Some(date) if date < today => {
                    send(
                        state,
                        update.chat_id,
                        "❌ That date has already passed.\nPlease choose a future date:",
                    )
                    .await;
                }
                Some(date) => {
                    session.draft.date = Some(date);
                    session.stage = DialogueStage::AwaitingTime;
                    let text = format!(
                        "📅 Date picked: {}\n\n{}",
                        date.format("%d.%m.%Y"),
                        time_prompt()
                    );
                    send(state, update.chat_id, &text).await;
                }
                None => {
                    let text = format!(
                        "❌ Invalid date format.\n\nPick a date from the buttons or type DD.MM.YYYY\n\n{}",
                        date_prompt(today)
                    );
                    send(state, update.chat_id, &text).await;
                }
            }
        }
        _ => {
            let today = Local::now().date_naive();
            send(state, update.chat_id, &date_prompt(today)).await;
        }
    }
}

async fn on_time(
    state: &Arc<AppState>,
    update: &ChatUpdate,
    session: &mut DialogueSession,
    event: Event,
) {
    match event {
        Event::Back => {
            session.stage = DialogueStage::AwaitingDate;
            send(state, update.chat_id, &date_prompt(Local::now().date_naive())).await;
        }
        Event::Text(text) if text.contains("Other time") => {
            send(
                state,
                update.chat_id,
                "🕐 Enter a time as HH:MM\n\nExample: 15:30",
            )
            .await;
        }
        Event::Text(text) => {
            let Some(time) = extract_time(&text) else {
                let reply = format!(
                    "❌ Invalid time format.\n\nPick a time from the buttons or type HH:MM\n\n{}",
                    time_prompt()
                );
                send(state, update.chat_id, &reply).await;
                return;
            };

            if !availability::within_working_hours(time) {
                let reply = format!(
                    "❌ The studio is open from {:02}:00 to {:02}:00.\nPlease pick a time within working hours:",
                    availability::OPEN_HOUR,
                    availability::CLOSE_HOUR
                );
                send(state, update.chat_id, &reply).await;
                return;
            }

            let (Some(date), Some(service)) = (session.draft.date, session.draft.service) else {
                session.reset();
                send(state, update.chat_id, RESTART_MESSAGE).await;
                return;
            };
            let scheduled_at = date.and_time(time);

            let available = {
                let db = state.db.lock().unwrap();
                availability::is_slot_available(&db, scheduled_at, service.duration_minutes())
            };
            if !available {
                send(
                    state,
                    update.chat_id,
                    "❌ That time is already taken. Please pick another time:",
                )
                .await;
                return;
            }

            session.draft.scheduled_at = Some(scheduled_at);
            session.stage = DialogueStage::AwaitingContact;
            send(state, update.chat_id, &contact_prompt()).await;
        }
        _ => {
            send(state, update.chat_id, &time_prompt()).await;
        }
    }
}

async fn on_contact(
    state: &Arc<AppState>,
    update: &ChatUpdate,
    session: &mut DialogueSession,
    event: Event,
) {
    let contact = match event {
        Event::Back => {
            session.stage = DialogueStage::AwaitingTime;
            send(state, update.chat_id, &time_prompt()).await;
            return;
        }
        Event::ContactShared(card) => format_contact(&card),
        Event::Text(text) if text.contains("Share contact") => {
            send(
                state,
                update.chat_id,
                "📞 Tap the share-contact button below to send your number.",
            )
            .await;
            return;
        }
        Event::Text(text) if !text.is_empty() => text,
        _ => {
            send(state, update.chat_id, &contact_prompt()).await;
            return;
        }
    };

    session.draft.contact = Some(contact);
    session.stage = DialogueStage::AwaitingConfirmation;
    send(state, update.chat_id, &summary_text(session)).await;
}

async fn on_confirm(
    state: &Arc<AppState>,
    update: &ChatUpdate,
    session: &mut DialogueSession,
    event: Event,
) {
    let affirmative = match &event {
        Event::Text(text) => is_affirmative(text),
        _ => false,
    };

    if !affirmative {
        // Anything but an explicit yes cancels; no booking is created.
        session.reset();
        let text = format!("❌ Booking cancelled.\n\n{}", main_menu_text());
        send(state, update.chat_id, &text).await;
        return;
    }

    let (Some(service), Some(scheduled_at), Some(contact)) = (
        session.draft.service,
        session.draft.scheduled_at,
        session.draft.contact.clone(),
    ) else {
        session.reset();
        send(state, update.chat_id, RESTART_MESSAGE).await;
        return;
    };

    let new = NewBooking {
        service,
        scheduled_at,
        duration_minutes: service.duration_minutes(),
        contact,
        requester: Requester {
            chat_id: update.chat_id,
            user_id: update.user_id,
            username: update.username.clone(),
            display_name: update.display_name.clone(),
        },
    };

    let outcome = {
        let mut db = state.db.lock().unwrap();
        queries::insert_booking(&mut db, &new)
    };
    session.reset();

    match outcome {
        Ok(InsertOutcome::Created(id)) => {
            tracing::info!(booking_id = id, chat_id = update.chat_id, "booking created");
            send(state, update.chat_id, &success_text(id, &new)).await;

            // The row is committed; notification is best-effort from here on.
            let booking = {
                let db = state.db.lock().unwrap();
                queries::get_booking(&db, id)
            };
            match booking {
                Ok(Some(booking)) => notify::booking_created(state, &booking).await,
                Ok(None) => tracing::error!(booking_id = id, "created booking disappeared"),
                Err(e) => {
                    tracing::error!(booking_id = id, error = %e, "failed to reload booking for notification")
                }
            }
        }
        Ok(InsertOutcome::SlotTaken) => {
            let text = format!(
                "❌ Sorry, that time was taken a moment ago.\n\n{}",
                main_menu_text()
            );
            send(state, update.chat_id, &text).await;
        }
        Err(e) => {
            tracing::error!(chat_id = update.chat_id, error = %e, "failed to save booking");
            send(
                state,
                update.chat_id,
                "❌ Something went wrong while saving your booking. Please try again later.",
            )
            .await;
        }
    }
}

async fn send(state: &Arc<AppState>, chat_id: i64, text: &str) {
    if let Err(e) = state.chat.send_message(chat_id, text).await {
        tracing::error!(chat_id, error = %e, "failed to send chat message");
    }
}

// ── Parsing helpers ──

const AFFIRMATIVES: [&str; 6] = ["✅ yes, confirm", "yes, confirm", "yes", "y", "confirm", "ok"];

fn is_affirmative(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    AFFIRMATIVES.contains(&normalized.as_str())
}

/// Resolves a date input: preset labels first, then day-first numeric forms
/// (`DD.MM.YYYY`, or `DD.MM` in the current year).
fn parse_date_input(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = input.to_lowercase();
    if lower.contains("day after") {
        return Some(today + Duration::days(2));
    }
    if lower.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }
    if lower.contains("today") {
        return Some(today);
    }

    let token = input
        .split_whitespace()
        .find(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()))?;

    if let Ok(date) = NaiveDate::parse_from_str(token, "%d.%m.%Y") {
        return Some(date);
    }

    let parts: Vec<&str> = token.trim_end_matches('.').split('.').collect();
    if parts.len() == 2 {
        let day: u32 = parts[0].parse().ok()?;
        let month: u32 = parts[1].parse().ok()?;
        return NaiveDate::from_ymd_opt(today.year(), month, day);
    }
    None
}

/// Pulls the trailing `HH:MM` token out of a button label like "🕘 09:00"
/// or a bare typed time.
fn extract_time(input: &str) -> Option<NaiveTime> {
    let token = input.split_whitespace().rev().find(|t| t.contains(':'))?;
    NaiveTime::parse_from_str(token, "%H:%M").ok()
}

fn format_contact(card: &SharedContact) -> String {
    match card.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => format!("👤 {name} 📱 {phone}", phone = card.phone),
        _ => format!("📱 {}", card.phone),
    }
}

// ── Prompts ──

const RESTART_MESSAGE: &str = "❌ Something went wrong. Please start over with /start.";

pub fn main_menu_text() -> String {
    format!(
        "💖 Welcome to the beauty studio!\n\n\
         Choose an action:\n\
         {BTN_BOOK}\n\
         {BTN_MY_BOOKINGS}\n\
         {BTN_ABOUT}\n\
         {BTN_CONTACTS}"
    )
}

fn service_prompt() -> String {
    let services = Service::ALL
        .iter()
        .map(|svc| format!("• {}", svc.label()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("💅 Choose a service to book:\n\n{services}\n\n🔙 Back")
}

fn date_prompt(today: NaiveDate) -> String {
    let tomorrow = today + Duration::days(1);
    let after_tomorrow = today + Duration::days(2);
    format!(
        "📅 Choose a date:\n\
         • Today ({})\n\
         • Tomorrow ({})\n\
         • Day after tomorrow ({})\n\
         • 📅 Other date\n\n\
         🔙 Back to services",
        today.format("%d.%m"),
        tomorrow.format("%d.%m"),
        after_tomorrow.format("%d.%m"),
    )
}

fn time_prompt() -> String {
    "🕐 Choose a time:\n\
     🕘 09:00  🕙 10:00  🕚 11:00\n\
     🕛 12:00  🕐 13:00  🕑 14:00\n\
     🕒 15:00  🕓 16:00  🕔 17:00\n\
     🕕 18:00  🕗 Other time\n\n\
     🔙 Back to dates"
        .to_string()
}

fn contact_prompt() -> String {
    "📞 How can we reach you to confirm the booking?\n\n\
     Send your phone or other contacts:\n\
     • 📱 Phone number\n\
     • 💬 WhatsApp\n\
     • ✈️ Telegram (@username)\n\
     • 📧 Email\n\n\
     Or tap '📞 Share contact'\n\n\
     🔙 Back to times"
        .to_string()
}

fn summary_text(session: &DialogueSession) -> String {
    let draft = &session.draft;
    let service = draft.service.map(|s| s.label()).unwrap_or("—");
    let duration = draft
        .service
        .map(|s| s.duration_minutes().to_string())
        .unwrap_or_else(|| "—".to_string());
    let when = draft
        .scheduled_at
        .map(|dt| dt.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string());

    format!(
        "✅ CHECK YOUR BOOKING DETAILS:\n\n\
         💅 Service: {service}\n\
         📅 Date and time: {when}\n\
         ⏰ Duration: {duration} min\n\
         📞 Contacts: {contact}\n\n\
         All correct? Confirm the booking?\n\n\
         ✅ Yes, confirm / ❌ No, cancel",
        contact = draft.contact.as_deref().unwrap_or("—"),
    )
}

fn success_text(id: i64, new: &NewBooking) -> String {
    format!(
        "🎉 PRELIMINARY BOOKING #{id} CREATED!\n\n\
         💅 Service: {service}\n\
         📅 Date: {when}\n\
         ⏰ Duration: {duration} min\n\
         📞 Contacts: {contact}\n\n\
         ⚠️ This is a preliminary booking!\n\
         An administrator will contact you shortly to confirm it.\n\n\
         Thank you for trusting us! 💖",
        service = new.service.label(),
        when = new.scheduled_at.format("%d.%m.%Y %H:%M"),
        duration = new.duration_minutes,
        contact = new.contact,
    )
}
