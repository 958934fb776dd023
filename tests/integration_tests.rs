use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Duration, NaiveDateTime};
use tower::ServiceExt;

use salonbot::config::{AdminConfig, AppConfig, StudioInfo};
use salonbot::db::{self, queries};
use salonbot::handlers;
use salonbot::models::{
    BookingStatus, ChatUpdate, DialogueStage, NewBooking, Requester, Service, SharedContact,
};
use salonbot::services::chat::ChatProvider;
use salonbot::services::{dialogue, reminders};
use salonbot::state::AppState;

const NAILS_ADMIN: i64 = 11;
const BEAUTY_ADMIN: i64 = 12;
const HEAD_ADMIN: i64 = 13;

// ── Mock chat provider ──

struct MockChat {
    sent: Arc<Mutex<Vec<(i64, String)>>>,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl ChatProvider for MockChat {
    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("simulated delivery failure");
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id, text.to_string()));
        Ok(())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        bot_token: "test-token".to_string(),
        webhook_secret: String::new(),
        admins: AdminConfig {
            nails_admin: NAILS_ADMIN,
            beauty_admin: BEAUTY_ADMIN,
            head_admin: HEAD_ADMIN,
        },
        studio: StudioInfo {
            phone: "+7 (978) 859-03-84".to_string(),
            instagram: "@ego_sevastopol".to_string(),
            address: "40 Bastionnaya St".to_string(),
            hours: "Daily from 09:00 to 19:00".to_string(),
        },
    }
}

type Sent = Arc<Mutex<Vec<(i64, String)>>>;

fn test_state() -> (Arc<AppState>, Sent, Arc<AtomicBool>) {
    let conn = db::init_db(":memory:").unwrap();
    let sent: Sent = Arc::new(Mutex::new(vec![]));
    let fail = Arc::new(AtomicBool::new(false));
    let chat = MockChat {
        sent: Arc::clone(&sent),
        fail: Arc::clone(&fail),
    };
    let state = Arc::new(AppState::new(conn, test_config(), Box::new(chat)));
    (state, sent, fail)
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/update", post(handlers::webhook::chat_update))
        .with_state(state)
}

fn update(chat_id: i64, user_id: i64) -> ChatUpdate {
    ChatUpdate {
        chat_id,
        user_id,
        username: Some("client".to_string()),
        display_name: Some("Test Client".to_string()),
        text: None,
        callback: None,
        contact: None,
    }
}

async fn send_text(state: &Arc<AppState>, chat_id: i64, user_id: i64, text: &str) {
    let mut u = update(chat_id, user_id);
    u.text = Some(text.to_string());
    dialogue::process_update(state, u).await.unwrap();
}

async fn send_callback(state: &Arc<AppState>, chat_id: i64, user_id: i64, data: &str) {
    let mut u = update(chat_id, user_id);
    u.callback = Some(data.to_string());
    dialogue::process_update(state, u).await.unwrap();
}

async fn send_contact(state: &Arc<AppState>, chat_id: i64, user_id: i64, phone: &str) {
    let mut u = update(chat_id, user_id);
    u.contact = Some(SharedContact {
        phone: phone.to_string(),
        name: Some("Test Client".to_string()),
    });
    dialogue::process_update(state, u).await.unwrap();
}

async fn stage_of(state: &Arc<AppState>, chat_id: i64) -> DialogueStage {
    state.session(chat_id).lock().await.stage
}

fn messages_to(sent: &Sent, chat_id: i64) -> Vec<String> {
    sent.lock()
        .unwrap()
        .iter()
        .filter(|(id, _)| *id == chat_id)
        .map(|(_, text)| text.clone())
        .collect()
}

/// Drives a full booking dialogue for the given service, tomorrow at the
/// given time.
async fn book(state: &Arc<AppState>, chat_id: i64, user_id: i64, service: &str, time: &str) {
    send_text(state, chat_id, user_id, "/start").await;
    send_callback(state, chat_id, user_id, service).await;
    send_text(state, chat_id, user_id, "tomorrow").await;
    send_text(state, chat_id, user_id, time).await;
    send_text(state, chat_id, user_id, "+70000000000").await;
    send_text(state, chat_id, user_id, "yes").await;
}

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn seed_booking(state: &Arc<AppState>, service: Service, at: NaiveDateTime) -> i64 {
    let mut db = state.db.lock().unwrap();
    let outcome = queries::insert_booking(
        &mut db,
        &NewBooking {
            service,
            scheduled_at: at,
            duration_minutes: service.duration_minutes(),
            contact: "+70000000000".to_string(),
            requester: Requester {
                chat_id: 500,
                user_id: 500,
                username: None,
                display_name: None,
            },
        },
    )
    .unwrap();
    match outcome {
        queries::InsertOutcome::Created(id) => id,
        queries::InsertOutcome::SlotTaken => panic!("seed booking conflicted"),
    }
}

// ── HTTP surface ──

#[tokio::test]
async fn test_health_endpoint() {
    let (state, _, _) = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_rejects_bad_secret() {
    let mut config = test_config();
    config.webhook_secret = "s3cret".to_string();
    let conn = db::init_db(":memory:").unwrap();
    let sent: Sent = Arc::new(Mutex::new(vec![]));
    let chat = MockChat {
        sent: Arc::clone(&sent),
        fail: Arc::new(AtomicBool::new(false)),
    };
    let state = Arc::new(AppState::new(conn, config, Box::new(chat)));
    let app = test_app(state);

    let body = serde_json::json!({ "chat_id": 1, "user_id": 1, "text": "/start" });
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/update")
                .header("Content-Type", "application/json")
                .header("X-Webhook-Secret", "wrong")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_processes_update() {
    let (state, sent, _) = test_state();
    let app = test_app(state);

    let body = serde_json::json!({ "chat_id": 42, "user_id": 42, "text": "/start" });
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/update")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let replies = messages_to(&sent, 42);
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Choose a service"));
}

// ── Booking dialogue ──

#[tokio::test]
async fn test_full_manicure_booking_flow() {
    let (state, sent, _) = test_state();

    book(&state, 100, 100, "manicure", "10:00").await;

    // Booking persisted with the fixed duration, pending status
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking(&db, 1).unwrap().unwrap()
    };
    assert_eq!(booking.service, Service::Manicure);
    assert_eq!(booking.duration_minutes, 90);
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.contact, "+70000000000");
    assert!(!booking.reminder_day_sent);
    assert!(!booking.reminder_hour_sent);

    // Client got the success notice
    let client_msgs = messages_to(&sent, 100);
    assert!(client_msgs
        .iter()
        .any(|m| m.contains("PRELIMINARY BOOKING #1 CREATED")));

    // Nails admin and head admin notified; beauty admin not
    assert!(messages_to(&sent, NAILS_ADMIN)
        .iter()
        .any(|m| m.contains("NEW PRELIMINARY BOOKING")));
    assert!(messages_to(&sent, HEAD_ADMIN)
        .iter()
        .any(|m| m.contains("NEW PRELIMINARY BOOKING")));
    assert!(messages_to(&sent, BEAUTY_ADMIN).is_empty());

    // Dialogue is back to idle
    assert_eq!(stage_of(&state, 100).await, DialogueStage::Idle);
}

#[tokio::test]
async fn test_beauty_service_routes_to_beauty_admin() {
    let (state, sent, _) = test_state();

    book(&state, 100, 100, "epilation", "10:00").await;

    assert!(messages_to(&sent, BEAUTY_ADMIN)
        .iter()
        .any(|m| m.contains("NEW PRELIMINARY BOOKING")));
    assert!(messages_to(&sent, NAILS_ADMIN).is_empty());
}

#[tokio::test]
async fn test_double_booking_rejected_while_pending() {
    let (state, sent, _) = test_state();

    // First client books epilation (30 min) and stays pending
    book(&state, 100, 100, "epilation", "10:00").await;

    // Second client reaches the time stage and asks for the same slot
    send_text(&state, 200, 200, "/start").await;
    send_callback(&state, 200, 200, "epilation").await;
    send_text(&state, 200, 200, "tomorrow").await;
    send_text(&state, 200, 200, "10:00").await;

    let replies = messages_to(&sent, 200);
    assert!(replies.last().unwrap().contains("already taken"));
    assert_eq!(stage_of(&state, 200).await, DialogueStage::AwaitingTime);

    // Only the first booking exists
    let db = state.db.lock().unwrap();
    assert_eq!(queries::count_bookings(&db).unwrap(), 1);
}

#[tokio::test]
async fn test_non_affirmative_cancels_without_booking() {
    let (state, sent, _) = test_state();

    send_text(&state, 100, 100, "/start").await;
    send_callback(&state, 100, 100, "lashes").await;
    send_text(&state, 100, 100, "tomorrow").await;
    send_text(&state, 100, 100, "12:00").await;
    send_text(&state, 100, 100, "+70000000000").await;
    send_text(&state, 100, 100, "no way").await;

    assert_eq!(stage_of(&state, 100).await, DialogueStage::Idle);
    assert!(messages_to(&sent, 100)
        .last()
        .unwrap()
        .contains("cancelled"));

    let db = state.db.lock().unwrap();
    assert_eq!(queries::count_bookings(&db).unwrap(), 0);
}

#[tokio::test]
async fn test_cancel_reaches_idle_from_every_stage() {
    let (state, _, _) = test_state();

    // AwaitingService
    send_text(&state, 1, 1, "/start").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::AwaitingService);
    send_text(&state, 1, 1, "/cancel").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::Idle);

    // AwaitingDate
    send_text(&state, 2, 2, "/start").await;
    send_callback(&state, 2, 2, "manicure").await;
    assert_eq!(stage_of(&state, 2).await, DialogueStage::AwaitingDate);
    send_text(&state, 2, 2, "/cancel").await;
    assert_eq!(stage_of(&state, 2).await, DialogueStage::Idle);

    // AwaitingTime
    send_text(&state, 3, 3, "/start").await;
    send_callback(&state, 3, 3, "manicure").await;
    send_text(&state, 3, 3, "tomorrow").await;
    assert_eq!(stage_of(&state, 3).await, DialogueStage::AwaitingTime);
    send_text(&state, 3, 3, "/cancel").await;
    assert_eq!(stage_of(&state, 3).await, DialogueStage::Idle);

    // AwaitingContact
    send_text(&state, 4, 4, "/start").await;
    send_callback(&state, 4, 4, "manicure").await;
    send_text(&state, 4, 4, "tomorrow").await;
    send_text(&state, 4, 4, "11:00").await;
    assert_eq!(stage_of(&state, 4).await, DialogueStage::AwaitingContact);
    send_text(&state, 4, 4, "/cancel").await;
    assert_eq!(stage_of(&state, 4).await, DialogueStage::Idle);

    // AwaitingConfirmation
    send_text(&state, 5, 5, "/start").await;
    send_callback(&state, 5, 5, "manicure").await;
    send_text(&state, 5, 5, "tomorrow").await;
    send_text(&state, 5, 5, "12:30").await;
    send_text(&state, 5, 5, "+70000000000").await;
    assert_eq!(
        stage_of(&state, 5).await,
        DialogueStage::AwaitingConfirmation
    );
    send_text(&state, 5, 5, "/cancel").await;
    assert_eq!(stage_of(&state, 5).await, DialogueStage::Idle);
}

#[tokio::test]
async fn test_back_retraces_stages() {
    let (state, _, _) = test_state();

    send_text(&state, 1, 1, "/start").await;
    send_callback(&state, 1, 1, "makeup").await;
    send_text(&state, 1, 1, "tomorrow").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::AwaitingTime);

    send_text(&state, 1, 1, "🔙 Back to dates").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::AwaitingDate);

    send_callback(&state, 1, 1, "back").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::AwaitingService);

    send_callback(&state, 1, 1, "back").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::Idle);
}

#[tokio::test]
async fn test_invalid_inputs_reprompt_same_stage() {
    let (state, sent, _) = test_state();

    send_text(&state, 1, 1, "/start").await;
    send_callback(&state, 1, 1, "manicure").await;

    // Garbage date
    send_text(&state, 1, 1, "someday").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::AwaitingDate);
    assert!(messages_to(&sent, 1)
        .last()
        .unwrap()
        .contains("Invalid date"));

    // Past date
    send_text(&state, 1, 1, "01.01.2020").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::AwaitingDate);
    assert!(messages_to(&sent, 1).last().unwrap().contains("passed"));

    send_text(&state, 1, 1, "tomorrow").await;

    // Outside working hours
    send_text(&state, 1, 1, "20:00").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::AwaitingTime);
    assert!(messages_to(&sent, 1)
        .last()
        .unwrap()
        .contains("open from 09:00 to 19:00"));

    // Garbage time
    send_text(&state, 1, 1, "noonish").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::AwaitingTime);
    assert!(messages_to(&sent, 1)
        .last()
        .unwrap()
        .contains("Invalid time"));
}

#[tokio::test]
async fn test_shared_contact_card_flows_into_booking() {
    let (state, _, _) = test_state();

    send_text(&state, 1, 1, "/start").await;
    send_callback(&state, 1, 1, "tanning").await;
    send_text(&state, 1, 1, "tomorrow").await;
    send_text(&state, 1, 1, "🕙 10:00").await;
    send_contact(&state, 1, 1, "+79990001122").await;
    send_text(&state, 1, 1, "✅ Yes, confirm").await;

    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, 1).unwrap().unwrap();
    assert_eq!(booking.contact, "👤 Test Client 📱 +79990001122");
    assert_eq!(booking.duration_minutes, 30);
}

#[tokio::test]
async fn test_restart_clears_previous_draft() {
    let (state, _, _) = test_state();

    send_text(&state, 1, 1, "/start").await;
    send_callback(&state, 1, 1, "manicure").await;
    send_text(&state, 1, 1, "tomorrow").await;

    // Abandon and start over
    send_text(&state, 1, 1, "/start").await;
    assert_eq!(stage_of(&state, 1).await, DialogueStage::AwaitingService);
    let session = state.session(1);
    let session = session.lock().await;
    assert!(session.draft.service.is_none());
    assert!(session.draft.date.is_none());
}

// ── Commands and authorization ──

#[tokio::test]
async fn test_non_admin_listing_denied() {
    let (state, sent, _) = test_state();
    seed_booking(&state, Service::Manicure, dt("2030-06-16 10:00"));

    send_text(&state, 100, 100, "/bookings").await;

    let replies = messages_to(&sent, 100);
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Access denied"));
    assert!(!replies[0].contains("#1"));
}

#[tokio::test]
async fn test_admin_listing_paginated() {
    let (state, sent, _) = test_state();
    for hour in 9..=18 {
        seed_booking(&state, Service::SprayTan, dt(&format!("2030-06-16 {hour:02}:00")));
    }
    seed_booking(&state, Service::SprayTan, dt("2030-06-17 09:00"));

    send_text(&state, HEAD_ADMIN, HEAD_ADMIN, "/bookings").await;
    let replies = messages_to(&sent, HEAD_ADMIN);
    let page1 = replies.last().unwrap();
    assert!(page1.contains("#1"));
    assert!(page1.contains("#10"));
    assert!(!page1.contains("#11"));

    send_text(&state, HEAD_ADMIN, HEAD_ADMIN, "/bookings 2").await;
    let replies = messages_to(&sent, HEAD_ADMIN);
    let page2 = replies.last().unwrap();
    assert!(page2.contains("#11"));
    assert!(!page2.contains("#10 "));
}

#[tokio::test]
async fn test_admin_confirm_unknown_id() {
    let (state, sent, _) = test_state();
    seed_booking(&state, Service::Manicure, dt("2030-06-16 10:00"));

    send_text(&state, HEAD_ADMIN, HEAD_ADMIN, "/confirm 999").await;

    assert!(messages_to(&sent, HEAD_ADMIN)
        .last()
        .unwrap()
        .contains("not found"));

    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, 1).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_admin_confirm_notifies_client() {
    let (state, sent, _) = test_state();
    let id = seed_booking(&state, Service::Manicure, dt("2030-06-16 10:00"));

    send_text(&state, HEAD_ADMIN, HEAD_ADMIN, &format!("/confirm {id}")).await;

    {
        let db = state.db.lock().unwrap();
        let booking = queries::get_booking(&db, id).unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    // Seeded bookings belong to chat 500
    assert!(messages_to(&sent, 500)
        .last()
        .unwrap()
        .contains("has been confirmed"));
    assert!(messages_to(&sent, HEAD_ADMIN)
        .last()
        .unwrap()
        .contains(&format!("Booking #{id} confirmed")));
}

#[tokio::test]
async fn test_confirm_requires_admin() {
    let (state, sent, _) = test_state();
    let id = seed_booking(&state, Service::Manicure, dt("2030-06-16 10:00"));

    send_text(&state, 100, 100, &format!("/confirm {id}")).await;

    assert!(messages_to(&sent, 100)
        .last()
        .unwrap()
        .contains("Access denied"));
    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, id).unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_my_bookings_lists_only_upcoming_own() {
    let (state, sent, _) = test_state();

    // Our user books tomorrow at 10:00; a stranger books tomorrow at 14:00
    book(&state, 100, 100, "manicure", "10:00").await;
    book(&state, 200, 200, "makeup", "14:00").await;

    send_text(&state, 100, 100, "/mybookings").await;
    let reply = messages_to(&sent, 100).last().unwrap().clone();
    assert!(reply.contains("#1"));
    assert!(!reply.contains("#2"));
    assert!(reply.contains("Awaiting confirmation"));
}

#[tokio::test]
async fn test_status_is_public() {
    let (state, sent, _) = test_state();
    seed_booking(&state, Service::Lashes, dt("2030-06-16 12:00"));

    send_text(&state, 100, 100, "/status").await;
    let reply = messages_to(&sent, 100).last().unwrap().clone();
    assert!(reply.contains("Total bookings: 1"));
}

#[tokio::test]
async fn test_contacts_card() {
    let (state, sent, _) = test_state();

    send_text(&state, 100, 100, "/contacts").await;
    let reply = messages_to(&sent, 100).last().unwrap().clone();
    assert!(reply.contains("+7 (978) 859-03-84"));
    assert!(reply.contains("@ego_sevastopol"));
}

// ── Reminders ──

#[tokio::test]
async fn test_day_reminder_sent_exactly_once() {
    let (state, sent, _) = test_state();
    let id = seed_booking(&state, Service::Manicure, dt("2030-06-17 14:00"));
    {
        let db = state.db.lock().unwrap();
        queries::set_status(&db, id, BookingStatus::Confirmed).unwrap();
    }

    let now = dt("2030-06-16 10:00");
    reminders::run_tick(&state, now).await;
    reminders::run_tick(&state, now).await;

    let client_msgs = messages_to(&sent, 500);
    let reminder_count = client_msgs.iter().filter(|m| m.contains("Reminder")).count();
    assert_eq!(reminder_count, 1);
    assert!(client_msgs[0].contains("tomorrow at 14:00"));

    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, id).unwrap().unwrap();
    assert!(booking.reminder_day_sent);
    assert!(!booking.reminder_hour_sent);
}

#[tokio::test]
async fn test_hour_reminder_uses_window() {
    let (state, sent, _) = test_state();
    // 58 minutes out — an exact-minute match at 5-minute ticks would miss it
    let id = seed_booking(&state, Service::Lashes, dt("2030-06-16 10:58"));
    {
        let db = state.db.lock().unwrap();
        queries::set_status(&db, id, BookingStatus::Confirmed).unwrap();
    }

    let now = dt("2030-06-16 10:00");
    reminders::run_tick(&state, now).await;
    reminders::run_tick(&state, now).await;

    let client_msgs = messages_to(&sent, 500);
    let reminder_count = client_msgs.iter().filter(|m| m.contains("Reminder")).count();
    assert_eq!(reminder_count, 1);
    assert!(client_msgs[0].contains("starts at 10:58"));
}

#[tokio::test]
async fn test_pending_bookings_get_no_reminders() {
    let (state, sent, _) = test_state();
    seed_booking(&state, Service::Manicure, dt("2030-06-17 14:00"));

    reminders::run_tick(&state, dt("2030-06-16 10:00")).await;

    assert!(messages_to(&sent, 500).is_empty());
}

#[tokio::test]
async fn test_failed_reminder_retries_next_tick() {
    let (state, sent, fail) = test_state();
    let id = seed_booking(&state, Service::Manicure, dt("2030-06-17 14:00"));
    {
        let db = state.db.lock().unwrap();
        queries::set_status(&db, id, BookingStatus::Confirmed).unwrap();
    }

    let now = dt("2030-06-16 10:00");

    // Delivery down: nothing sent, flag stays unset
    fail.store(true, Ordering::SeqCst);
    reminders::run_tick(&state, now).await;
    {
        let db = state.db.lock().unwrap();
        let booking = queries::get_booking(&db, id).unwrap().unwrap();
        assert!(!booking.reminder_day_sent);
    }

    // Delivery restored: the next tick sends and latches the flag
    fail.store(false, Ordering::SeqCst);
    reminders::run_tick(&state, now).await;
    reminders::run_tick(&state, now).await;

    let reminder_count = messages_to(&sent, 500)
        .iter()
        .filter(|m| m.contains("Reminder"))
        .count();
    assert_eq!(reminder_count, 1);
}

// ── Store invariants ──

#[tokio::test]
async fn test_sequential_ids_via_dialogue() {
    let (state, _, _) = test_state();

    book(&state, 100, 100, "epilation", "10:00").await;
    book(&state, 200, 200, "epilation", "11:00").await;
    book(&state, 300, 300, "epilation", "12:00").await;

    let db = state.db.lock().unwrap();
    let page = queries::all_bookings_page(&db, 1, 10).unwrap();
    let ids: Vec<i64> = page.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_no_overlapping_intervals_ever_stored() {
    let (state, _, _) = test_state();

    // A manicure (90 min) and a swarm of conflicting attempts around it
    book(&state, 100, 100, "manicure", "10:00").await;
    book(&state, 200, 200, "epilation", "10:30").await; // inside
    book(&state, 300, 300, "makeup", "09:30").await; // straddles start
    book(&state, 400, 400, "epilation", "11:30").await; // adjacent, fits

    let db = state.db.lock().unwrap();
    let bookings = queries::all_bookings_page(&db, 1, 50).unwrap();
    for a in &bookings {
        for b in &bookings {
            if a.id == b.id {
                continue;
            }
            let a_end = a.scheduled_at + Duration::minutes(a.duration_minutes as i64);
            let b_end = b.scheduled_at + Duration::minutes(b.duration_minutes as i64);
            assert!(
                !(a.scheduled_at < b_end && b.scheduled_at < a_end),
                "bookings #{} and #{} overlap",
                a.id,
                b.id
            );
        }
    }
}
