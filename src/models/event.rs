use serde::Deserialize;

use super::Service;

/// Inbound update as delivered by the chat transport webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUpdate {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
    /// Plain text message, if any.
    pub text: Option<String>,
    /// Inline-button payload, if the update came from a button press.
    pub callback: Option<String>,
    /// Shared contact card, if any.
    pub contact: Option<SharedContact>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SharedContact {
    pub phone: String,
    pub name: Option<String>,
}

/// Classified inbound event, dispatched to the current dialogue stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Command(Command),
    ServiceSelected(Service),
    ContactShared(SharedContact),
    Back,
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    Status,
    AdminStats,
    Menu,
    Contacts,
    About,
    MyBookings,
    AllBookings { page: u32 },
    TodayBookings,
    TomorrowBookings,
    ConfirmBooking { id: Option<i64> },
    Cancel,
}

// Main-menu button labels the router recognizes as commands.
pub const BTN_BOOK: &str = "💅 Book a service";
pub const BTN_NEW_BOOKING: &str = "💅 New booking";
pub const BTN_MY_BOOKINGS: &str = "📊 My bookings";
pub const BTN_ABOUT: &str = "ℹ️ About the studio";
pub const BTN_CONTACTS: &str = "📞 Contacts";
pub const BTN_MENU: &str = "🔄 Main menu";

impl Event {
    /// Classifies a raw update into the small tagged-variant set the
    /// dialogue engine dispatches on. Contact cards win over text, button
    /// payloads over free text, commands over everything else.
    pub fn classify(update: &ChatUpdate) -> Event {
        if let Some(contact) = &update.contact {
            return Event::ContactShared(contact.clone());
        }

        if let Some(data) = &update.callback {
            if data == "back" {
                return Event::Back;
            }
            if let Some(service) = Service::from_key(data) {
                return Event::ServiceSelected(service);
            }
            return Event::Text(data.clone());
        }

        let text = update.text.as_deref().unwrap_or("").trim();
        if let Some(command) = Command::parse(text) {
            return Event::Command(command);
        }
        if text.starts_with("🔙") {
            return Event::Back;
        }
        if let Some(service) = Service::from_label(text) {
            return Event::ServiceSelected(service);
        }
        Event::Text(text.to_string())
    }
}

impl Command {
    pub fn parse(text: &str) -> Option<Command> {
        match text {
            BTN_BOOK | BTN_NEW_BOOKING => return Some(Command::Start),
            BTN_MY_BOOKINGS => return Some(Command::MyBookings),
            BTN_ABOUT => return Some(Command::About),
            BTN_CONTACTS => return Some(Command::Contacts),
            BTN_MENU => return Some(Command::Menu),
            _ => {}
        }

        let mut parts = text.split_whitespace();
        let command = match parts.next()? {
            "/start" | "/book" => Command::Start,
            "/help" => Command::Help,
            "/status" => Command::Status,
            "/admin" => Command::AdminStats,
            "/menu" => Command::Menu,
            "/contacts" => Command::Contacts,
            "/about" => Command::About,
            "/mybookings" => Command::MyBookings,
            "/bookings" => Command::AllBookings {
                page: parts.next().and_then(|p| p.parse().ok()).unwrap_or(1),
            },
            "/today" => Command::TodayBookings,
            "/tomorrow" => Command::TomorrowBookings,
            "/confirm" => Command::ConfirmBooking {
                id: parts.next().and_then(|p| p.parse().ok()),
            },
            "/cancel" => Command::Cancel,
            _ => return None,
        };
        Some(command)
    }
}
