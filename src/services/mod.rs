pub mod availability;
pub mod chat;
pub mod commands;
pub mod dialogue;
pub mod notify;
pub mod reminders;
