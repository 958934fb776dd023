mod booking;
mod event;
mod service;
mod session;

pub use booking::{Booking, BookingStatus, NewBooking, ReminderKind, Requester};
pub use event::{
    ChatUpdate, Command, Event, SharedContact, BTN_ABOUT, BTN_BOOK, BTN_CONTACTS, BTN_MENU,
    BTN_MY_BOOKINGS, BTN_NEW_BOOKING,
};
pub use service::{Service, ServiceCategory};
pub use session::{DialogueSession, DialogueStage, Draft};
