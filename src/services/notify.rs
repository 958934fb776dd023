use std::sync::Arc;

use crate::models::{Booking, ServiceCategory};
use crate::state::AppState;

/// Sends the new-booking notice to the admin group responsible for the
/// service plus the head admin. Recipients are independent: one failed
/// delivery is logged and never blocks the others.
pub async fn booking_created(state: &Arc<AppState>, booking: &Booking) {
    let admins = &state.config.admins;
    let group_admin = match booking.service.category() {
        ServiceCategory::Nails => admins.nails_admin,
        ServiceCategory::Beauty => admins.beauty_admin,
    };

    let mut recipients = vec![group_admin];
    if !recipients.contains(&admins.head_admin) {
        recipients.push(admins.head_admin);
    }

    let text = new_booking_notice(booking);
    for admin_id in recipients {
        match state.chat.send_message(admin_id, &text).await {
            Ok(()) => tracing::info!(admin_id, booking_id = booking.id, "admin notified"),
            Err(e) => {
                tracing::error!(admin_id, booking_id = booking.id, error = %e, "failed to notify admin")
            }
        }
    }
}

fn new_booking_notice(booking: &Booking) -> String {
    let client = booking
        .requester
        .display_name
        .as_deref()
        .or(booking.requester.username.as_deref())
        .unwrap_or("Not provided");
    let handle = booking
        .requester
        .username
        .as_deref()
        .map(|u| format!("@{u}"))
        .unwrap_or_else(|| "Not provided".to_string());

    format!(
        "🎉 NEW PRELIMINARY BOOKING\n\n\
         👤 Client: {client}\n\
         📞 Contacts: {contact}\n\
         💅 Service: {service}\n\
         📅 Date and time: {when}\n\
         ⏰ Duration: {duration} min\n\
         🔢 Booking number: #{id}\n\n\
         🔗 Handle: {handle}\n\
         🆔 User id: {user_id}\n\
         💬 Chat id: {chat_id}\n\n\
         ⚠️ Please contact the client to confirm!",
        contact = booking.contact,
        service = booking.service.label(),
        when = booking.scheduled_at.format("%d.%m.%Y %H:%M"),
        duration = booking.duration_minutes,
        id = booking.id,
        user_id = booking.requester.user_id,
        chat_id = booking.requester.chat_id,
    )
}
