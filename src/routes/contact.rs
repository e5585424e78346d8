use crate::{
    email::contact_message,
    error::AppError,
    models::{ContactInput, ContactMessage},
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Stores a contact-form message and forwards it to the shop inbox, if one is configured.
///
/// Forwarding is best-effort, like every other outbound email.
#[post("/contact")]
pub async fn submit_contact(
    state: web::Data<AppState>,
    contact_data: web::Json<ContactInput>,
) -> Result<impl Responder, AppError> {
    contact_data.validate()?;

    let message = ContactMessage::new(contact_data.into_inner());
    state.contacts.save(message.clone()).await?;

    if let Some(inbox) = &state.contact_inbox {
        let email = contact_message(inbox, &message.name, &message.email, &message.message);
        let delivery = state.mailer.send(&email).await;
        if !delivery.is_delivered() {
            log::warn!("contact message {} stored but not forwarded", message.id);
        }
    }

    Ok(HttpResponse::Created().json(json!({ "success": true, "id": message.id })))
}
