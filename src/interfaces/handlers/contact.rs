use actix_web::{web, HttpRequest, HttpResponse};
use tracing::Instrument;

use crate::{
    entities::contact::ContactForm,
    errors::ContactError,
    utils::get_client_ip::get_client_ip,
    AppState,
};

pub async fn send_email(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactForm>,
) -> Result<HttpResponse, ContactError> {
    let client_ip = get_client_ip(&req, state.trust_x_forwarded_for);
    let span = tracing::info_span!("contact_submission", %client_ip);

    let response = state.contact_handler
        .submit_contact(form.into_inner())
        .instrument(span)
        .await?;

    Ok(HttpResponse::Ok().json(response))
}
