use actix_web::web;

use crate::handlers::contact;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/send-email")
            .route(web::post().to(contact::send_email))
    );
}
