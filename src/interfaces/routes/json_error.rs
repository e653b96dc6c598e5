use actix_web::web;

use crate::{constants::MAX_JSON_BODY_BYTES, handlers::json_error::JsonError};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_JSON_BODY_BYTES)
            .error_handler(|err, _req| JsonError::from(err).into())
    );
}
