mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod telemetry;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{clock, entities, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{db, limiter, mail, utils};

use clock::SystemClock;
use limiter::RateLimitBackend;
use mail::{resend::ResendClient, template::EmailTemplate};
use use_cases::contact::ContactHandler;

pub struct AppState {
    pub contact_handler: AppContactHandler,
    pub trust_x_forwarded_for: bool,
}

pub type AppContactHandler = ContactHandler<RateLimitBackend, ResendClient, SystemClock>;

impl AppState {
    pub fn new(config: &settings::AppConfig, rate_limiter: RateLimitBackend) -> anyhow::Result<Self> {
        let mailer = ResendClient::new(config)?;
        let template = EmailTemplate::new(config);
        let contact_handler = ContactHandler::new(rate_limiter, mailer, SystemClock, template);

        Ok(AppState {
            contact_handler,
            trust_x_forwarded_for: config.trust_x_forwarded_for,
        })
    }
}
