pub mod resend;
pub mod template;
