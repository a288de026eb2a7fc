mod consumer_session;
mod errors;
mod lifecycle;
#[cfg(test)]
mod tests;

pub use consumer_session::{ConsumerSession, SessionState};
pub use errors::SessionError;
pub use lifecycle::{Directive, MessageHandler, SessionManager, SessionReport, SessionStatus};
