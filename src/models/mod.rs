mod stream_event;
#[cfg(test)]
mod tests;
mod transaction;

pub use stream_event::StreamEvent;
pub use transaction::Transaction;
