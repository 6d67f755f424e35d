mod journal;
mod view;

#[cfg(test)]
mod capture;

pub use journal::Journal;
pub use view::{log_event, message_for};
