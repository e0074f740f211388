//! Messaging transports

pub mod telegram;

pub use telegram::TelegramChannel;
