//! Relays to third-party services that share the proxy's listener.

pub mod sms;

pub use sms::{RelayedReply, SmsError, SmsRelay};
