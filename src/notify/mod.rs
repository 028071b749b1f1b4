//! Customer notifications
//!
//! The core never talks to SMS/email transports directly. Services emit
//! [`NotifyEvent`]s through a [`NotifyHandle`]; a background
//! [`NotifyDispatcher`] renders each event and hands it to the configured
//! [`Notifier`] transport. Delivery is best-effort: failures are logged
//! and dropped, never surfaced to the request path.

mod dispatcher;
mod events;
mod transport;

pub use dispatcher::NotifyDispatcher;
pub use events::{notify_channel, NotifyEvent, NotifyHandle};
pub use transport::{LogNotifier, Notifier};
